use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;
use shared_utils::manila;

use crate::models::{LoadOutcome, SlotDay, SlotDayResponse, SlotViewState};

pub const NOT_INITIALIZED_MESSAGE: &str =
    "No slots initialized for this date. Click \"Initialize Slots\" to create them.";

/// Loads the slot day for the selected Manila date.
///
/// Each load is stamped with the view generation current when it started.
/// A response is written to the view only if no newer load began meanwhile,
/// so a slow fetch for an earlier selection can never replace a later one.
pub struct SlotDayLoader {
    client: BackendClient,
    state: RwLock<SlotViewState>,
}

impl SlotDayLoader {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(BackendClient::new(config), manila::today())
    }

    pub fn with_client(client: BackendClient, selected_date: NaiveDate) -> Self {
        Self {
            client,
            state: RwLock::new(SlotViewState::new(selected_date)),
        }
    }

    pub async fn state(&self) -> SlotViewState {
        self.state.read().await.clone()
    }

    pub async fn selected_date(&self) -> NaiveDate {
        self.state.read().await.selected_date
    }

    /// Date of the loaded day that holds `slot_id`. The loaded day stays on
    /// screen while a newer selection is in flight, so this can differ from
    /// `selected_date`.
    pub async fn date_of_slot(&self, slot_id: &str) -> Option<NaiveDate> {
        let state = self.state.read().await;
        state
            .day
            .as_ref()
            .filter(|day| day.find(slot_id).is_some())
            .map(|day| day.date)
    }

    /// Switch the view to `date` and load it.
    #[instrument(skip(self, auth_token))]
    pub async fn select_date(&self, date: NaiveDate, auth_token: &str) -> Result<LoadOutcome, ApiError> {
        let generation = self.begin_load(date).await;
        let result = self.fetch_or_initialize(date, auth_token).await;
        self.commit(date, generation, result).await
    }

    /// Reload whatever date is selected now.
    pub async fn refresh(&self, auth_token: &str) -> Result<LoadOutcome, ApiError> {
        let date = self.selected_date().await;
        self.select_date(date, auth_token).await
    }

    /// Explicit "Initialize Slots" action for a date the backend has no
    /// slots for.
    #[instrument(skip(self, auth_token))]
    pub async fn initialize(&self, date: NaiveDate, auth_token: &str) -> Result<LoadOutcome, ApiError> {
        let generation = self.begin_load(date).await;

        let result = match self.initialize_slots(date, auth_token).await {
            Ok(()) => self
                .fetch_day(date, auth_token)
                .await
                .map(|day| (day, true)),
            Err(e) => Err(e),
        };

        self.commit(date, generation, result).await
    }

    async fn begin_load(&self, date: NaiveDate) -> u64 {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.selected_date = date;
        state.loading = true;
        state.generation
    }

    async fn commit(
        &self,
        date: NaiveDate,
        generation: u64,
        result: Result<(SlotDay, bool), ApiError>,
    ) -> Result<LoadOutcome, ApiError> {
        let mut state = self.state.write().await;

        if state.generation != generation {
            debug!(
                "Discarding slot day for {} (generation {}, current {})",
                date, generation, state.generation
            );
            return Ok(LoadOutcome::Stale);
        }

        state.loading = false;

        match result {
            Ok((day, initialized)) => {
                state.day = Some(day.clone());
                state.error = None;
                Ok(LoadOutcome::Loaded { day, initialized })
            }
            Err(e) => {
                // A failed reload of the same date keeps what is on screen;
                // anything else must not show another date's slots.
                let keep_prior = !matches!(e, ApiError::NotInitialized(_))
                    && state.day.as_ref().is_some_and(|day| day.date == date);
                if !keep_prior {
                    state.day = None;
                }
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Fetches the day; an empty day is initialized server-side and fetched
    /// exactly once more, whatever that second fetch returns.
    async fn fetch_or_initialize(&self, date: NaiveDate, auth_token: &str) -> Result<(SlotDay, bool), ApiError> {
        let day = self.fetch_day(date, auth_token).await?;
        if !day.is_empty() {
            return Ok((day, false));
        }

        info!("No slots for {}, initializing", date);
        self.initialize_slots(date, auth_token).await?;

        let day = self.fetch_day(date, auth_token).await?;
        if day.is_empty() {
            warn!("Slot day {} is still empty after initialization", date);
        }
        Ok((day, true))
    }

    async fn fetch_day(&self, date: NaiveDate, auth_token: &str) -> Result<SlotDay, ApiError> {
        let path = format!("/appointment-slots/date/{}", manila::format_date(date));

        let response: SlotDayResponse = self.client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotInitialized(NOT_INITIALIZED_MESSAGE.to_string()),
                other => other,
            })?;

        debug!(
            "Fetched slot day {}: {} morning, {} afternoon",
            date,
            response.morning.len(),
            response.afternoon.len()
        );

        Ok(SlotDay::from_response(date, response))
    }

    async fn initialize_slots(&self, date: NaiveDate, auth_token: &str) -> Result<(), ApiError> {
        self.client
            .execute(
                Method::POST,
                "/appointment-slots/initialize-slots",
                Some(auth_token),
                Some(json!({ "date": manila::format_date(date) })),
            )
            .await
    }
}
