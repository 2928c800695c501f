use std::collections::HashMap;

use reqwest::Method;
use tracing::debug;

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;

use crate::models::{
    AssignmentRecommendation, DialysisSchedule, Patient, PatientListResponse,
    RecommendationLevel, SlotPeriod,
};

/// Active patients one (period, schedule) bucket can hold.
pub const PATIENTS_PER_BUCKET: u32 = 15;

/// Suggests where to place a newly admitted patient, least-loaded bucket first.
pub struct AssignmentRecommendationService {
    client: BackendClient,
}

impl AssignmentRecommendationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: BackendClient::new(config),
        }
    }

    pub async fn fetch_patients(&self, auth_token: &str) -> Result<Vec<Patient>, ApiError> {
        let response: PatientListResponse = self.client
            .request(Method::GET, "/patients", Some(auth_token), None)
            .await?;
        Ok(response.into_patients())
    }

    pub async fn recommendations(&self, auth_token: &str) -> Result<Vec<AssignmentRecommendation>, ApiError> {
        let patients = self.fetch_patients(auth_token).await?;
        debug!("Computing assignment recommendations over {} patients", patients.len());
        Ok(recommend(&bucket_counts(&patients)))
    }
}

/// Non-archived patients per bucket. Every bucket is present, possibly at 0.
pub fn bucket_counts(patients: &[Patient]) -> HashMap<(SlotPeriod, DialysisSchedule), u32> {
    let mut counts: HashMap<_, u32> = SlotPeriod::ALL
        .iter()
        .flat_map(|period| DialysisSchedule::ALL.iter().map(move |schedule| ((*period, *schedule), 0)))
        .collect();

    for bucket in patients.iter().filter(|p| !p.archived).filter_map(Patient::bucket) {
        *counts.entry(bucket).or_insert(0) += 1;
    }

    counts
}

pub fn recommend(counts: &HashMap<(SlotPeriod, DialysisSchedule), u32>) -> Vec<AssignmentRecommendation> {
    // Fixed bucket order so equal loads keep a stable ranking.
    let mut buckets: Vec<(SlotPeriod, DialysisSchedule, u32)> = SlotPeriod::ALL
        .iter()
        .flat_map(|period| DialysisSchedule::ALL.iter().map(move |schedule| (*period, *schedule)))
        .map(|(period, schedule)| {
            (period, schedule, counts.get(&(period, schedule)).copied().unwrap_or(0))
        })
        .collect();

    buckets.sort_by_key(|(_, _, assigned)| *assigned);

    buckets
        .into_iter()
        .filter(|(_, _, assigned)| *assigned < PATIENTS_PER_BUCKET)
        .map(|(period, schedule, assigned)| {
            let available = PATIENTS_PER_BUCKET - assigned;
            let level = match available {
                5.. => RecommendationLevel::HighlyRecommended,
                3..=4 => RecommendationLevel::Recommended,
                _ => RecommendationLevel::LimitedAvailability,
            };
            AssignmentRecommendation { period, schedule, assigned, available, level }
        })
        .collect()
}
