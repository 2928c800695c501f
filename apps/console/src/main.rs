use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod prompt;
mod render;

use approval_cell::{AccountKind, ApprovalService};
use attendance_cell::{AttendanceFilter, AttendanceService, AttendanceStatus};
use monitoring_cell::{HeartbeatService, InactivityTimer, PendingApprovalPoller};
use prompt::TerminalConfirmation;
use reschedule_cell::{ActionOutcome, DenyReason, SlotTracker};
use session_cell::{AuthService, SessionStore};
use shared_config::AppConfig;
use shared_models::error::ApiError;
use shared_utils::manila;
use slot_cell::{AssignmentRecommendationService, Slot, SlotPeriod};

#[derive(Parser, Debug)]
#[command(author, version, about = "Dialysis center administration console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Email a one-time password for a password reset
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        new_password: String,
    },
    /// Show a day's slots with the reschedule queue
    Slots {
        /// YYYY-MM-DD, today in Manila when omitted
        #[arg(long)]
        date: Option<String>,
    },
    Initialize {
        #[arg(long)]
        date: Option<String>,
    },
    /// Enable or disable a slot for booking
    Toggle {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        period: String,
        #[arg(long)]
        slot: u32,
    },
    Cancel {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        period: String,
        #[arg(long)]
        slot: u32,
        #[arg(long, short)]
        yes: bool,
    },
    Approve {
        request_id: String,
        #[arg(long, short)]
        yes: bool,
    },
    Deny {
        request_id: String,
        /// One of: "No available slots", "Patient not eligible", "Schedule conflict", "Other"
        #[arg(long)]
        reason: Option<String>,
        #[arg(long, short)]
        yes: bool,
    },
    /// Least-loaded time slots for a new patient
    Recommend,
    Attendance {
        #[arg(long)]
        date: Option<String>,
        /// present or absent
        #[arg(long)]
        status: Option<String>,
    },
    CheckIn {
        patient_id: String,
    },
    CancelCheckIn {
        attendance_id: String,
    },
    /// Patient and nurse registrations awaiting approval
    Approvals,
    ApproveAccount {
        /// patient or nurse
        kind: String,
        account_id: String,
    },
    RemoveAccount {
        kind: String,
        account_id: String,
    },
    /// Run the heartbeat, approval badge and idle logout until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reqwest=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let store = Arc::new(SessionStore::from_config(&config));

    let result = run(cli.command, &config, store.clone()).await;

    if let Err(e) = &result {
        if let Some(api_error) = e.downcast_ref::<ApiError>() {
            if api_error.is_auth_failure() {
                error!("{}", api_error.user_message());
                eprintln!("Your session is no longer valid. Run `dialysis-console login` again.");
            }
        }
    }

    result
}

async fn run(command: Command, config: &AppConfig, store: Arc<SessionStore>) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let auth = AuthService::new(config, store);
            let session = auth.login(&email, &password).await?;
            println!("Signed in as {} ({:?})", session.email.as_deref().unwrap_or(&email), session.role());
        }
        Command::Logout => {
            store.invalidate()?;
            println!("Signed out.");
        }
        Command::ForgotPassword { email } => {
            let auth = AuthService::new(config, store);
            println!("{}", auth.request_otp(&email).await?);
        }
        Command::ResetPassword { email, otp, new_password } => {
            let auth = AuthService::new(config, store);
            auth.verify_otp(&email, &otp).await?;
            println!("{}", auth.reset_password(&email, &new_password).await?);
        }
        Command::Slots { date } => {
            let token = require_token(&store)?;
            let tracker = SlotTracker::new(config);
            if let Err(e) = tracker.select_date(parse_day(date.as_deref())?, &token).await {
                warn!("Slot day not loaded: {}", e);
            }
            render::slot_view(&tracker.slots().await);
            render::queue(&tracker.requests().await);
        }
        Command::Initialize { date } => {
            let token = require_token(&store)?;
            let tracker = SlotTracker::new(config);
            tracker.loader().initialize(parse_day(date.as_deref())?, &token).await?;
            render::slot_view(&tracker.slots().await);
        }
        Command::Toggle { date, period, slot } => {
            let token = require_token(&store)?;
            let tracker = SlotTracker::new(config);
            let target = load_slot(&tracker, date.as_deref(), &period, slot, &token).await?;
            let outcome = tracker.toggle_disable(&target, &token).await?;
            println!("{}", outcome.message);
            render::slot_view(&tracker.slots().await);
        }
        Command::Cancel { date, period, slot, yes } => {
            let token = require_token(&store)?;
            let tracker = SlotTracker::new(config);
            let target = load_slot(&tracker, date.as_deref(), &period, slot, &token).await?;
            match tracker.cancel_booking(&target, &TerminalConfirmation { assume_yes: yes }, &token).await? {
                Some(outcome) => {
                    println!("{}", outcome.message);
                    render::slot_view(&tracker.slots().await);
                }
                None => println!("Nothing changed."),
            }
        }
        Command::Approve { request_id, yes } => {
            let token = require_token(&store)?;
            let tracker = SlotTracker::new(config);
            tracker.select_date(manila::today(), &token).await.ok();
            let outcome = tracker
                .approve(&request_id, &TerminalConfirmation { assume_yes: yes }, &token)
                .await?;
            report(outcome);
            render::queue(&tracker.requests().await);
        }
        Command::Deny { request_id, reason, yes } => {
            let token = require_token(&store)?;
            let tracker = SlotTracker::new(config);
            tracker.select_date(manila::today(), &token).await.ok();

            let mut draft = tracker.begin_deny(&request_id).await?;
            if let Some(reason) = reason {
                let reason = DenyReason::parse(&reason)
                    .ok_or_else(|| anyhow!("Unknown deny reason {:?}", reason))?;
                draft = draft.with_reason(reason);
            }

            let outcome = tracker
                .submit_deny(&draft, &TerminalConfirmation { assume_yes: yes }, &token)
                .await?;
            report(outcome);
            render::queue(&tracker.requests().await);
        }
        Command::Recommend => {
            let token = require_token(&store)?;
            let service = AssignmentRecommendationService::new(config);
            render::recommendations(&service.recommendations(&token).await?);
        }
        Command::Attendance { date, status } => {
            let token = require_token(&store)?;
            let filter = match status.as_deref() {
                None | Some("all") => AttendanceFilter::All,
                Some("present") => AttendanceFilter::Only(AttendanceStatus::Present),
                Some("absent") => AttendanceFilter::Only(AttendanceStatus::Absent),
                Some(other) => bail!("Unknown attendance status {:?}", other),
            };
            let day = date.as_deref().map(|raw| parse_day(Some(raw))).transpose()?;
            let records = AttendanceService::new(config).list(day, filter, &token).await?;
            render::attendance(&records);
        }
        Command::CheckIn { patient_id } => {
            let token = require_token(&store)?;
            println!("{}", AttendanceService::new(config).mark_present(&patient_id, &token).await?);
        }
        Command::CancelCheckIn { attendance_id } => {
            let token = require_token(&store)?;
            println!("{}", AttendanceService::new(config).cancel_check_in(&attendance_id, &token).await?);
        }
        Command::Approvals => {
            let token = require_token(&store)?;
            let service = ApprovalService::new(config);
            service.fetch(&token).await?;
            render::approvals(&service.state().await);
        }
        Command::ApproveAccount { kind, account_id } => {
            let token = require_token(&store)?;
            let service = ApprovalService::new(config);
            service.fetch(&token).await?;
            println!("{}", service.approve(parse_kind(&kind)?, &account_id, &token).await?);
            render::approvals(&service.state().await);
        }
        Command::RemoveAccount { kind, account_id } => {
            let token = require_token(&store)?;
            let service = ApprovalService::new(config);
            service.fetch(&token).await?;
            println!("{}", service.remove(parse_kind(&kind)?, &account_id, &token).await?);
            render::approvals(&service.state().await);
        }
        Command::Watch => watch_session(config, store).await?,
    }

    Ok(())
}

fn require_token(store: &SessionStore) -> Result<String> {
    store
        .load()?
        .map(|session| session.token)
        .ok_or_else(|| anyhow!("Not signed in. Run `dialysis-console login` first."))
}

fn parse_day(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        None => Ok(manila::today()),
        Some(raw) => manila::parse_date(raw).with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", raw)),
    }
}

fn parse_kind(raw: &str) -> Result<AccountKind> {
    AccountKind::parse(raw).ok_or_else(|| anyhow!("Account kind must be patient or nurse"))
}

async fn load_slot(tracker: &SlotTracker, date: Option<&str>, period: &str, number: u32, token: &str) -> Result<Slot> {
    let period = SlotPeriod::parse(period).ok_or_else(|| anyhow!("Period must be morning or afternoon"))?;
    tracker.loader().select_date(parse_day(date)?, token).await?;

    let view = tracker.slots().await;
    let day = view.day.context("No slots loaded for that date")?;
    day.period(period)
        .iter()
        .find(|slot| slot.slot_number == number)
        .cloned()
        .with_context(|| format!("No {} slot #{}", period, number))
}

fn report(outcome: ActionOutcome) {
    match outcome {
        ActionOutcome::Completed { message } => println!("{}", message),
        ActionOutcome::Declined => println!("Nothing changed."),
    }
}

async fn watch_session(config: &AppConfig, store: Arc<SessionStore>) -> Result<()> {
    store.load()?.context("Not signed in. Run `dialysis-console login` first.")?;

    let heartbeat = Arc::new(HeartbeatService::new(config));
    let pending = Arc::new(PendingApprovalPoller::new(config));
    let timer = Arc::new(InactivityTimer::from_config(config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut connectivity = heartbeat.subscribe();
    let mut pending_count = pending.subscribe();

    let heartbeat_task = {
        let heartbeat = heartbeat.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { heartbeat.run(shutdown).await })
    };

    let pending_task = {
        let pending = pending.clone();
        let store = store.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { pending.run(move || store.token(), shutdown).await })
    };

    // Any line typed on the terminal counts as activity.
    let input_task = {
        let timer = timer.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(_)) = lines.next_line().await {
                timer.touch();
            }
        })
    };

    let idle_task = {
        let timer = timer.clone();
        let store = store.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            timer
                .run(
                    move || {
                        if let Err(e) = store.invalidate() {
                            error!("Failed to end idle session: {}", e);
                        }
                    },
                    shutdown,
                )
                .await
        })
    };
    tokio::pin!(idle_task);

    info!("Watching backend connectivity and approvals; Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                break;
            }
            timed_out = &mut idle_task => {
                if matches!(timed_out, Ok(true)) {
                    println!("Signed out after {:?} without activity.", timer.timeout());
                }
                break;
            }
            changed = connectivity.changed() => {
                if changed.is_err() { break; }
                let status = *connectivity.borrow_and_update();
                println!("Connection: {:?}", status);
            }
            changed = pending_count.changed() => {
                if changed.is_err() { break; }
                let count = *pending_count.borrow_and_update();
                println!("Pending approvals: {}", count);
            }
        }
    }

    shutdown_tx.send(true).ok();
    input_task.abort();
    let _ = tokio::join!(heartbeat_task, pending_task);
    Ok(())
}
