use approval_cell::{AccountKind, ApprovalState};
use attendance_cell::AttendanceRecord;
use reschedule_cell::QueueState;
use shared_utils::manila;
use slot_cell::{AssignmentRecommendation, SlotDay, SlotPeriod, SlotStats, SlotViewState};

pub fn slot_view(view: &SlotViewState) {
    println!("Slots for {}", manila::format_date(view.selected_date));

    if let Some(err) = &view.error {
        if view.needs_initialization() {
            println!("  {}", err.user_message());
            println!("  Run `dialysis-console initialize --date {}`.", manila::format_date(view.selected_date));
        } else {
            println!("  Error: {}", err.user_message());
        }
    }

    if let Some(day) = &view.day {
        slot_day(day);
    }
}

fn slot_day(day: &SlotDay) {
    let stats = SlotStats::from_day(day);
    println!(
        "  Total {} | Available {} | Booked {} | Utilization {}%",
        stats.total_slots, stats.available_slots, stats.booked_slots, stats.utilization
    );

    for period in SlotPeriod::ALL {
        let period_stats = SlotStats::for_period(day, period);
        println!("\n  {} ({} of {} booked)", period, period_stats.booked_slots, period_stats.total_slots);

        for slot in day.period(period) {
            let patient = slot
                .patient
                .as_ref()
                .map(|patient| patient.display_name())
                .unwrap_or_default();
            let booked_at = slot
                .booked_at
                .map(|at| format!(" booked {}", manila::to_manila(at).format("%Y-%m-%d %H:%M")))
                .unwrap_or_default();
            println!(
                "    #{:<3} {:<14} {:<10} {}{}",
                slot.slot_number,
                slot.machine_name(),
                slot.display_status(),
                patient,
                booked_at
            );
        }
    }
}

pub fn queue(state: &QueueState) {
    println!("\nReschedule requests");

    if let Some(err) = &state.error {
        println!("  Error: {}", err.user_message());
    }
    if let Some(notice) = &state.notice {
        println!("  {}", notice);
    }
    if state.requests.is_empty() {
        println!("  No pending reschedule requests at this time.");
        return;
    }

    for request in &state.requests {
        let original = request
            .original_date()
            .map(manila::format_date)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:<32} {} -> {}  requested {}  [{}]",
            request.id,
            request.patient_label(),
            original,
            request.requested_date.as_deref().unwrap_or("-"),
            request.requested_at_label().unwrap_or_else(|| "-".to_string()),
            request.status
        );
    }
}

pub fn recommendations(recommendations: &[AssignmentRecommendation]) {
    if recommendations.is_empty() {
        println!("Every time slot is full.");
        return;
    }
    for rec in recommendations {
        println!(
            "  {:<16} {:>2} assigned, {:>2} open  {}",
            rec.name(),
            rec.assigned,
            rec.available,
            rec.level
        );
    }
}

pub fn attendance(records: &[AttendanceRecord]) {
    if records.is_empty() {
        println!("No attendance records found.");
        return;
    }
    for record in records {
        let patient = record
            .patient
            .as_ref()
            .map(|patient| patient.display_name())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:<32} {}  {:<8} {}",
            record.id,
            patient,
            record.date,
            record.status,
            record.time_label()
        );
    }
}

pub fn approvals(state: &ApprovalState) {
    if let Some(err) = &state.error {
        println!("  Error: {}", err.user_message());
    }
    for kind in AccountKind::ALL {
        let accounts = state.accounts(kind);
        println!("\nPending {} accounts ({})", kind, accounts.len());
        if accounts.is_empty() {
            println!("  None waiting.");
            continue;
        }
        for account in accounts {
            println!(
                "  {}  {:<32} {}",
                account.id,
                account.display_name(),
                account.email.as_deref().unwrap_or("-")
            );
        }
    }
}
