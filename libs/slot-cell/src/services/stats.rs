use serde::Serialize;

use crate::models::{Slot, SlotDay, SlotPeriod};

/// Availability figures for a slot day. Derived on every read, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotStats {
    pub total_slots: u32,
    pub available_slots: u32,
    pub booked_slots: u32,
    /// Whole percent of slots booked; 0 for a day without slots.
    pub utilization: u32,
}

impl SlotStats {
    pub fn from_slots<'a>(slots: impl IntoIterator<Item = &'a Slot>) -> Self {
        let (total, booked) = slots
            .into_iter()
            .fold((0u32, 0u32), |(total, booked), slot| {
                (total + 1, booked + u32::from(slot.is_booked))
            });

        Self {
            total_slots: total,
            available_slots: total - booked,
            booked_slots: booked,
            utilization: utilization(booked, total),
        }
    }

    pub fn from_day(day: &SlotDay) -> Self {
        Self::from_slots(day.slots())
    }

    pub fn for_period(day: &SlotDay, period: SlotPeriod) -> Self {
        Self::from_slots(day.period(period))
    }
}

fn utilization(booked: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(booked) / f64::from(total) * 100.0).round() as u32
}
