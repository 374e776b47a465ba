// libs/scheduling-cell/src/services/slots.rs
use chrono::{Datelike, Duration, NaiveDate};
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, DayOfWeek, SchedulingError, Slot, WorkingWindow};
use crate::services::booking::BookingService;
use crate::services::windows::WorkingWindowService;

/// Derives bookable slots from working windows and existing bookings. Pure
/// function of stored state: querying twice with no intervening writes
/// returns identical results.
pub struct AvailabilityService {
    windows: WorkingWindowService,
    bookings: BookingService,
}

impl AvailabilityService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            windows: WorkingWindowService::new(pool.clone()),
            bookings: BookingService::new(pool),
        }
    }

    /// Available slots for one practitioner on one calendar date, ascending
    /// by start time. A day without working windows is an empty answer, not
    /// an error.
    pub async fn get_available_slots(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError> {
        // The civil date alone fixes the weekday; nothing locale-dependent.
        let day_of_week = DayOfWeek::from(date.weekday());
        debug!(
            "Calculating available slots for practitioner {} on {} ({})",
            practitioner_id, date, day_of_week
        );

        let windows = self.windows.list_for_day(practitioner_id, day_of_week).await?;
        if windows.is_empty() {
            return Ok(vec![]);
        }

        let appointments = self
            .bookings
            .list_active_for_practitioner_on_date(practitioner_id, date)
            .await?;

        let mut slots = Vec::new();
        for window in &windows {
            slots.extend(expand_window(window, date));
        }

        let mut available = remove_booked(slots, &appointments);
        available.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        let available = remove_overlapping_slots(available);

        debug!("Found {} available slots", available.len());
        Ok(available)
    }

    /// Fan the per-date calculation out over 7 consecutive dates starting at
    /// `start` (the caller passes today, UTC), for one or more practitioners.
    pub async fn get_weekly_slots(
        &self,
        practitioner_ids: &[Uuid],
        start: NaiveDate,
    ) -> Result<HashMap<Uuid, BTreeMap<NaiveDate, Vec<Slot>>>, SchedulingError> {
        let mut by_practitioner = HashMap::new();

        for &practitioner_id in practitioner_ids {
            let mut by_date = BTreeMap::new();
            for offset in 0..7 {
                let date = start + Duration::days(offset);
                let slots = self.get_available_slots(practitioner_id, date).await?;
                by_date.insert(date, slots);
            }
            by_practitioner.insert(practitioner_id, by_date);
        }

        Ok(by_practitioner)
    }
}

// ==============================================================================
// SLOT ARITHMETIC
// ==============================================================================

/// Walk a working window on a concrete date, emitting `[t, t + duration)`
/// while the whole slot fits. A trailing remainder shorter than the slot
/// duration is dropped, not rounded.
pub fn expand_window(window: &WorkingWindow, date: NaiveDate) -> Vec<Slot> {
    let mut slots = Vec::new();
    if window.slot_duration_minutes <= 0 {
        return slots;
    }

    let duration = Duration::minutes(window.slot_duration_minutes as i64);
    let window_start = date.and_time(window.start_time).and_utc();
    let window_end = date.and_time(window.end_time).and_utc();

    let mut current = window_start;
    while current + duration <= window_end {
        slots.push(Slot {
            start_time: current,
            end_time: current + duration,
        });
        current += duration;
    }

    slots
}

/// Half-open interval overlap. Touching endpoints do not overlap.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Drop every slot that overlaps an appointment still holding its time.
pub fn remove_booked(slots: Vec<Slot>, appointments: &[Appointment]) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| {
            !appointments.iter().any(|appt| {
                appt.status.holds_slot()
                    && overlaps(slot.start_time, slot.end_time, appt.start_time, appt.end_time)
            })
        })
        .collect()
}

/// Windows may themselves overlap; keep the earliest slot of any overlapping
/// run so the output never offers the same minutes twice. Expects input
/// sorted by start time.
fn remove_overlapping_slots(slots: Vec<Slot>) -> Vec<Slot> {
    let mut result: Vec<Slot> = Vec::with_capacity(slots.len());

    for slot in slots {
        match result.last() {
            Some(last) if slot.start_time < last.end_time => {}
            _ => result.push(slot),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn window(start: (u32, u32), end: (u32, u32), duration: i32) -> WorkingWindow {
        WorkingWindow {
            id: Uuid::new_v4(),
            practitioner_id: Uuid::new_v4(),
            day_of_week: DayOfWeek::Monday,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            slot_duration_minutes: duration,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn appointment_at(date: NaiveDate, start: (u32, u32), end: (u32, u32), status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            practitioner_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            start_time: date
                .and_time(NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap())
                .and_utc(),
            end_time: date
                .and_time(NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap())
                .and_utc(),
            status,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // 2025-06-16 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    #[test]
    fn one_hour_window_with_half_hour_slots() {
        let slots = expand_window(&window((9, 0), (10, 0), 30), monday());

        assert_eq!(slots.len(), 2);
        assert_eq!(
            slots[0].start_time,
            Utc.with_ymd_and_hms(2025, 6, 16, 9, 0, 0).unwrap()
        );
        assert_eq!(
            slots[0].end_time,
            Utc.with_ymd_and_hms(2025, 6, 16, 9, 30, 0).unwrap()
        );
        assert_eq!(
            slots[1].start_time,
            Utc.with_ymd_and_hms(2025, 6, 16, 9, 30, 0).unwrap()
        );
        assert_eq!(
            slots[1].end_time,
            Utc.with_ymd_and_hms(2025, 6, 16, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn trailing_remainder_is_dropped() {
        // 50 minutes of window, 30-minute slots: one slot, 20 minutes unused
        let slots = expand_window(&window((9, 0), (9, 50), 30), monday());

        assert_eq!(slots.len(), 1);
        assert_eq!(
            slots[0].end_time,
            Utc.with_ymd_and_hms(2025, 6, 16, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn window_shorter_than_slot_yields_nothing() {
        assert!(expand_window(&window((9, 0), (9, 20), 30), monday()).is_empty());
    }

    #[test]
    fn nonpositive_duration_yields_nothing() {
        assert!(expand_window(&window((9, 0), (17, 0), 0), monday()).is_empty());
        assert!(expand_window(&window((9, 0), (17, 0), -15), monday()).is_empty());
    }

    #[test]
    fn booked_slot_is_excluded() {
        let slots = expand_window(&window((9, 0), (10, 0), 30), monday());
        let booked = vec![appointment_at(
            monday(),
            (9, 0),
            (9, 30),
            AppointmentStatus::Confirmed,
        )];

        let available = remove_booked(slots, &booked);

        assert_eq!(available.len(), 1);
        assert_eq!(
            available[0].start_time,
            Utc.with_ymd_and_hms(2025, 6, 16, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn partially_overlapping_booking_blocks_both_slots() {
        // A 09:15-09:45 appointment straddles both half-hour slots
        let slots = expand_window(&window((9, 0), (10, 0), 30), monday());
        let booked = vec![appointment_at(
            monday(),
            (9, 15),
            (9, 45),
            AppointmentStatus::Pending,
        )];

        assert!(remove_booked(slots, &booked).is_empty());
    }

    #[test]
    fn cancelled_booking_frees_its_slot() {
        let slots = expand_window(&window((9, 0), (10, 0), 30), monday());
        let booked = vec![appointment_at(
            monday(),
            (9, 0),
            (9, 30),
            AppointmentStatus::Cancelled,
        )];

        assert_eq!(remove_booked(slots, &booked).len(), 2);
    }

    #[test]
    fn adjacent_booking_does_not_block() {
        // Half-open intervals: a booking ending exactly at 09:00 leaves 09:00 free
        let slots = expand_window(&window((9, 0), (10, 0), 30), monday());
        let booked = vec![appointment_at(
            monday(),
            (8, 30),
            (9, 0),
            AppointmentStatus::Confirmed,
        )];

        assert_eq!(remove_booked(slots, &booked).len(), 2);
    }

    #[test]
    fn overlapping_windows_do_not_duplicate_minutes() {
        let date = monday();
        let mut slots = expand_window(&window((9, 0), (10, 0), 30), date);
        slots.extend(expand_window(&window((9, 30), (10, 30), 30), date));
        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        let deduped = remove_overlapping_slots(slots);

        assert_eq!(deduped.len(), 3);
        let starts: Vec<u32> = deduped
            .iter()
            .map(|s| s.start_time.format("%H%M").to_string().parse().unwrap())
            .collect();
        assert_eq!(starts, vec![900, 930, 1000]);
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(overlaps(0, 10, 5, 15));
        assert!(overlaps(5, 15, 0, 10));
        assert!(overlaps(0, 10, 2, 8));
        assert!(!overlaps(0, 10, 10, 20));
        assert!(!overlaps(10, 20, 0, 10));
        assert!(!overlaps(0, 10, 20, 30));
    }

    #[test]
    fn weekday_resolution_is_calendar_only() {
        assert_eq!(DayOfWeek::from(monday().weekday()), DayOfWeek::Monday);
        assert_eq!(
            DayOfWeek::from(NaiveDate::from_ymd_opt(2025, 6, 22).unwrap().weekday()),
            DayOfWeek::Sunday
        );
    }
}
