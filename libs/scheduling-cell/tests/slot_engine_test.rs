// libs/scheduling-cell/tests/slot_engine_test.rs
//
// Scenario tests for the slot engine against the booking rules: every
// returned slot lies inside a working window, overlaps no active
// appointment, and the same inputs always produce the same output.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    Appointment, AppointmentStatus, DayOfWeek, Slot, WorkingWindow,
};
use scheduling_cell::services::slots::{expand_window, overlaps, remove_booked};

// 2025-06-16 is a Monday.
const YEAR: i32 = 2025;
const MONTH: u32 = 6;
const DAY: u32 = 16;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(YEAR, MONTH, DAY).unwrap()
}

fn monday_window(practitioner_id: Uuid, start: (u32, u32), end: (u32, u32), duration: i32) -> WorkingWindow {
    WorkingWindow {
        id: Uuid::new_v4(),
        practitioner_id,
        day_of_week: DayOfWeek::Monday,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        slot_duration_minutes: duration,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn booking(practitioner_id: Uuid, start: (u32, u32), end: (u32, u32), status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        practitioner_id,
        service_id: Uuid::new_v4(),
        start_time: Utc.with_ymd_and_hms(YEAR, MONTH, DAY, start.0, start.1, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(YEAR, MONTH, DAY, end.0, end.1, 0).unwrap(),
        status,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn slot_times(slots: &[Slot]) -> Vec<(String, String)> {
    slots
        .iter()
        .map(|s| {
            (
                s.start_time.format("%H:%M").to_string(),
                s.end_time.format("%H:%M").to_string(),
            )
        })
        .collect()
}

#[test]
fn monday_nine_to_ten_with_half_hour_slots() {
    // Working window Mon 09:00-10:00, 30-minute slots
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (9, 0), (10, 0), 30);

    let slots = expand_window(&window, monday());

    assert_eq!(
        slot_times(&slots),
        vec![
            ("09:00".to_string(), "09:30".to_string()),
            ("09:30".to_string(), "10:00".to_string()),
        ]
    );
}

#[test]
fn booking_the_first_slot_leaves_only_the_second() {
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (9, 0), (10, 0), 30);
    let booked = vec![booking(practitioner, (9, 0), (9, 30), AppointmentStatus::Confirmed)];

    let available = remove_booked(expand_window(&window, monday()), &booked);

    assert_eq!(
        slot_times(&available),
        vec![("09:30".to_string(), "10:00".to_string())]
    );
}

#[test]
fn straddling_booking_conflicts_with_both_slots() {
    // A 09:15-09:45 interval overlaps the 09:00-09:30 booking under the
    // half-open test; it also blocks both derived slots
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (9, 0), (10, 0), 30);
    let booked = vec![booking(practitioner, (9, 0), (9, 30), AppointmentStatus::Confirmed)];

    let proposed_start = Utc.with_ymd_and_hms(YEAR, MONTH, DAY, 9, 15, 0).unwrap();
    let proposed_end = Utc.with_ymd_and_hms(YEAR, MONTH, DAY, 9, 45, 0).unwrap();
    assert!(overlaps(
        proposed_start,
        proposed_end,
        booked[0].start_time,
        booked[0].end_time
    ));

    let straddling = vec![booking(practitioner, (9, 15), (9, 45), AppointmentStatus::Pending)];
    assert!(remove_booked(expand_window(&window, monday()), &straddling).is_empty());
}

#[test]
fn every_slot_lies_within_its_window() {
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (8, 15), (12, 5), 25);
    let window_start = monday().and_time(window.start_time).and_utc();
    let window_end = monday().and_time(window.end_time).and_utc();

    let slots = expand_window(&window, monday());

    assert!(!slots.is_empty());
    for slot in &slots {
        assert!(slot.start_time >= window_start);
        assert!(slot.end_time <= window_end);
        assert_eq!(slot.end_time - slot.start_time, chrono::Duration::minutes(25));
    }
}

#[test]
fn slots_are_ordered_and_disjoint() {
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (9, 0), (17, 0), 45);

    let slots = expand_window(&window, monday());

    for pair in slots.windows(2) {
        assert!(pair[0].start_time < pair[1].start_time);
        assert!(pair[0].end_time <= pair[1].start_time);
    }
}

#[test]
fn engine_is_idempotent_for_fixed_state() {
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (9, 0), (12, 0), 20);
    let booked = vec![
        booking(practitioner, (9, 40), (10, 0), AppointmentStatus::Confirmed),
        booking(practitioner, (11, 0), (11, 20), AppointmentStatus::Pending),
    ];

    let first = remove_booked(expand_window(&window, monday()), &booked);
    let second = remove_booked(expand_window(&window, monday()), &booked);

    assert_eq!(first, second);
}

#[test]
fn no_available_slot_overlaps_an_active_booking() {
    let practitioner = Uuid::new_v4();
    let window = monday_window(practitioner, (9, 0), (13, 0), 30);
    let booked = vec![
        booking(practitioner, (9, 30), (10, 0), AppointmentStatus::Confirmed),
        booking(practitioner, (10, 45), (11, 15), AppointmentStatus::Pending),
        booking(practitioner, (12, 0), (12, 30), AppointmentStatus::Cancelled),
    ];

    let available = remove_booked(expand_window(&window, monday()), &booked);

    for slot in &available {
        for appt in booked.iter().filter(|a| a.status.holds_slot()) {
            assert!(!overlaps(
                slot.start_time,
                slot.end_time,
                appt.start_time,
                appt.end_time
            ));
        }
    }
    // The cancelled 12:00 booking holds nothing: its slot is offered
    assert!(available
        .iter()
        .any(|s| s.start_time == Utc.with_ymd_and_hms(YEAR, MONTH, DAY, 12, 0, 0).unwrap()));
}
