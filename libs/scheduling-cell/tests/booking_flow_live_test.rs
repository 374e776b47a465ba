// libs/scheduling-cell/tests/booking_flow_live_test.rs
//
// Booking flow against a real Postgres store: the in-transaction conflict
// check, the last-resort unique index under concurrent requests, and the
// availability query over persisted windows and bookings.
//
// Only runs when DATABASE_TESTS=true and DATABASE_URL points at a disposable
// database; migrations are applied on first connect.

use chrono::{Datelike, Duration, NaiveTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use scheduling_cell::models::{
    BookAppointmentRequest, CreateWorkingWindowRequest, DayOfWeek, SchedulingError,
};
use scheduling_cell::services::booking::BookingService;
use scheduling_cell::services::slots::AvailabilityService;
use scheduling_cell::services::windows::WorkingWindowService;
use shared_models::auth::{Actor, RequestMeta, StaffRole};

fn should_run_store_tests() -> bool {
    std::env::var("DATABASE_TESTS").unwrap_or_default() == "true"
}

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for store-backed tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("store-backed tests need a reachable database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations must apply cleanly");

    pool
}

fn scheduler_actor() -> Actor {
    Actor {
        id: Uuid::new_v4(),
        name: "Front Desk".to_string(),
        role: StaffRole::FrontDesk,
    }
}

/// A date at least one day out, so bookings never land in the past.
fn upcoming_date() -> chrono::NaiveDate {
    Utc::now().date_naive() + Duration::days(7)
}

fn booking_request(
    practitioner_id: Uuid,
    date: chrono::NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: Uuid::new_v4(),
        practitioner_id,
        service_id: Uuid::new_v4(),
        start_time: date
            .and_time(NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap())
            .and_utc(),
        end_time: date
            .and_time(NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap())
            .and_utc(),
        notes: None,
        status: None,
    }
}

#[tokio::test]
async fn booked_slot_disappears_and_overlap_is_rejected() {
    if !should_run_store_tests() {
        println!("skipping store-backed tests (set DATABASE_TESTS=true to enable)");
        return;
    }

    let pool = test_pool().await;
    let practitioner_id = Uuid::new_v4();
    let date = upcoming_date();
    let actor = scheduler_actor();
    let meta = RequestMeta::default();

    let windows = WorkingWindowService::new(pool.clone());
    windows
        .create(
            practitioner_id,
            CreateWorkingWindowRequest {
                day_of_week: DayOfWeek::from(date.weekday()),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                slot_duration_minutes: Some(30),
            },
            &actor,
            &meta,
        )
        .await
        .unwrap();

    let availability = AvailabilityService::new(pool.clone());
    let open = availability
        .get_available_slots(practitioner_id, date)
        .await
        .unwrap();
    assert_eq!(open.len(), 2);

    let booking = BookingService::new(pool.clone());
    booking
        .book(booking_request(practitioner_id, date, (9, 0), (9, 30)), &actor, &meta)
        .await
        .unwrap();

    let remaining = availability
        .get_available_slots(practitioner_id, date)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].start_time,
        date.and_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()).and_utc()
    );

    // 09:15-09:45 straddles the existing booking
    let err = booking
        .book(booking_request(practitioner_id, date, (9, 15), (9, 45)), &actor, &meta)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Conflict), "{:?}", err);
}

#[tokio::test]
async fn concurrent_requests_for_one_slot_book_exactly_once() {
    if !should_run_store_tests() {
        return;
    }

    let pool = test_pool().await;
    let practitioner_id = Uuid::new_v4();
    let date = upcoming_date();
    let actor = scheduler_actor();
    let meta = RequestMeta::default();

    let first = BookingService::new(pool.clone());
    let second = BookingService::new(pool.clone());

    let (a, b) = tokio::join!(
        first.book(booking_request(practitioner_id, date, (11, 0), (11, 30)), &actor, &meta),
        second.book(booking_request(practitioner_id, date, (11, 0), (11, 30)), &actor, &meta),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two racing bookings may win");

    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loser, SchedulingError::Conflict), "{:?}", loser);
}
