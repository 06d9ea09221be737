use booking_engine::{
    expand, find_overlap, validate_window, Booking, BookingDetails, RecurrenceRule, Schedule,
    MAX_OCCURRENCES,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use uuid::Uuid;

fn bench_expansion(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
    let end = start + Duration::hours(1);
    let daily = Schedule::resolve(
        &RecurrenceRule::daily(1).until(start + Duration::days(365)),
        start,
        3,
    )
    .unwrap();
    let monthly = Schedule::resolve(
        &RecurrenceRule::monthly(1).until(start + Duration::days(3650)),
        start,
        3,
    )
    .unwrap();

    c.bench_function("expand_daily_capped", |b| {
        b.iter(|| expand(black_box(start), black_box(end), daily, MAX_OCCURRENCES).count())
    });
    c.bench_function("expand_monthly_clamped", |b| {
        b.iter(|| expand(black_box(start), black_box(end), monthly, MAX_OCCURRENCES).count())
    });
}

fn bench_plan_series(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let start = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
    let end = start + Duration::hours(1);
    let owner = Uuid::new_v4();
    // Existing afternoon bookings every day for a year.
    let existing: Vec<Booking> = (0..365)
        .map(|d| {
            let s = start + Duration::days(d) + Duration::hours(5);
            Booking::new(owner, s, s + Duration::hours(1), BookingDetails::titled("busy"))
        })
        .collect();
    let schedule = Schedule::resolve(&RecurrenceRule::daily(1), start, 3).unwrap();

    c.bench_function("validate_and_check_series", |b| {
        b.iter(|| {
            expand(start, end, schedule, MAX_OCCURRENCES)
                .filter(|o| validate_window(o.start, o.end, "Europe/Berlin", now).is_ok())
                .filter(|o| find_overlap(o.start, o.end, &existing).is_none())
                .count()
        })
    });
}

criterion_group!(benches, bench_expansion, bench_plan_series);
criterion_main!(benches);
