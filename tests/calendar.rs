#![forbid(unsafe_code)]
mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{d, t, weekday_period};
use planif::generation::enumerate;
use planif::{GenerationError, PeriodConfig, PeriodType};

fn dates(period_type: PeriodType, start: NaiveDate, end: NaiveDate, period: &PeriodConfig) -> Vec<NaiveDate> {
    enumerate(period_type, start, end, period)
        .unwrap()
        .into_iter()
        .map(|s| s.date)
        .collect()
}

#[test]
fn weekday_mask_skips_weekend() {
    // 2025-01-01 est un mercredi
    let got = dates(PeriodType::Daily, d(2025, 1, 1), d(2025, 1, 7), &weekday_period());
    assert_eq!(
        got,
        vec![d(2025, 1, 1), d(2025, 1, 2), d(2025, 1, 3), d(2025, 1, 6), d(2025, 1, 7)]
    );
}

#[test]
fn slots_carry_configured_hours() {
    let slots = enumerate(PeriodType::Daily, d(2025, 1, 6), d(2025, 1, 6), &weekday_period()).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start, Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap());
    assert_eq!(slots[0].end, Utc.with_ymd_and_hms(2025, 1, 6, 16, 0, 0).unwrap());
}

#[test]
fn excluded_dates_win_over_mask() {
    let mut period = weekday_period();
    period.excluded_dates = vec![d(2025, 1, 2), d(2025, 1, 4)];
    let got = dates(PeriodType::Daily, d(2025, 1, 1), d(2025, 1, 7), &period);
    assert_eq!(got, vec![d(2025, 1, 1), d(2025, 1, 3), d(2025, 1, 6), d(2025, 1, 7)]);
}

#[test]
fn included_dates_replace_mask_but_not_exclusions() {
    let mut period = weekday_period();
    period.included_dates = vec![d(2025, 1, 4), d(2025, 1, 5), d(2025, 1, 20)];
    let got = dates(PeriodType::Custom, d(2025, 1, 1), d(2025, 1, 7), &period);
    assert_eq!(got, vec![d(2025, 1, 4), d(2025, 1, 5)]);

    period.excluded_dates = vec![d(2025, 1, 5)];
    let got = dates(PeriodType::Custom, d(2025, 1, 1), d(2025, 1, 7), &period);
    assert_eq!(got, vec![d(2025, 1, 4)]);
}

#[test]
fn weekly_steps_by_interval() {
    let mut period = PeriodConfig::new(0..=6, t(9, 0), t(17, 0));
    period.interval = 2;
    let got = dates(PeriodType::Weekly, d(2025, 1, 1), d(2025, 2, 28), &period);
    assert_eq!(
        got,
        vec![d(2025, 1, 1), d(2025, 1, 15), d(2025, 1, 29), d(2025, 2, 12), d(2025, 2, 26)]
    );
}

#[test]
fn single_day_range_yields_one_slot() {
    let period = PeriodConfig::new([3], t(8, 0), t(16, 0));
    let got = dates(PeriodType::Daily, d(2025, 1, 1), d(2025, 1, 1), &period);
    assert_eq!(got, vec![d(2025, 1, 1)]);
}

#[test]
fn start_after_end_is_rejected() {
    let err = enumerate(PeriodType::Daily, d(2025, 1, 7), d(2025, 1, 1), &weekday_period()).unwrap_err();
    assert!(matches!(err, GenerationError::BadRequest(_)));
}

#[test]
fn overnight_slot_ends_next_day() {
    let period = PeriodConfig::new(0..=6, t(22, 0), t(6, 0));
    let slots = enumerate(PeriodType::Daily, d(2025, 3, 1), d(2025, 3, 2), &period).unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].end, Utc.with_ymd_and_hms(2025, 3, 2, 6, 0, 0).unwrap());
    assert!(slots.windows(2).all(|w| w[0].start < w[1].start));
}
