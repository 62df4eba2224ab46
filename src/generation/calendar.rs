use super::GenerationError;
use crate::config::{PeriodConfig, PeriodType};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::collections::HashSet;

/// Créneau horaire concret issu de la récurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Déroule la période [start, end] (inclusive) en créneaux ordonnés.
///
/// Dérogations : une date exclue est toujours ignorée ; si des dates incluses
/// sont fournies, elles remplacent le masque de jours.
pub fn enumerate(
    period_type: PeriodType,
    start: NaiveDate,
    end: NaiveDate,
    period: &PeriodConfig,
) -> Result<Vec<TimeSlot>, GenerationError> {
    if end < start {
        return Err(GenerationError::BadRequest(format!(
            "period start date {start} is after end date {end}"
        )));
    }

    let step = match period_type {
        PeriodType::Weekly => 7 * u64::from(period.interval.max(1)),
        PeriodType::Daily | PeriodType::Custom => 1,
    };
    let excluded: HashSet<NaiveDate> = period.excluded_dates.iter().copied().collect();
    let included: HashSet<NaiveDate> = period.included_dates.iter().copied().collect();

    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        if date_retained(current, &excluded, &included, &period.weekdays) {
            let (start_dt, end_dt) = build_datetimes(current, period.start_time, period.end_time)?;
            out.push(TimeSlot {
                date: current,
                start: start_dt,
                end: end_dt,
            });
        }
        match current.checked_add_days(Days::new(step)) {
            Some(next) => current = next,
            None => break,
        }
    }

    Ok(out)
}

fn date_retained(
    date: NaiveDate,
    excluded: &HashSet<NaiveDate>,
    included: &HashSet<NaiveDate>,
    weekdays: &[u8],
) -> bool {
    if excluded.contains(&date) {
        return false;
    }
    if !included.is_empty() {
        return included.contains(&date);
    }
    let weekday = date.weekday().num_days_from_sunday() as u8;
    weekdays.contains(&weekday)
}

/// Horaires du créneau ; `end_time <= start_time` ⇒ fin le lendemain.
fn build_datetimes(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<(DateTime<Utc>, DateTime<Utc>), GenerationError> {
    let start_dt = Utc.from_utc_datetime(&NaiveDateTime::new(date, start_time));
    let mut end_date = date;
    if end_time <= start_time {
        end_date = end_date
            .succ_opt()
            .ok_or_else(|| GenerationError::BadRequest(format!("date overflow after {date}")))?;
    }
    let end_dt = Utc.from_utc_datetime(&NaiveDateTime::new(end_date, end_time));
    Ok((start_dt, end_dt))
}
