//! SM-2 review scheduling.
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Days, FixedOffset, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Card, Schedule};

pub const MIN_EF: f64 = 1.3;
pub const PASSING_GRADE: i32 = 3;

/// Self-reported recall quality, 0 (blackout) to 5 (perfect).
///
/// The scheduler applies its formula to any value; keeping grades on the
/// 0..=5 scale is up to whoever builds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(pub i32);

impl Grade {
    pub fn is_pass(self) -> bool {
        self.0 >= PASSING_GRADE
    }

    pub fn is_valid(self) -> bool {
        (0..=5).contains(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("system clock is set before the unix epoch: {0}")]
    BeforeEpoch(#[from] std::time::SystemTimeError),
}

/// Source of the current time. Scheduling and due selection never read the
/// wall clock themselves.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<DateTime<FixedOffset>, ClockError>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<DateTime<FixedOffset>, ClockError> {
        // Local::now() cannot report a clock set before 1970
        SystemTime::now().duration_since(UNIX_EPOCH)?;
        Ok(Local::now().fixed_offset())
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> Result<DateTime<FixedOffset>, ClockError> {
        Ok(self.0)
    }
}

fn next_ef(ef: f64, grade: Grade) -> f64 {
    let q = 5.0 - grade.0 as f64;
    let ef = ef + (0.1 - q * (0.08 + q * 0.02));
    if ef < MIN_EF { MIN_EF } else { ef }
}

/// Start of the local day `days` after `now`, as a UTC instant.
fn start_of_day_after<Tz: TimeZone>(now: &DateTime<Tz>, days: u32) -> DateTime<Utc> {
    let tz = now.timezone();
    let date = now
        .date_naive()
        .checked_add_days(Days::new(days as u64))
        .unwrap_or(chrono::NaiveDate::MAX);
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(tz.clone())
        .earliest()
        // midnight skipped by a DST jump; take the offset in effect just after
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
        .with_timezone(&Utc)
}

/// Computes the card's state after being graded at `now`.
///
/// Passing grades step the interval 1 → 6 → `round(interval * ef)` using the
/// ease from before this review; failing grades reset to one day. The ease is
/// updated on every grade, pass or fail, and never drops below 1.3. Rounding is
/// half away from zero.
pub fn calculate<Tz: TimeZone>(card: &Card, grade: Grade, now: &DateTime<Tz>) -> Card {
    let Schedule {
        mut reps,
        mut interval,
        ef,
        ..
    } = card.schedule;

    if grade.is_pass() {
        interval = match reps {
            0 => 1,
            1 => 6,
            _ => (interval as f64 * ef).round() as u32,
        };
        reps = reps.saturating_add(1);
    } else {
        reps = 0;
        interval = 1;
    }

    Card {
        schedule: Schedule {
            reps,
            interval,
            ef: next_ef(ef, grade),
            next_review: start_of_day_after(now, interval),
        },
        ..card.clone()
    }
}
