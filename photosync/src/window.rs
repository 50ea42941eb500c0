use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeWindowError {
    #[error("Empty time window")]
    Empty,
    #[error("Invalid amount in time window '{0}'")]
    InvalidAmount(String),
    #[error("Unknown unit '{1}' in time window '{0}' (expected h, d, w or M)")]
    UnknownUnit(String, char),
    #[error("Time window '{0}' is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    /// Approximated as four weeks
    Month,
}

/// Relative window like `3d`, meaning "updated in the last three days"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    raw: String,
    duration: Duration,
}

impl TimeUnit {
    fn duration(&self, amount: i64) -> Option<Duration> {
        match self {
            TimeUnit::Hour => Duration::try_hours(amount),
            TimeUnit::Day => Duration::try_days(amount),
            TimeUnit::Week => Duration::try_weeks(amount),
            TimeUnit::Month => amount.checked_mul(4).and_then(Duration::try_weeks),
        }
    }
}

impl TimeWindow {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Lower bound timestamp (seconds since epoch) of the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> Result<i64, TimeWindowError> {
        now.checked_sub_signed(self.duration)
            .map(|since| since.timestamp())
            .ok_or_else(|| TimeWindowError::OutOfRange(self.raw.clone()))
    }
}

impl FromStr for TimeWindow {
    type Err = TimeWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let unit_char = raw.chars().last().ok_or(TimeWindowError::Empty)?;
        let unit = match unit_char {
            'h' => TimeUnit::Hour,
            'd' => TimeUnit::Day,
            'w' => TimeUnit::Week,
            'M' => TimeUnit::Month,
            _ => return Err(TimeWindowError::UnknownUnit(raw.to_string(), unit_char)),
        };
        let raw_amount = &raw[..raw.len() - unit_char.len_utf8()];
        if raw_amount.is_empty() || !raw_amount.chars().all(|c| c.is_ascii_digit()) {
            return Err(TimeWindowError::InvalidAmount(raw.to_string()));
        }
        let amount = raw_amount
            .parse::<i64>()
            .map_err(|_| TimeWindowError::OutOfRange(raw.to_string()))?;
        // Windows reaching before the first representable date are refused
        let duration = unit
            .duration(amount)
            .filter(|duration| {
                DateTime::<Utc>::UNIX_EPOCH
                    .checked_sub_signed(*duration)
                    .is_some()
            })
            .ok_or_else(|| TimeWindowError::OutOfRange(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            duration,
        })
    }
}
