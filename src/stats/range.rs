//! Calendar ranges for stats queries and their conversion to instant windows

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Campaign, TimeWindow};

/// Lower bound of the `all` range when a campaign has no start date
pub const EPOCH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// Campaign lifetime, bounded by the epoch and today
    All,
    /// Today and the six days before it
    SevenDays,
    Custom { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("unknown range '{0}', expected 'all' or '7days'")]
    UnknownMode(String),
    #[error("from and to must be supplied together")]
    Incomplete,
    #[error("from must not be after to")]
    Inverted,
}

/// Range parameters as they arrive on the query string
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub range: Option<String>,
}

impl RangeParams {
    /// Explicit dates win over a named range. Nothing at all means the last 7 days.
    pub fn mode(&self) -> Result<RangeMode, RangeError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => return Ok(RangeMode::Custom { from, to }),
            (Some(_), None) | (None, Some(_)) => return Err(RangeError::Incomplete),
            (None, None) => {}
        }

        match self.range.as_deref().map(str::trim) {
            None | Some("") | Some("7days") => Ok(RangeMode::SevenDays),
            Some("all") => Ok(RangeMode::All),
            Some(other) => Err(RangeError::UnknownMode(other.to_string())),
        }
    }
}

/// Inclusive calendar range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted);
        }
        Ok(Self { from, to })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    /// Resolves a mode against the campaign being reported on
    pub fn resolve(mode: RangeMode, campaign: &Campaign, today: NaiveDate) -> Result<Self, RangeError> {
        match mode {
            RangeMode::All => {
                let from = campaign.start_date.unwrap_or(EPOCH_DATE);
                let to = campaign.end_date.unwrap_or(today);
                // Campaigns that start in the future collapse to an empty-but-valid range
                Ok(Self {
                    from: from.min(to),
                    to,
                })
            }
            RangeMode::SevenDays => Ok(Self {
                from: today - Duration::days(6),
                to: today,
            }),
            RangeMode::Custom { from, to } => Self::new(from, to),
        }
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// `[from 00:00, (to + 1) 00:00)` in the reporting time zone
    pub fn window(&self, offset: FixedOffset) -> TimeWindow {
        TimeWindow {
            start: local_midnight(self.from, offset),
            end: local_midnight(self.to + Duration::days(1), offset),
        }
    }
}

/// Unix timestamp of midnight at the start of `day` in the given zone
pub fn local_midnight(day: NaiveDate, offset: FixedOffset) -> i64 {
    day.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp()
        - i64::from(offset.local_minus_utc())
}

/// Calendar date in the reporting time zone at `now`
pub fn date_at(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

pub fn today_in(offset: FixedOffset) -> NaiveDate {
    date_at(Utc::now(), offset)
}

/// Non-positive limits fall back to the default; large ones are capped
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}
