//! Maps relative day expressions onto a forecast's available horizon

use super::result::ResolvedWindow;
use crate::error::{ResolveError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Days covered by a week summary
const WEEK_DAYS: u32 = 7;

/// A parsed range expression, before it is checked against the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeExpression {
    Today,
    Tomorrow,
    Weekday(Weekday),
    Week,
}

impl RangeExpression {
    /// Parse an expression; case and surrounding whitespace are ignored
    pub fn parse(expression: &str) -> Result<Self> {
        let normalized = expression.trim().to_lowercase();
        let parsed = match normalized.as_str() {
            "today" | "tonight" => Self::Today,
            "tomorrow" => Self::Tomorrow,
            "week" | "this week" | "weekly" => Self::Week,
            "monday" => Self::Weekday(Weekday::Mon),
            "tuesday" => Self::Weekday(Weekday::Tue),
            "wednesday" => Self::Weekday(Weekday::Wed),
            "thursday" => Self::Weekday(Weekday::Thu),
            "friday" => Self::Weekday(Weekday::Fri),
            "saturday" => Self::Weekday(Weekday::Sat),
            "sunday" => Self::Weekday(Weekday::Sun),
            _ => {
                return Err(ResolveError::InvalidArguments(format!(
                    "unknown forecast range '{}': use today, tomorrow, week or a day name",
                    expression.trim()
                )));
            },
        };
        Ok(parsed)
    }

    pub fn is_week(self) -> bool {
        self == Self::Week
    }

    /// Day offset from `today`; `None` for the week summary
    ///
    /// A weekday name means its next occurrence, today included.
    pub fn day_offset(self, today: NaiveDate) -> Option<u32> {
        match self {
            Self::Today => Some(0),
            Self::Tomorrow => Some(1),
            Self::Weekday(target) => Some(
                (target.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7,
            ),
            Self::Week => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpan {
    Day { offset: u32 },
    Week,
}

/// Concrete forecast window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastWindow {
    pub span: WindowSpan,
    /// Day offsets from today covered by the window, ascending
    pub day_offsets: Vec<u32>,
    /// Whether hourly periods should be used
    pub hourly: bool,
    /// Whether live sensor readings belong in the result
    pub include_current: bool,
}

impl ForecastWindow {
    /// Calendar dates covered by the window
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        self.day_offsets
            .iter()
            .filter_map(|offset| today.checked_add_days(Days::new(u64::from(*offset))))
            .collect()
    }

    pub fn resolved(&self, today: NaiveDate) -> ResolvedWindow {
        let dates = self.dates(today);
        let first = dates.first().copied().unwrap_or(today);
        match self.span {
            WindowSpan::Day { .. } => ResolvedWindow::Day { date: first },
            WindowSpan::Week => ResolvedWindow::Week {
                from: first,
                to: dates.last().copied().unwrap_or(first),
            },
        }
    }
}

/// Number of days the forecast covers, counting today
///
/// `(last entry date - today) + 1`, or 0 when no entry lies in the future.
pub fn horizon_days(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    dates
        .into_iter()
        .max()
        .map(|last| (last - today).num_days())
        .filter(|days| *days >= 0)
        .map_or(0, |days| u32::try_from(days + 1).unwrap_or(u32::MAX))
}

/// Resolve a relative day expression against the available horizon
pub fn resolve_window(
    expression: &str,
    today: NaiveDate,
    horizon_days: u32,
    hourly_capable: bool,
) -> Result<ForecastWindow> {
    let expression = RangeExpression::parse(expression)?;

    match expression.day_offset(today) {
        Some(offset) => {
            if offset >= horizon_days {
                return Err(ResolveError::HorizonExceeded {
                    requested: offset,
                    available: horizon_days,
                });
            }
            Ok(ForecastWindow {
                span: WindowSpan::Day { offset },
                day_offsets: vec![offset],
                hourly: hourly_capable,
                include_current: offset == 0,
            })
        },
        None => {
            if horizon_days == 0 {
                return Err(ResolveError::HorizonExceeded {
                    requested: 0,
                    available: 0,
                });
            }
            Ok(ForecastWindow {
                span: WindowSpan::Week,
                day_offsets: (0..horizon_days.min(WEEK_DAYS)).collect(),
                hourly: false,
                include_current: true,
            })
        },
    }
}
