//! Reporting window resolution
//!
//! Maps a period selector and a "now" instant to the current reporting
//! window plus the contiguous, equal-length window immediately before it.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A reporting window. `from` is always strictly before `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Period {
    /// Create a period, rejecting empty or inverted ranges
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if from >= to {
            return Err(Error::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    /// The window of identical length that ends where this one starts
    pub fn previous(&self) -> Period {
        let from = self
            .from
            .checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Period {
            from,
            to: self.from,
        }
    }

    /// Closed-interval membership: both `from` and `to` are inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }
}

/// Current window and its comparison window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPair {
    pub current: Period,
    pub previous: Period,
}

impl PeriodPair {
    pub fn from_current(current: Period) -> Self {
        Self {
            current,
            previous: current.previous(),
        }
    }
}

/// Reporting window selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSelector {
    /// Midnight (UTC) of today until now
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
    /// Caller-supplied bounds, passed through unchanged
    Custom {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl PeriodSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
            Self::Custom { .. } => "custom",
        }
    }

    /// Resolve to concrete current and previous windows relative to `now`
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<PeriodPair> {
        let current = match *self {
            Self::Today => {
                let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
                Period::new(midnight, now)?
            }
            Self::Last7Days => Period::new(now - Duration::days(7), now)?,
            Self::Last30Days => Period::new(now - Duration::days(30), now)?,
            Self::Last90Days => Period::new(now - Duration::days(90), now)?,
            Self::Custom { from, to } => Period::new(from, to)?,
        };
        Ok(PeriodPair::from_current(current))
    }
}

impl std::str::FromStr for PeriodSelector {
    type Err = String;

    /// Parses the relative selectors; `custom` needs bounds and is built directly
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "7d" | "last-7-days" | "last7days" => Ok(Self::Last7Days),
            "30d" | "last-30-days" | "last30days" => Ok(Self::Last30Days),
            "90d" | "last-90-days" | "last90days" => Ok(Self::Last90Days),
            _ => Err(format!(
                "Invalid period: {}. Use: today, 7d, 30d, 90d (or custom bounds)",
                s
            )),
        }
    }
}

impl std::fmt::Display for PeriodSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_today_starts_at_midnight() {
        let now = at(2026, 3, 10, 15, 30);
        let pair = PeriodSelector::Today.resolve(now).unwrap();

        assert_eq!(pair.current.from, at(2026, 3, 10, 0, 0));
        assert_eq!(pair.current.to, now);
        assert_eq!(pair.previous.from, at(2026, 3, 9, 8, 30));
        assert_eq!(pair.previous.to, at(2026, 3, 10, 0, 0));
    }

    #[test]
    fn test_today_at_exact_midnight_is_empty() {
        let now = at(2026, 3, 10, 0, 0);
        let err = PeriodSelector::Today.resolve(now).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_rolling_windows() {
        let now = at(2026, 3, 31, 12, 0);
        for (selector, days) in [
            (PeriodSelector::Last7Days, 7),
            (PeriodSelector::Last30Days, 30),
            (PeriodSelector::Last90Days, 90),
        ] {
            let pair = selector.resolve(now).unwrap();
            assert_eq!(pair.current.to, now);
            assert_eq!(pair.current.duration(), Duration::days(days));
        }
    }

    #[test]
    fn test_previous_is_contiguous_and_equal_length() {
        let now = at(2026, 3, 31, 12, 0);
        let selectors = [
            PeriodSelector::Today,
            PeriodSelector::Last7Days,
            PeriodSelector::Last30Days,
            PeriodSelector::Last90Days,
            PeriodSelector::Custom {
                from: at(2026, 2, 1, 0, 0),
                to: at(2026, 2, 14, 6, 0),
            },
        ];

        for selector in selectors {
            let pair = selector.resolve(now).unwrap();
            assert_eq!(pair.previous.to, pair.current.from, "{}", selector);
            assert_eq!(
                pair.previous.duration(),
                pair.current.duration(),
                "{}",
                selector
            );
        }
    }

    #[test]
    fn test_custom_passes_bounds_through() {
        let from = at(2026, 1, 1, 0, 0);
        let to = at(2026, 1, 31, 23, 59);
        let pair = PeriodSelector::Custom { from, to }
            .resolve(at(2026, 6, 1, 0, 0))
            .unwrap();

        assert_eq!(pair.current.from, from);
        assert_eq!(pair.current.to, to);
    }

    #[test]
    fn test_custom_rejects_inverted_and_empty_ranges() {
        let a = at(2026, 1, 10, 0, 0);
        let b = at(2026, 1, 1, 0, 0);

        let inverted = PeriodSelector::Custom { from: a, to: b }.resolve(a);
        assert!(matches!(inverted, Err(Error::InvalidRange { .. })));

        let empty = PeriodSelector::Custom { from: a, to: a }.resolve(a);
        assert!(matches!(empty, Err(Error::InvalidRange { .. })));
    }

    #[test]
    fn test_contains_is_closed_interval() {
        let period = Period::new(at(2026, 1, 1, 0, 0), at(2026, 1, 2, 0, 0)).unwrap();

        assert!(period.contains(period.from));
        assert!(period.contains(period.to));
        assert!(!period.contains(period.from - Duration::seconds(1)));
        assert!(!period.contains(period.to + Duration::seconds(1)));
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(
            PeriodSelector::from_str("30D").unwrap(),
            PeriodSelector::Last30Days
        );
        assert_eq!(
            PeriodSelector::from_str("last-7-days").unwrap(),
            PeriodSelector::Last7Days
        );
        assert!(PeriodSelector::from_str("custom").is_err());
        assert!(PeriodSelector::from_str("fortnight").is_err());
    }
}
