//! Data models for the population ranking.
//!
//! This module contains the core data structures shared by the input
//! parser, the aggregator and the report formatter.

use std::fmt;

/// A population count as read from the input.
///
/// `None` stands for a count that could not be parsed as an integer. It
/// behaves like a not-a-number value: it renders as `NaN` and any ratio
/// computed from it is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count(pub Option<i64>);

impl Count {
    /// A known zero count, the initial value of every summary field.
    pub const ZERO: Count = Count(Some(0));

    /// The count as a float, NaN when it was not a number.
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            Some(n) => n as f64,
            None => f64::NAN,
        }
    }
}

impl From<i64> for Count {
    fn from(n: i64) -> Self {
        Count(Some(n))
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "NaN"),
        }
    }
}

/// Which of the two reference years a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Early,
    Late,
}

/// Aggregated counts for one category key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryEntry {
    /// Count observed in the earlier reference year.
    pub count_early: Count,
    /// Count observed in the later reference year.
    pub count_late: Count,
    /// `count_late / count_early`, set by the finalization pass.
    pub ratio: Option<f64>,
}

impl Default for SummaryEntry {
    fn default() -> Self {
        Self {
            count_early: Count::ZERO,
            count_late: Count::ZERO,
            ratio: None,
        }
    }
}

impl SummaryEntry {
    /// Overwrite the count for the given period.
    pub fn set(&mut self, period: Period, count: Count) {
        match period {
            Period::Early => self.count_early = count,
            Period::Late => self.count_late = count,
        }
    }

    /// Plain float division; zero or NaN denominators give non-finite results.
    pub fn compute_ratio(&self) -> f64 {
        self.count_late.as_f64() / self.count_early.as_f64()
    }
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    /// Category key, e.g. a prefecture name.
    pub key: String,
    pub summary: SummaryEntry,
}

impl RankingEntry {
    /// The finalized ratio, NaN if the entry was never finalized.
    pub fn ratio(&self) -> f64 {
        self.summary.ratio.unwrap_or(f64::NAN)
    }
}
