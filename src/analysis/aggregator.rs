//! Per-prefecture aggregation and ranking.
//!
//! Aggregation is two-phase: every qualifying line overwrites one count of
//! its category's summary, and only once the input is exhausted does
//! [`SummaryTable::finalize`] derive the change ratios.

use crate::config::YearsConfig;
use crate::input::{parse_line, InputError, RawLine, Record};
use crate::models::{Count, Period, RankingEntry, SummaryEntry};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, trace};

/// The two reference years a run compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceYears {
    pub early: i64,
    pub late: i64,
}

impl ReferenceYears {
    pub fn new(early: i64, late: i64) -> Self {
        Self { early, late }
    }

    /// Which period a year falls into, if any. An unparsed year never matches.
    pub fn period_of(&self, year: Option<i64>) -> Option<Period> {
        match year {
            Some(y) if y == self.early => Some(Period::Early),
            Some(y) if y == self.late => Some(Period::Late),
            _ => None,
        }
    }
}

impl From<YearsConfig> for ReferenceYears {
    fn from(config: YearsConfig) -> Self {
        Self::new(config.early, config.late)
    }
}

/// Summary entries keyed by category, in first-seen order.
#[derive(Debug, Default)]
pub struct SummaryTable {
    index: HashMap<String, usize>,
    entries: Vec<(String, SummaryEntry)>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` for `key` in the given period, creating the entry on first sight.
    pub fn accumulate(&mut self, key: &str, period: Period, count: Count) {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.index.insert(key.to_string(), slot);
                self.entries.push((key.to_string(), SummaryEntry::default()));
                slot
            }
        };

        self.entries[slot].1.set(period, count);
    }

    /// Compute the ratio of every entry. Call once, after all input is consumed.
    pub fn finalize(&mut self) {
        for (_, entry) in self.entries.iter_mut() {
            entry.ratio = Some(entry.compute_ratio());
        }
    }

    #[allow(dead_code)] // Lookup for tests and future per-key reporting
    pub fn get(&self, key: &str) -> Option<&SummaryEntry> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the table into entries sorted by descending ratio.
    ///
    /// NaN ratios go last. The sort is stable, so equal ratios keep
    /// first-seen order.
    pub fn rank(self) -> Vec<RankingEntry> {
        let mut ranking: Vec<RankingEntry> = self
            .entries
            .into_iter()
            .map(|(key, summary)| RankingEntry { key, summary })
            .collect();

        ranking.sort_by(|a, b| compare_ratio_desc(a.ratio(), b.ratio()));
        ranking
    }
}

fn compare_ratio_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Counters gathered while reading the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub lines_read: usize,
    pub lines_accumulated: usize,
    pub lines_skipped: usize,
}

/// Feed every line of a source into a fresh table.
///
/// Stops at the first fatal error (read failure or short line); lines whose
/// year is not a reference year are skipped silently.
pub fn aggregate<I>(
    lines: I,
    years: ReferenceYears,
) -> Result<(SummaryTable, AggregateStats), InputError>
where
    I: IntoIterator<Item = Result<RawLine, InputError>>,
{
    let mut table = SummaryTable::new();
    let mut stats = AggregateStats::default();

    for line in lines {
        let RawLine {
            line_number,
            record,
        } = line?;
        stats.lines_read += 1;

        let fields = parse_line(&record);
        let record = Record::extract(&fields, line_number)?;

        match years.period_of(record.year) {
            Some(period) => {
                trace!(line_number, key = %record.key, ?period, "Accumulating");
                table.accumulate(&record.key, period, record.count);
                stats.lines_accumulated += 1;
            }
            None => stats.lines_skipped += 1,
        }
    }

    debug!(
        lines_read = stats.lines_read,
        lines_accumulated = stats.lines_accumulated,
        lines_skipped = stats.lines_skipped,
        categories = table.len(),
        "Input consumed"
    );

    Ok((table, stats))
}
