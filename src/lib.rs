pub mod config;
pub mod data_loading;
pub mod output;
pub mod progress;
pub mod trend;
pub mod units;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub use trend::{TrendAggregator, TrendError};

/// One user-recorded measurement, as handed over by the measurement store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEntry {
    pub id: String,
    /// When the measurement was taken, not when it was saved.
    pub measured_at: NaiveDateTime,
    pub recorded_at: NaiveDateTime,
    pub primary: f64,
    #[serde(default)]
    pub secondary_a: Option<f64>,
    #[serde(default)]
    pub secondary_b: Option<f64>,
}

impl MeasurementEntry {
    pub fn new(id: impl Into<String>, measured_at: NaiveDateTime, primary: f64) -> Self {
        Self {
            id: id.into(),
            measured_at,
            recorded_at: measured_at,
            primary,
            secondary_a: None,
            secondary_b: None,
        }
    }

    pub fn with_secondary_a(mut self, value: f64) -> Self {
        self.secondary_a = Some(value);
        self
    }

    pub fn with_secondary_b(mut self, value: f64) -> Self {
        self.secondary_b = Some(value);
        self
    }
}

/// A moving average anchored to a calendar date.
///
/// Every average is `None` when nothing contributed to it; the secondary
/// averages are divided by the number of entries that reported that field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragePoint {
    pub anchor_date: NaiveDate,
    pub avg_primary: Option<f64>,
    pub avg_secondary_a: Option<f64>,
    pub avg_secondary_b: Option<f64>,
    pub entry_count: usize,
    /// Lookback actually used, after any expansion.
    pub lookback_days: u32,
}

impl AveragePoint {
    pub fn empty(anchor_date: NaiveDate, lookback_days: u32) -> Self {
        Self {
            anchor_date,
            avg_primary: None,
            avg_secondary_a: None,
            avg_secondary_b: None,
            entry_count: 0,
            lookback_days,
        }
    }

    /// The instant the average is "as of": the last second of the anchor date.
    pub fn as_of(&self) -> NaiveDateTime {
        self.anchor_date.and_time(end_of_day())
    }

    pub fn has_data(&self) -> bool {
        self.entry_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub points: Vec<AveragePoint>,
    /// Lowest primary average of the sweep, earliest date on ties.
    pub best_point: Option<AveragePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub current_period: Option<AveragePoint>,
    pub comparison_period: Option<AveragePoint>,
    pub comparison_entry_found: bool,
    pub comparison_primary_found: bool,
    pub comparison_secondary_a_found: bool,
    pub comparison_secondary_b_found: bool,
}

pub(crate) fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
