use crate::{AggregationResult, AveragePoint, ComparisonResult};
use serde::Serialize;
use std::str::FromStr;

/// How far back the progress card compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPeriod {
    Week,
    Month,
}

impl ProgressPeriod {
    /// Period count handed to `TrendAggregator::compare_periods`.
    pub fn period_count(&self) -> u32 {
        match self {
            ProgressPeriod::Week => 2,
            ProgressPeriod::Month => 5,
        }
    }

    /// How far back the comparison window ends, for report headers.
    pub fn label(&self) -> &'static str {
        match self {
            ProgressPeriod::Week => "1 week earlier",
            ProgressPeriod::Month => "4 weeks earlier",
        }
    }
}

impl FromStr for ProgressPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(ProgressPeriod::Week),
            "month" => Ok(ProgressPeriod::Month),
            _ => Err(format!("Invalid progress period: {}. Use week or month", s)),
        }
    }
}

/// Trailing span of the daily series shown on a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSpan {
    Month,
    Quarter,
    Year,
}

impl ChartSpan {
    pub fn days(&self) -> usize {
        match self {
            ChartSpan::Month => 30,
            ChartSpan::Quarter => 120,
            ChartSpan::Year => 365,
        }
    }
}

impl FromStr for ChartSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "month" => Ok(ChartSpan::Month),
            "quarter" => Ok(ChartSpan::Quarter),
            "year" => Ok(ChartSpan::Year),
            _ => Err(format!(
                "Invalid chart span: {}. Use month, quarter or year",
                s
            )),
        }
    }
}

/// Column-oriented series for a line chart. Missing averages stay `None`
/// so the chart draws a gap rather than a drop to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub primary: Vec<Option<f64>>,
    pub secondary_a: Vec<Option<f64>>,
    pub secondary_b: Vec<Option<f64>>,
}

pub fn chart_series(result: &AggregationResult, span: ChartSpan) -> ChartSeries {
    let skip = result.points.len().saturating_sub(span.days());
    let points = &result.points[skip..];

    ChartSeries {
        labels: points
            .iter()
            .map(|p| p.anchor_date.format("%b %d '%y").to_string())
            .collect(),
        primary: points.iter().map(|p| p.avg_primary).collect(),
        secondary_a: points.iter().map(|p| p.avg_secondary_a).collect(),
        secondary_b: points.iter().map(|p| p.avg_secondary_b).collect(),
    }
}

/// Current averages and their change against the comparison window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub primary: Option<f64>,
    pub primary_change: Option<f64>,
    pub secondary_a: Option<f64>,
    pub secondary_a_change: Option<f64>,
    pub secondary_b: Option<f64>,
    pub secondary_b_change: Option<f64>,
}

impl ProgressSummary {
    pub fn from_comparison(comparison: &ComparisonResult) -> Self {
        let current = comparison.current_period.as_ref();
        let previous = comparison.comparison_period.as_ref();
        let value = |field: fn(&AveragePoint) -> Option<f64>| current.and_then(field);
        let change = |field: fn(&AveragePoint) -> Option<f64>| {
            match (current.and_then(field), previous.and_then(field)) {
                (Some(now), Some(then)) => Some(now - then),
                _ => None,
            }
        };

        ProgressSummary {
            primary: value(|p| p.avg_primary),
            primary_change: change(|p| p.avg_primary),
            secondary_a: value(|p| p.avg_secondary_a),
            secondary_a_change: change(|p| p.avg_secondary_a),
            secondary_b: value(|p| p.avg_secondary_b),
            secondary_b_change: change(|p| p.avg_secondary_b),
        }
    }
}
