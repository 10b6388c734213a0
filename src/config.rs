use crate::progress::{ChartSpan, ProgressPeriod};
use crate::units::Unit;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    History, // daily moving averages plus the best point (default)
    Compare, // current window against an earlier one
    Average, // a single average at the anchor date
}

impl FromStr for Report {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "history" => Ok(Report::History),
            "compare" => Ok(Report::Compare),
            "average" => Ok(Report::Average),
            _ => Err(format!(
                "Invalid report: {}. Use history (default), compare or average",
                s
            )),
        }
    }
}

/// Compute weight trends from a measurement snapshot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the CSV measurement snapshot
    #[arg(help = "Path to the CSV measurement snapshot")]
    pub input_path: PathBuf,

    /// Report to produce: history, compare or average
    #[arg(long, default_value = "history")]
    pub report: Report,

    /// Moving average lookback in days
    #[arg(long, default_value = "7", env = "WEIGHT_TREND_WINDOW")]
    pub window: u32,

    /// Anchor date for average and compare reports (format: YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub anchor: Option<NaiveDate>,

    /// Last day of the history sweep (format: YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Comparison period for the compare report (week or month)
    #[arg(long, default_value = "week")]
    pub period: ProgressPeriod,

    /// Trailing chart span included in JSON history output (month, quarter or year)
    #[arg(long)]
    pub span: Option<ChartSpan>,

    /// Unit the snapshot values are stored in
    #[arg(long, default_value = "lbs")]
    pub input_unit: Unit,

    /// Unit to report averages in
    #[arg(long, default_value = "lbs", env = "WEIGHT_TREND_UNIT")]
    pub unit: Unit,

    /// CSV output path for the daily history
    #[arg(long)]
    pub csv_output: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long)]
    pub json: bool,
}
