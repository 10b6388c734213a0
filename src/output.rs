use crate::progress::{ProgressPeriod, ProgressSummary};
use crate::units::Unit;
use crate::{AggregationResult, AveragePoint, ComparisonResult};
use anyhow::Result;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

const NO_DATA: &str = "Not enough data yet";

pub fn write_history_csv(path: &Path, result: &AggregationResult) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    info!("Writing {} daily averages to {}", result.points.len(), path.display());
    let file = std::fs::File::create(path)?;
    write_history(file, result)
}

pub fn write_history<W: Write>(writer: W, result: &AggregationResult) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record([
        "anchor_date",
        "avg_primary",
        "avg_secondary_a",
        "avg_secondary_b",
        "entries",
        "lookback_days",
    ])?;

    for point in &result.points {
        writer.write_record(&[
            point.anchor_date.format("%Y-%m-%d").to_string(),
            cell(point.avg_primary),
            cell(point.avg_secondary_a),
            cell(point.avg_secondary_b),
            point.entry_count.to_string(),
            point.lookback_days.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn write_average<W: Write>(out: &mut W, point: &AveragePoint, unit: Unit) -> Result<()> {
    writeln!(
        out,
        "Average as of {} ({} day lookback, {} entries)",
        point.as_of().format("%Y-%m-%d %H:%M:%S"),
        point.lookback_days,
        point.entry_count
    )?;
    writeln!(out, "  Weight: {}", display(point.avg_primary, unit))?;
    writeln!(out, "  Fat:    {}", display(point.avg_secondary_a, unit))?;
    writeln!(out, "  Muscle: {}", display(point.avg_secondary_b, unit))?;
    Ok(())
}

pub fn write_best_point<W: Write>(out: &mut W, result: &AggregationResult, unit: Unit) -> Result<()> {
    match &result.best_point {
        Some(best) => writeln!(
            out,
            "Lowest average: {} on {}",
            display(best.avg_primary, unit),
            best.anchor_date.format("%Y-%m-%d")
        )?,
        None => writeln!(out, "Lowest average: {}", NO_DATA)?,
    }
    Ok(())
}

pub fn write_comparison<W: Write>(
    out: &mut W,
    comparison: &ComparisonResult,
    period: ProgressPeriod,
    unit: Unit,
) -> Result<()> {
    let summary = ProgressSummary::from_comparison(comparison);

    match &comparison.current_period {
        Some(current) => writeln!(out, "Current week ending {}", current.anchor_date)?,
        None => writeln!(out, "Current week: {}", NO_DATA)?,
    }
    match &comparison.comparison_period {
        Some(previous) => writeln!(
            out,
            "Compared to week ending {} ({})",
            previous.anchor_date,
            period.label()
        )?,
        None => writeln!(out, "Week {}: {}", period.label(), NO_DATA)?,
    }

    writeln!(
        out,
        "  Weight: {} ({})",
        display(summary.primary, unit),
        change(summary.primary_change, unit)
    )?;
    writeln!(
        out,
        "  Fat:    {} ({})",
        display(summary.secondary_a, unit),
        change(summary.secondary_a_change, unit)
    )?;
    writeln!(
        out,
        "  Muscle: {} ({})",
        display(summary.secondary_b, unit),
        change(summary.secondary_b_change, unit)
    )?;
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn display(value: Option<f64>, unit: Unit) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, unit.abbrev()),
        None => NO_DATA.to_string(),
    }
}

fn change(value: Option<f64>, unit: Unit) -> String {
    match value {
        Some(v) => format!("{:+.1} {}", v, unit.abbrev()),
        None => "N/A".to_string(),
    }
}
