use crate::MeasurementEntry;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    id: String,
    measured_at: String,
    #[serde(default)]
    recorded_at: Option<String>,
    primary: f64,
    #[serde(default)]
    secondary_a: Option<f64>,
    #[serde(default)]
    secondary_b: Option<f64>,
}

/// Reads a CSV snapshot with header
/// `id,measured_at,recorded_at,primary,secondary_a,secondary_b`.
///
/// Blank optional cells are read as absent. A blank `recorded_at` falls back
/// to `measured_at`.
pub fn read_csv_snapshot(path: &Path) -> Result<Vec<MeasurementEntry>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
    let entries = parse_csv_snapshot(file)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    debug!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn parse_csv_snapshot<R: Read>(reader: R) -> Result<Vec<MeasurementEntry>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = Vec::new();

    for (idx, result) in rdr.deserialize::<SnapshotRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        let row = result.with_context(|| format!("Malformed row on line {}", line))?;

        let measured_at = parse_timestamp(&row.measured_at)
            .with_context(|| format!("Bad measured_at on line {}", line))?;
        let recorded_at = match row.recorded_at.as_deref() {
            Some(s) if !s.is_empty() => parse_timestamp(s)
                .with_context(|| format!("Bad recorded_at on line {}", line))?,
            _ => measured_at,
        };

        entries.push(MeasurementEntry {
            id: row.id,
            measured_at,
            recorded_at,
            primary: row.primary,
            secondary_a: row.secondary_a,
            secondary_b: row.secondary_b,
        });
    }

    if entries.is_empty() {
        warn!("Snapshot contains no entries");
    }

    Ok(entries)
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("expected {}, got {:?}", TIMESTAMP_FORMAT, s))
}
