use crate::{AggregationResult, AveragePoint, ComparisonResult, MeasurementEntry};
use chrono::{Days, Local, NaiveDate};
use log::{debug, trace};
use thiserror::Error;

/// Lookback used by period comparisons: a fixed 7 calendar day span.
pub const COMPARISON_LOOKBACK_DAYS: u32 = 6;
const DAYS_PER_PERIOD: u64 = 7;

#[derive(Debug, Error, PartialEq)]
pub enum TrendError {
    #[error("malformed entry {id}: {reason}")]
    MalformedEntry { id: String, reason: String },
}

/// Moving-average engine over a read-only snapshot of measurement entries.
///
/// A lookback of `N` days covers the calendar dates `[end - N, end]`, that is
/// from `end - N` at 00:00:00 through `end` at 23:59:59, both inclusive.
/// Every query is a pure function of the snapshot taken in [`TrendAggregator::new`].
#[derive(Debug, Clone)]
pub struct TrendAggregator<'a> {
    entries: Vec<&'a MeasurementEntry>,
}

impl<'a> TrendAggregator<'a> {
    /// Validates the snapshot and orders it by measurement time.
    ///
    /// Entries with a missing id, or a negative or non-finite value, are
    /// rejected instead of being averaged.
    pub fn new(entries: &'a [MeasurementEntry]) -> Result<Self, TrendError> {
        for entry in entries {
            validate_entry(entry)?;
        }

        let mut sorted: Vec<&MeasurementEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| {
            a.measured_at
                .cmp(&b.measured_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!("Trend snapshot holds {} entries", sorted.len());
        Ok(Self { entries: sorted })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.measured_at.date())
    }

    /// Entries measured within `lookback_days` days before `end_date`, inclusive,
    /// in chronological order.
    pub fn window_entries(&self, end_date: NaiveDate, lookback_days: u32) -> &[&'a MeasurementEntry] {
        let start = window_start(end_date, lookback_days);
        let lo = self
            .entries
            .partition_point(|e| e.measured_at.date() < start);
        let hi = self
            .entries
            .partition_point(|e| e.measured_at.date() <= end_date);
        &self.entries[lo..hi]
    }

    /// Moving average as of `anchor_date`.
    ///
    /// An empty window is widened until it reaches the nearest earlier entry.
    /// It never reaches past the first entry of the snapshot, so an anchor
    /// with nothing at or before it yields an empty point.
    pub fn average_at(&self, anchor_date: NaiveDate, window_size: u32) -> AveragePoint {
        let mut lookback = window_size;
        let mut window = self.window_entries(anchor_date, lookback);

        if window.is_empty() {
            match self.expanded_lookback(anchor_date, lookback) {
                Some(expanded) => {
                    trace!(
                        "Widening window at {} from {} to {} days",
                        anchor_date,
                        lookback,
                        expanded
                    );
                    lookback = expanded;
                    window = self.window_entries(anchor_date, lookback);
                }
                None => return AveragePoint::empty(anchor_date, lookback),
            }
        }

        average_window(anchor_date, lookback, window)
    }

    /// Day-by-day averages from the first entry's date through today.
    pub fn full_history(&self, window_size: u32) -> AggregationResult {
        self.full_history_until(window_size, Local::now().date_naive())
    }

    /// Day-by-day averages from the first entry's date through `today`, inclusive.
    pub fn full_history_until(&self, window_size: u32, today: NaiveDate) -> AggregationResult {
        let Some(first) = self.earliest_date() else {
            debug!("No entries, returning an empty history");
            return AggregationResult {
                points: Vec::new(),
                best_point: None,
            };
        };

        let mut points = Vec::new();
        let mut best_point: Option<AveragePoint> = None;

        for day in first.iter_days().take_while(|d| *d <= today) {
            let point = self.average_at(day, window_size);
            if is_lower(&point, best_point.as_ref()) {
                best_point = Some(point.clone());
            }
            points.push(point);
        }

        debug!(
            "Computed {} daily averages with a {} day window",
            points.len(),
            window_size
        );

        AggregationResult { points, best_point }
    }

    /// Compares the 7 day average ending at `reference_end` with the one
    /// ending `7 * (period_count - 1)` days earlier.
    ///
    /// A `period_count` of 2 is week over week; 5 compares against four weeks back.
    pub fn compare_periods(&self, period_count: u32, reference_end: NaiveDate) -> ComparisonResult {
        let offset = DAYS_PER_PERIOD * u64::from(period_count.saturating_sub(1));
        let comparison_end = reference_end
            .checked_sub_days(Days::new(offset))
            .unwrap_or(NaiveDate::MIN);

        let current = self.average_at(reference_end, COMPARISON_LOOKBACK_DAYS);
        let comparison = self.average_at(comparison_end, COMPARISON_LOOKBACK_DAYS);
        debug!(
            "Comparing {} ({} entries) against {} ({} entries)",
            reference_end, current.entry_count, comparison_end, comparison.entry_count
        );

        let current_period = current.has_data().then_some(current);
        let comparison_period = comparison.has_data().then_some(comparison);
        let found = |field: fn(&AveragePoint) -> Option<f64>| {
            comparison_period.as_ref().and_then(field).is_some()
        };

        ComparisonResult {
            comparison_entry_found: comparison_period.is_some(),
            comparison_primary_found: found(|p| p.avg_primary),
            comparison_secondary_a_found: found(|p| p.avg_secondary_a),
            comparison_secondary_b_found: found(|p| p.avg_secondary_b),
            current_period,
            comparison_period,
        }
    }

    /// Smallest lookback that reaches the latest entry before the window start.
    fn expanded_lookback(&self, anchor_date: NaiveDate, lookback: u32) -> Option<u32> {
        let start = window_start(anchor_date, lookback);
        let before = self
            .entries
            .partition_point(|e| e.measured_at.date() < start);
        let nearest = self.entries[..before].last()?;
        let days = (anchor_date - nearest.measured_at.date()).num_days();
        u32::try_from(days).ok()
    }
}

fn validate_entry(entry: &MeasurementEntry) -> Result<(), TrendError> {
    let malformed = |reason: String| TrendError::MalformedEntry {
        id: entry.id.clone(),
        reason,
    };

    if entry.id.trim().is_empty() {
        return Err(malformed("missing id".to_string()));
    }
    check_value(entry.primary).map_err(|r| malformed(format!("primary value {}", r)))?;
    if let Some(value) = entry.secondary_a {
        check_value(value).map_err(|r| malformed(format!("secondary value A {}", r)))?;
    }
    if let Some(value) = entry.secondary_b {
        check_value(value).map_err(|r| malformed(format!("secondary value B {}", r)))?;
    }
    Ok(())
}

fn check_value(value: f64) -> Result<(), String> {
    if !value.is_finite() {
        Err(format!("is not a number: {}", value))
    } else if value < 0.0 {
        Err(format!("is negative: {}", value))
    } else {
        Ok(())
    }
}

fn window_start(end_date: NaiveDate, lookback_days: u32) -> NaiveDate {
    end_date
        .checked_sub_days(Days::new(u64::from(lookback_days)))
        .unwrap_or(NaiveDate::MIN)
}

fn average_window(
    anchor_date: NaiveDate,
    lookback_days: u32,
    window: &[&MeasurementEntry],
) -> AveragePoint {
    AveragePoint {
        anchor_date,
        avg_primary: mean(window.iter().map(|e| e.primary)),
        avg_secondary_a: mean(window.iter().filter_map(|e| e.secondary_a)),
        avg_secondary_b: mean(window.iter().filter_map(|e| e.secondary_b)),
        entry_count: window.len(),
        lookback_days,
    }
}

// None when nothing reported the field, never zero
fn mean<I>(values: I) -> Option<f64>
where
    I: Iterator<Item = f64>,
{
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn is_lower(point: &AveragePoint, best: Option<&AveragePoint>) -> bool {
    match (point.avg_primary, best.and_then(|b| b.avg_primary)) {
        (Some(value), Some(lowest)) => value < lowest,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n)
    }

    fn at(n: u64, h: u32, m: u32, s: u32) -> NaiveDateTime {
        day(n).and_time(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    fn entry(id: &str, n: u64, primary: f64) -> MeasurementEntry {
        MeasurementEntry::new(id, at(n, 8, 0, 0), primary)
    }

    #[test]
    fn window_includes_both_boundaries() {
        let entries = vec![
            MeasurementEntry::new("before", at(6, 23, 59, 59), 1.0),
            MeasurementEntry::new("start", at(7, 0, 0, 0), 2.0),
            MeasurementEntry::new("end", at(10, 23, 59, 59), 3.0),
            MeasurementEntry::new("after", at(11, 0, 0, 0), 4.0),
        ];
        let trend = TrendAggregator::new(&entries).unwrap();

        let ids: Vec<&str> = trend
            .window_entries(day(10), 3)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["start", "end"]);
    }

    #[test]
    fn zero_lookback_covers_only_the_end_date() {
        let entries = vec![entry("a", 4, 100.0), entry("b", 5, 110.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let window = trend.window_entries(day(5), 0);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, "b");
    }

    #[test]
    fn lone_early_entry_is_reached_by_expansion() {
        let entries = vec![entry("a", 0, 150.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let point = trend.average_at(day(30), 1);
        assert_eq!(point.avg_primary, Some(150.0));
        assert_eq!(point.entry_count, 1);
        assert_eq!(point.lookback_days, 30);
    }

    #[test]
    fn expansion_stops_at_nearest_earlier_entry() {
        let entries = vec![entry("a", 0, 100.0), entry("b", 10, 200.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let point = trend.average_at(day(20), 3);
        assert_eq!(point.avg_primary, Some(200.0));
        assert_eq!(point.lookback_days, 10);
    }

    #[test]
    fn anchor_before_first_entry_has_no_data() {
        let entries = vec![entry("a", 10, 100.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let point = trend.average_at(day(5), 2);
        assert!(!point.has_data());
        assert_eq!(point.avg_primary, None);
        assert_eq!(point.avg_secondary_a, None);
        assert_eq!(point.lookback_days, 2);
    }

    #[test]
    fn secondary_fields_use_their_own_denominators() {
        let entries = vec![
            entry("a", 1, 150.0),
            entry("b", 2, 160.0).with_secondary_a(20.0),
        ];
        let trend = TrendAggregator::new(&entries).unwrap();

        let point = trend.average_at(day(2), 7);
        assert_eq!(point.avg_primary, Some(155.0));
        assert_eq!(point.avg_secondary_a, Some(20.0));
        assert_eq!(point.avg_secondary_b, None);
    }

    #[test]
    fn reported_zero_is_data() {
        let entries = vec![
            entry("a", 1, 150.0).with_secondary_b(0.0),
            entry("b", 2, 160.0),
        ];
        let trend = TrendAggregator::new(&entries).unwrap();

        assert_eq!(trend.average_at(day(2), 7).avg_secondary_b, Some(0.0));
    }

    #[test]
    fn three_day_average_without_expansion() {
        let entries = vec![
            entry("a", 1, 200.0),
            entry("b", 2, 198.0),
            entry("c", 3, 199.0),
        ];
        let trend = TrendAggregator::new(&entries).unwrap();

        let point = trend.average_at(day(3), 7);
        assert_eq!(point.avg_primary, Some(199.0));
        assert_eq!(point.lookback_days, 7);
        assert_eq!(point.entry_count, 3);
    }

    #[test]
    fn history_runs_through_today_inclusive() {
        let entries = vec![entry("a", 0, 180.0), entry("b", 2, 178.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.full_history_until(1, day(4));
        let dates: Vec<NaiveDate> = result.points.iter().map(|p| p.anchor_date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2), day(3), day(4)]);
        assert!(result.points.iter().all(|p| p.has_data()));
        // day 4 widens back to the day 2 entry
        assert_eq!(result.points[4].avg_primary, Some(178.0));
        assert_eq!(result.points[4].lookback_days, 2);
    }

    #[test]
    fn best_point_prefers_earliest_on_ties() {
        let entries = vec![
            entry("a", 0, 160.0),
            entry("b", 1, 150.0),
            entry("c", 2, 150.0),
            entry("d", 3, 155.0),
        ];
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.full_history_until(0, day(3));
        let best = result.best_point.unwrap();
        assert_eq!(best.anchor_date, day(1));
        assert_eq!(best.avg_primary, Some(150.0));
    }

    #[test]
    fn history_ignores_input_order() {
        let chronological = vec![
            entry("a", 0, 181.5).with_secondary_a(30.0),
            entry("b", 3, 180.0),
            entry("c", 4, 179.25).with_secondary_b(70.0),
            entry("d", 9, 178.0).with_secondary_a(29.0),
        ];
        let mut reversed = chronological.clone();
        reversed.reverse();

        let forward = TrendAggregator::new(&chronological).unwrap();
        let backward = TrendAggregator::new(&reversed).unwrap();
        assert_eq!(
            forward.full_history_until(7, day(12)),
            backward.full_history_until(7, day(12))
        );
    }

    #[test]
    fn empty_snapshot_gives_empty_history() {
        let entries: Vec<MeasurementEntry> = Vec::new();
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.full_history_until(7, day(0));
        assert!(result.points.is_empty());
        assert!(result.best_point.is_none());
        assert!(!trend.average_at(day(0), 7).has_data());
    }

    #[test]
    fn today_before_first_entry_gives_empty_history() {
        let entries = vec![entry("a", 5, 180.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.full_history_until(7, day(2));
        assert!(result.points.is_empty());
        assert!(result.best_point.is_none());
    }

    #[test]
    fn comparison_window_without_entries_is_missing() {
        let entries: Vec<MeasurementEntry> = (30..=35)
            .map(|n| entry(&format!("e{}", n), n, 170.0 + n as f64).with_secondary_a(25.0))
            .collect();
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.compare_periods(5, day(35));
        let current = result.current_period.unwrap();
        assert_eq!(current.entry_count, 6);
        assert_eq!(current.avg_secondary_a, Some(25.0));
        assert!(result.comparison_period.is_none());
        assert!(!result.comparison_entry_found);
        assert!(!result.comparison_primary_found);
        assert!(!result.comparison_secondary_a_found);
        assert!(!result.comparison_secondary_b_found);
    }

    #[test]
    fn week_over_week_reports_missing_secondary_fields() {
        let entries = vec![
            entry("old", 7, 190.0),
            entry("new", 14, 180.0).with_secondary_a(22.0),
        ];
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.compare_periods(2, day(14));
        let current = result.current_period.unwrap();
        let comparison = result.comparison_period.unwrap();
        assert_eq!(current.avg_primary, Some(180.0));
        assert_eq!(current.lookback_days, COMPARISON_LOOKBACK_DAYS);
        assert_eq!(comparison.anchor_date, day(7));
        assert_eq!(comparison.avg_primary, Some(190.0));
        assert!(result.comparison_entry_found);
        assert!(result.comparison_primary_found);
        assert!(!result.comparison_secondary_a_found);
    }

    #[test]
    fn empty_comparison_window_widens_to_earlier_entry() {
        let entries = vec![entry("first", 0, 200.0), entry("later", 30, 180.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.compare_periods(5, day(35));
        let comparison = result.comparison_period.unwrap();
        assert_eq!(comparison.anchor_date, day(7));
        assert_eq!(comparison.avg_primary, Some(200.0));
        assert_eq!(comparison.lookback_days, 7);
        assert!(result.comparison_entry_found);
        assert!(result.comparison_primary_found);
        let current = result.current_period.unwrap();
        assert_eq!(current.avg_primary, Some(180.0));
        assert_eq!(current.lookback_days, COMPARISON_LOOKBACK_DAYS);

        // nothing in the current week either: both sides widen
        let result = trend.compare_periods(5, day(45));
        let current = result.current_period.unwrap();
        assert_eq!(current.avg_primary, Some(180.0));
        assert_eq!(current.lookback_days, 15);
        let comparison = result.comparison_period.unwrap();
        assert_eq!(comparison.anchor_date, day(17));
        assert_eq!(comparison.avg_primary, Some(200.0));
        assert_eq!(comparison.lookback_days, 17);
    }

    #[test]
    fn single_period_compares_the_same_window() {
        let entries = vec![entry("a", 3, 175.0)];
        let trend = TrendAggregator::new(&entries).unwrap();

        let result = trend.compare_periods(1, day(3));
        assert_eq!(result.current_period, result.comparison_period);
    }

    #[test]
    fn negative_primary_is_rejected() {
        let entries = vec![entry("ok", 0, 150.0), entry("bad", 1, -1.0)];
        let err = TrendAggregator::new(&entries).unwrap_err();
        assert!(matches!(err, TrendError::MalformedEntry { ref id, .. } if id == "bad"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let nan = vec![entry("nan", 0, f64::NAN)];
        assert!(TrendAggregator::new(&nan).is_err());

        let inf = vec![entry("inf", 0, 150.0).with_secondary_b(f64::INFINITY)];
        assert!(TrendAggregator::new(&inf).is_err());
    }

    #[test]
    fn blank_id_is_rejected() {
        let entries = vec![entry(" ", 0, 150.0)];
        assert!(TrendAggregator::new(&entries).is_err());
    }
}
