use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{debug, info};
use serde::Serialize;
use weight_trend::config::{Args, Report};
use weight_trend::progress::{chart_series, ChartSeries, ProgressSummary};
use weight_trend::{
    data_loading, output, units, AggregationResult, ComparisonResult,
    TrendAggregator,
};

#[derive(Serialize)]
struct HistoryReport<'a> {
    history: &'a AggregationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<ChartSeries>,
}

#[derive(Serialize)]
struct CompareReport<'a> {
    summary: ProgressSummary,
    comparison: &'a ComparisonResult,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let today = Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();

    let snapshot = data_loading::read_csv_snapshot(&args.input_path)?;
    let entries = units::convert_entries(&snapshot, args.input_unit, args.unit);
    let trend = TrendAggregator::new(&entries).context("Snapshot failed validation")?;
    info!(
        "Loaded {} entries, reporting in {}",
        trend.len(),
        args.unit.abbrev()
    );

    match args.report {
        Report::History => {
            let until = args.today.unwrap_or(today);
            let result = trend.full_history_until(args.window, until);

            if let Some(path) = &args.csv_output {
                output::write_history_csv(path, &result)?;
            }

            if args.json {
                let chart = args.span.map(|span| chart_series(&result, span));
                output::print_json(&HistoryReport {
                    history: &result,
                    chart,
                })?;
            } else {
                println!(
                    "{} daily averages with a {} day lookback",
                    result.points.len(),
                    args.window
                );
                if let Some(latest) = result.points.last() {
                    output::write_average(&mut stdout, latest, args.unit)?;
                }
                output::write_best_point(&mut stdout, &result, args.unit)?;
            }
        }
        Report::Compare => {
            let anchor = args.anchor.unwrap_or(today);
            debug!("Comparing {:?} periods ending {}", args.period, anchor);
            let comparison = trend.compare_periods(args.period.period_count(), anchor);

            if args.json {
                output::print_json(&CompareReport {
                    summary: ProgressSummary::from_comparison(&comparison),
                    comparison: &comparison,
                })?;
            } else {
                output::write_comparison(&mut stdout, &comparison, args.period, args.unit)?;
            }
        }
        Report::Average => {
            let anchor = args.anchor.unwrap_or(today);
            let point = trend.average_at(anchor, args.window);

            if args.json {
                output::print_json(&point)?;
            } else {
                output::write_average(&mut stdout, &point, args.unit)?;
            }
        }
    }

    Ok(())
}
