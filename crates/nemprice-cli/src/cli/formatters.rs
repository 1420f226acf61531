// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of NEMPrice.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Output formatters for analysis and coverage reports.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, presets::UTF8_FULL};
use nemprice_core::AnalysisSettings;
use nemprice_core::analysis::{MarketAnalysis, RegionAnalysis};
use nemprice_core::coverage::CoverageReport;
use nemprice_core::series::BuildStats;
use nemprice_core::statistics::{EventCount, PriceThreshold, ThresholdDirection};
use serde::Serialize;

const REPORT_RULE: usize = 80;
const SECTION_RULE: usize = 70;
const NOT_AVAILABLE: &str = "n/a";

/// Formatter for text reports and pretty tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for machine-readable output
#[derive(Debug)]
pub struct JsonFormatter;

// ============================================================================
// Value formatting
// ============================================================================

/// `$X.XX/MWh`
pub fn format_money(value: f64) -> String {
    format!("${value:.2}/MWh")
}

/// `X.X%`
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// `YYYY-MM-DD HH:MM`
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

/// `HH:MM`
pub fn format_clock(timestamp: NaiveDateTime) -> String {
    timestamp.format("%H:%M").to_string()
}

/// `HH:00`
pub fn format_hour(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// `> $300.00/MWh`, `< $0.00/MWh`
pub fn threshold_label(threshold: &PriceThreshold) -> String {
    let op = match threshold.direction {
        ThresholdDirection::Above => '>',
        ThresholdDirection::Below => '<',
    };
    format!("{op} {}", format_money(threshold.limit))
}

fn rule(width: usize) -> String {
    "=".repeat(width)
}

fn section_heading(title: &str) -> String {
    format!("\n{}\n{title}\n{}\n", rule(SECTION_RULE), rule(SECTION_RULE))
}

fn event_summary(event: &EventCount) -> String {
    format!("{} ({})", event.count, format_percent(event.percent()))
}

/// `format_money`, or `n/a` for a metric that could not be computed
fn money_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), format_money)
}

fn amount_cell(value: Option<f64>) -> Cell {
    Cell::new(value.map_or_else(|| NOT_AVAILABLE.to_owned(), |v| format!("{v:.2}")))
        .set_alignment(CellAlignment::Right)
}

fn bold(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

impl TableFormatter {
    // ========================================================================
    // analyze
    // ========================================================================

    /// Full market report: every region, comparison table and market summary
    pub fn format_analysis(analysis: &MarketAnalysis, settings: &AnalysisSettings) -> String {
        let mut output = String::new();

        output.push_str(&rule(REPORT_RULE));
        output.push('\n');
        output.push_str("AEMO ELECTRICITY MARKET ANALYSIS - 5-MINUTE DISPATCH PRICES\n");
        output.push_str(&rule(REPORT_RULE));
        output.push('\n');

        let summary = &analysis.summary;
        if let (Some(first), Some(last)) = (summary.first, summary.last) {
            output.push_str(&format!(
                "\nData Period: {} to {}\n",
                format_timestamp(first),
                format_timestamp(last)
            ));
        }
        if let Some(hours) = summary.span_hours() {
            output.push_str(&format!("Duration: {hours:.1} hours\n"));
        }
        output.push_str(&format!(
            "Regions analyzed: {}\n",
            analysis.region_ids().join(", ")
        ));

        for region in &analysis.regions {
            output.push_str(&Self::format_region(region, settings));
        }

        output.push_str(&section_heading("INTER-REGIONAL COMPARISON"));
        output.push('\n');
        output.push_str(&Self::format_comparison(analysis).to_string());
        output.push('\n');

        output.push_str(&section_heading("MARKET SUMMARY"));
        output.push_str(&format!("\nTotal price points: {}\n", summary.total_points));
        output.push_str(&format!(
            "Market average: {}\n",
            money_or_na(summary.mean.clone().ok())
        ));
        output.push_str(&format!(
            "Market std dev: {}\n",
            money_or_na(summary.stdev.clone().ok())
        ));
        for event in &summary.events {
            output.push_str(&format!(
                "{} ({}): {} intervals\n",
                event.threshold.name,
                threshold_label(&event.threshold),
                event_summary(event)
            ));
        }

        output
    }

    /// One region section of the analysis report
    pub fn format_region(region: &RegionAnalysis, settings: &AnalysisSettings) -> String {
        let mut output = String::new();

        output.push_str(&section_heading(&format!("REGION: {}", region.region_id)));
        output.push_str(&format!(
            "\nData points: {} ({}-minute intervals)\n",
            region.count, settings.interval_minutes
        ));

        output.push_str("\nPrice Statistics:\n");
        match &region.dispersion {
            Ok(d) => {
                output.push_str(&format!("  Minimum: {}\n", format_money(d.min)));
                output.push_str(&format!("  Maximum: {}\n", format_money(d.max)));
                output.push_str(&format!("  Average: {}\n", format_money(d.mean)));
                output.push_str(&format!("  Median: {}\n", format_money(d.median)));
                output.push_str(&format!("  Std Dev: {}\n", money_or_na(d.stdev.clone().ok())));
                output.push_str(&format!("  Price range: {}\n", format_money(d.range())));
            }
            Err(e) => output.push_str(&format!("  {NOT_AVAILABLE} ({e})\n")),
        }

        let cv = region
            .dispersion
            .as_ref()
            .ok()
            .and_then(|d| d.coefficient_of_variation.as_ref().ok())
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |cv| format_percent(*cv));

        output.push_str("\nVolatility Metrics:\n");
        output.push_str(&format!(
            "  MAE (consecutive prices): {}\n",
            format_money(region.mean_absolute_error)
        ));
        output.push_str(&format!(
            "  MAPE (consecutive prices): {}\n",
            format_percent(region.mean_absolute_percentage_error)
        ));
        output.push_str(&format!("  Coefficient of Variation: {cv}\n"));

        output.push_str("\nPrice Movement Analysis:\n");
        output.push_str(&format!("  Direction changes: {} times\n", region.direction_changes));
        output.push_str(&format!(
            "  Direction change frequency: {}\n",
            region
                .direction_change_frequency
                .map_or_else(|| NOT_AVAILABLE.to_owned(), format_percent)
        ));

        output.push_str("\nPrice Events:\n");
        for event in &region.events {
            output.push_str(&format!(
                "  {} ({}): {} intervals\n",
                event.threshold.name,
                threshold_label(&event.threshold),
                event_summary(event)
            ));
            if let Some(extreme) = event.extreme {
                let which = match event.threshold.direction {
                    ThresholdDirection::Above => "Highest",
                    ThresholdDirection::Below => "Lowest",
                };
                output.push_str(&format!("    {which}: {}\n", format_money(extreme)));
            }
        }

        output.push_str(&format!(
            "\nIntraday Pattern (top {} expensive hours):\n",
            settings.top_hours
        ));
        for hour in &region.ranking.peak {
            output.push_str(&format!(
                "  {} - {} average\n",
                format_hour(hour.hour),
                format_money(hour.mean_price)
            ));
        }
        output.push_str(&format!(
            "\nIntraday Pattern (top {} cheapest hours):\n",
            settings.top_hours
        ));
        for hour in &region.ranking.off_peak {
            output.push_str(&format!(
                "  {} - {} average\n",
                format_hour(hour.hour),
                format_money(hour.mean_price)
            ));
        }

        output.push_str("\nPercentile Distribution:\n");
        match &region.percentiles {
            Ok(values) => {
                for p in values {
                    output.push_str(&format!("  P{:<3} {}\n", p.percentile, format_money(p.value)));
                }
            }
            Err(e) => output.push_str(&format!("  {NOT_AVAILABLE} ({e})\n")),
        }

        output.push_str(&format!(
            "\nPrice Periods ({}, {}):\n",
            settings.run_threshold.name,
            threshold_label(&settings.run_threshold)
        ));
        if region.runs.is_empty() {
            output.push_str("  none\n");
        }
        for run in &region.runs {
            output.push_str(&format!(
                "  {} to {} ({} minutes)\n",
                format_timestamp(run.start),
                format_timestamp(run.end),
                run.duration(settings.interval()).num_minutes()
            ));
        }

        output
    }

    /// Mean, std dev and event counts side by side for every region
    pub fn format_comparison(analysis: &MarketAnalysis) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);

        let thresholds: Vec<&PriceThreshold> = analysis
            .regions
            .first()
            .map(|r| r.events.iter().map(|e| &e.threshold).collect())
            .unwrap_or_default();

        let mut header = vec![
            bold("Region"),
            bold("Average\n($/MWh)"),
            bold("Std Dev\n($/MWh)"),
        ];
        header.extend(
            thresholds
                .iter()
                .map(|t| bold(&format!("{}\n({})", t.name, threshold_label(t)))),
        );
        table.set_header(header);

        let highest_mean = analysis
            .regions
            .iter()
            .filter_map(|r| r.dispersion.as_ref().ok().map(|d| d.mean))
            .max_by(f64::total_cmp);

        for region in &analysis.regions {
            let dispersion = region.dispersion.as_ref().ok();
            let name_cell = if dispersion.map(|d| d.mean) == highest_mean {
                bold(&region.region_id).fg(Color::Red)
            } else {
                Cell::new(&region.region_id)
            };

            let mut row = vec![
                name_cell,
                amount_cell(dispersion.map(|d| d.mean)),
                amount_cell(dispersion.and_then(|d| d.stdev.clone().ok())),
            ];
            row.extend(
                region
                    .events
                    .iter()
                    .map(|e| Cell::new(event_summary(e)).set_alignment(CellAlignment::Right)),
            );
            table.add_row(row);
        }

        table
    }

    // ========================================================================
    // extract
    // ========================================================================

    /// Per-region summary printed after extraction
    pub fn format_extract_summary(analysis: &MarketAnalysis, stats: &BuildStats) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Total records: {} ({} duplicates dropped)\n",
            stats.records, stats.duplicates
        ));
        if let (Some(first), Some(last)) = (analysis.summary.first, analysis.summary.last) {
            output.push_str(&format!(
                "Date range: {} to {}\n",
                format_timestamp(first),
                format_timestamp(last)
            ));
        }
        output.push_str(&format!("Regions: {}\n\n", analysis.region_ids().join(", ")));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            bold("Region"),
            bold("Count"),
            bold("Min"),
            bold("Max"),
            bold("Mean"),
            bold("Median"),
            bold("Std Dev"),
        ]);

        for region in &analysis.regions {
            let mut row = vec![Cell::new(&region.region_id), Cell::new(region.count)];
            match &region.dispersion {
                Ok(d) => row.extend(
                    [
                        Some(d.min),
                        Some(d.max),
                        Some(d.mean),
                        Some(d.median),
                        d.stdev.clone().ok(),
                    ]
                    .into_iter()
                    .map(amount_cell),
                ),
                Err(_) => row.extend((0..5).map(|_| Cell::new(NOT_AVAILABLE))),
            }
            table.add_row(row);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    // ========================================================================
    // coverage
    // ========================================================================

    pub fn format_coverage(report: &CoverageReport, hours_shown: usize) -> String {
        let mut output = String::new();

        output.push_str("Data Coverage Analysis\n");
        output.push_str(&rule(60));
        output.push('\n');
        output.push_str(&format!(
            "Date range: {} to {}\n",
            format_timestamp(report.first),
            format_timestamp(report.last)
        ));
        output.push_str(&format!("Total unique timestamps: {}\n", report.unique_timestamps));
        output.push_str(&format!("Regions: {}\n", report.regions.join(", ")));
        output.push_str(&format!("Time span: {:.1} hours\n", report.span_hours()));

        let intervals: Vec<String> = report
            .interval_minutes
            .iter()
            .map(ToString::to_string)
            .collect();
        output.push_str("\nInterval analysis:\n");
        output.push_str(&format!("Unique intervals found: [{}] minutes\n", intervals.join(", ")));

        if report.gaps.is_empty() {
            output.push_str(&format!(
                "No gaps longer than {} minutes\n",
                report.expected_interval_minutes
            ));
        } else {
            output.push_str(&format!(
                "\nGaps detected (intervals > {} minutes):\n",
                report.expected_interval_minutes
            ));
            for gap in &report.gaps {
                output.push_str(&format!(
                    "  {} to {} ({} minutes)\n",
                    format_timestamp(gap.from),
                    format_timestamp(gap.to),
                    gap.minutes
                ));
            }
        }

        output.push_str(&format!(
            "\nRecords per hour by region (expected {} for {}-minute intervals):\n",
            report.expected_per_hour(),
            report.expected_interval_minutes
        ));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        let mut header = vec![bold("Hour")];
        header.extend(report.regions.iter().map(|r| bold(r)));
        table.set_header(header);

        let expected = usize::try_from(report.expected_per_hour()).unwrap_or_default();
        for hour in report.hourly_counts.iter().take(hours_shown) {
            let mut row = vec![Cell::new(format_timestamp(hour.hour))];
            row.extend(report.regions.iter().map(|region| {
                let count = hour.counts.get(region).copied().unwrap_or_default();
                let cell = Cell::new(count).set_alignment(CellAlignment::Right);
                if count < expected {
                    cell.fg(Color::Yellow)
                } else {
                    cell
                }
            }));
            table.add_row(row);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        if report.hourly_counts.len() > hours_shown {
            output.push_str(&format!(
                "({} of {} hours shown)\n",
                hours_shown,
                report.hourly_counts.len()
            ));
        }

        output
    }
}

impl JsonFormatter {
    pub fn format<T: Serialize>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).context("Failed to serialize report as JSON")
    }
}
