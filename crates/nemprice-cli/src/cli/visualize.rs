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

//! Text price timeline for one region plus volatility examples and a
//! cross-region snapshot table.

use anyhow::{Result, bail};
use chrono::{NaiveDate, Timelike};
use comfy_table::{Attribute, Cell, CellAlignment, Table, presets::UTF8_FULL};
use nemprice_core::temporal::{SeriesCursor, find_runs, largest_changes};
use nemprice_core::{AnalysisSettings, VisualizationSettings};
use nemprice_types::{RegionMap, RegionSeries};

use super::formatters::{format_clock, format_money, format_timestamp};

const NOT_AVAILABLE: &str = "n/a";

/// Renders the `visualize` report
#[derive(Debug)]
pub struct TimelineRenderer<'a> {
    visualization: &'a VisualizationSettings,
    analysis: &'a AnalysisSettings,
}

impl<'a> TimelineRenderer<'a> {
    pub fn new(visualization: &'a VisualizationSettings, analysis: &'a AnalysisSettings) -> Self {
        Self {
            visualization,
            analysis,
        }
    }

    /// Timeline, largest changes and price periods for `region_id`, then the
    /// snapshot table over every region
    pub fn render(&self, regions: &RegionMap, region_id: &str) -> Result<String> {
        let Some(series) = regions.get(region_id) else {
            let available: Vec<&str> = regions.keys().map(String::as_str).collect();
            bail!(
                "Region '{region_id}' not found in dataset (available: {})",
                available.join(", ")
            );
        };

        let mut output = String::new();
        output.push_str(&self.render_timeline(series));
        output.push_str(&self.render_largest_changes(series));
        output.push_str(&self.render_price_periods(series));

        if let Some(date) = self.snapshot_date(regions) {
            output.push_str("\n\nSnapshot Comparison - All Regions at Key Times ");
            output.push_str(&format!("({})\n", date.format("%Y-%m-%d")));
            output.push_str(&self.render_snapshots(regions, date)?.to_string());
            output.push('\n');
        }

        Ok(output)
    }

    pub fn render_legend(&self) -> String {
        let mut output = String::new();
        let mut previous: Option<f64> = None;

        for band in &self.visualization.bands {
            let line = match previous {
                None => format!("  [{}] = below {}\n", band.symbol, format_money(band.below)),
                Some(lower) => format!(
                    "  [{}] = ${lower:.2} to {}\n",
                    band.symbol,
                    format_money(band.below)
                ),
            };
            output.push_str(&line);
            previous = Some(band.below);
        }

        match previous {
            Some(lower) => output.push_str(&format!(
                "  [{}] = {} and above\n",
                self.visualization.top_band_symbol,
                format_money(lower)
            )),
            None => output.push_str(&format!(
                "  [{}] = any price\n",
                self.visualization.top_band_symbol
            )),
        }

        output
    }

    /// One line per clock hour, one band symbol per sampled interval
    pub fn render_timeline(&self, series: &RegionSeries) -> String {
        let sample_every = self.visualization.sample_every.max(1);
        let sample_minutes = self.analysis.interval_minutes * sample_every as i64;

        let mut output = String::new();
        output.push_str(&format!(
            "\nPrice Timeline for {} - Text Visualization\n",
            series.region_id()
        ));
        output.push_str(&"=".repeat(80));
        output.push_str(&format!(
            "\nTime slots shown every {sample_minutes} minutes, price ranges:\n"
        ));
        output.push_str(&self.render_legend());
        output.push_str(&"=".repeat(80));
        output.push('\n');

        let mut current_hour = None;
        let mut line = String::new();
        for point in series.points().iter().step_by(sample_every) {
            let hour = (point.timestamp.date(), point.timestamp.hour());
            if current_hour != Some(hour) {
                if !line.is_empty() {
                    output.push_str(&line);
                    output.push('\n');
                }
                current_hour = Some(hour);
                line = format!("{} |", format_clock(point.timestamp));
            }
            line.push_str(&format!(
                " [{}]",
                self.visualization.band_symbol(point.price)
            ));
        }
        if !line.is_empty() {
            output.push_str(&line);
            output.push('\n');
        }

        output
    }

    pub fn render_largest_changes(&self, series: &RegionSeries) -> String {
        let k = self.visualization.largest_changes;
        let mut output = format!(
            "\n\nExamples of Extreme Volatility in {}:\n{}\n",
            series.region_id(),
            "=".repeat(60)
        );
        output.push_str(&format!(
            "\nTop {k} Largest Price Changes ({}-minute intervals):\n",
            self.analysis.interval_minutes
        ));

        for (rank, change) in largest_changes(series.points(), k).iter().enumerate() {
            output.push_str(&format!(
                "{}. {} | ${:.2} -> ${:.2} | Change: ${:+.2}\n",
                rank + 1,
                format_timestamp(change.timestamp),
                change.previous,
                change.price,
                change.change
            ));
        }

        output
    }

    /// Periods matching the configured run threshold, with durations
    pub fn render_price_periods(&self, series: &RegionSeries) -> String {
        let threshold = &self.analysis.run_threshold;
        let runs = find_runs(series.points(), |p| threshold.matches(p));
        if runs.is_empty() {
            return String::new();
        }

        let mut output = format!(
            "\n{} Price Periods in {}:\n",
            capitalize(&threshold.name),
            series.region_id()
        );
        for run in &runs {
            output.push_str(&format!(
                "  {} to {} ({} minutes)\n",
                format_timestamp(run.start),
                format_timestamp(run.end),
                run.duration(self.analysis.interval()).num_minutes()
            ));
        }
        output
    }

    /// Configured snapshot day, or the first day of the dataset
    pub fn snapshot_date(&self, regions: &RegionMap) -> Option<NaiveDate> {
        self.visualization.snapshot_date.or_else(|| {
            regions
                .values()
                .filter_map(|s| s.first().map(|p| p.timestamp.date()))
                .min()
        })
    }

    /// Price of every region at the first interval at or after each key time
    pub fn render_snapshots(&self, regions: &RegionMap, date: NaiveDate) -> Result<Table> {
        let times = self.visualization.snapshot_times()?;

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        let mut header = vec![Cell::new("Time").add_attribute(Attribute::Bold)];
        header.extend(
            regions
                .keys()
                .map(|r| Cell::new(r).add_attribute(Attribute::Bold)),
        );
        table.set_header(header);

        let mut cursors: Vec<SeriesCursor<'_>> = regions
            .values()
            .map(|s| SeriesCursor::new(s.points()))
            .collect();

        for time in times {
            let target = date.and_time(time);
            let mut row = vec![Cell::new(time.format("%H:%M"))];
            row.extend(cursors.iter_mut().map(|cursor| {
                let text = cursor
                    .seek(target)
                    .map_or_else(|_| NOT_AVAILABLE.to_owned(), |p| format!("${:.2}", p.price));
                Cell::new(text).set_alignment(CellAlignment::Right)
            }));
            table.add_row(row);
        }

        Ok(table)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
