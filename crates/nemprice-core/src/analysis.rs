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

//! Analysis driver.
//!
//! Runs every statistics and temporal operation for each region and for the
//! market as a whole. A failing metric is stored as an `Err` next to the
//! metrics that succeeded, so one bad region or operation never hides the
//! rest of the report.

use chrono::NaiveDateTime;
use nemprice_types::error::Result;
use nemprice_types::{RegionMap, RegionSeries};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisSettings;
use crate::statistics::{
    self, Dispersion, EventCount, PercentileValue, direction_change_frequency,
    direction_changes, event_counts, mean_absolute_error, mean_absolute_percentage_error,
};
use crate::temporal::{
    HourRanking, HourlyAverages, PriceRun, find_runs, group_by_hour_of_day, rank_hours,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAnalysis {
    pub region_id: String,
    pub count: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub dispersion: Result<Dispersion>,
    pub mean_absolute_error: f64,
    pub mean_absolute_percentage_error: f64,
    pub direction_changes: usize,
    /// Percent of interior points where the direction flips
    pub direction_change_frequency: Option<f64>,
    pub events: Vec<EventCount>,
    pub hourly: HourlyAverages,
    pub ranking: HourRanking,
    pub percentiles: Result<Vec<PercentileValue>>,
    /// Runs matching `AnalysisSettings::run_threshold`
    pub runs: Vec<PriceRun>,
}

impl RegionAnalysis {
    pub fn event(&self, name: &str) -> Option<&EventCount> {
        self.events.iter().find(|e| e.threshold.name == name)
    }
}

/// Statistics over every price of every region pooled together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub total_points: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub mean: Result<f64>,
    pub stdev: Result<f64>,
    pub events: Vec<EventCount>,
}

impl MarketSummary {
    /// Hours between the first and last timestamp of the dataset
    pub fn span_hours(&self) -> Option<f64> {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Some((last - first).num_minutes() as f64 / 60.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    /// Ascending region order
    pub regions: Vec<RegionAnalysis>,
    pub summary: MarketSummary,
}

impl MarketAnalysis {
    pub fn region(&self, region_id: &str) -> Option<&RegionAnalysis> {
        self.regions.iter().find(|r| r.region_id == region_id)
    }

    pub fn region_ids(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.region_id.as_str()).collect()
    }
}

pub fn analyze_region(series: &RegionSeries, settings: &AnalysisSettings) -> RegionAnalysis {
    let prices = series.prices();
    let hourly = group_by_hour_of_day(series.points());
    let ranking = rank_hours(&hourly, settings.top_hours);
    let run_threshold = &settings.run_threshold;

    let analysis = RegionAnalysis {
        region_id: series.region_id().to_owned(),
        count: prices.len(),
        first: series.first().map(|p| p.timestamp),
        last: series.last().map(|p| p.timestamp),
        dispersion: statistics::dispersion(&prices),
        mean_absolute_error: mean_absolute_error(&prices),
        mean_absolute_percentage_error: mean_absolute_percentage_error(&prices),
        direction_changes: direction_changes(&prices),
        direction_change_frequency: direction_change_frequency(&prices),
        events: event_counts(&prices, &settings.thresholds),
        hourly,
        ranking,
        percentiles: statistics::percentiles(&prices, &settings.percentiles),
        runs: find_runs(series.points(), |p| run_threshold.matches(p)),
    };

    if let Err(e) = &analysis.dispersion {
        debug!("Region {}: dispersion unavailable: {}", analysis.region_id, e);
    }
    debug!(
        "Region {}: {} points, {} direction changes, {} {} runs",
        analysis.region_id,
        analysis.count,
        analysis.direction_changes,
        analysis.runs.len(),
        run_threshold.name
    );

    analysis
}

pub fn analyze_market(regions: &RegionMap, settings: &AnalysisSettings) -> MarketAnalysis {
    let analyses: Vec<RegionAnalysis> = regions
        .values()
        .map(|series| analyze_region(series, settings))
        .collect();

    let all_prices: Vec<f64> = regions.values().flat_map(RegionSeries::prices).collect();
    let first = regions
        .values()
        .filter_map(|s| s.first().map(|p| p.timestamp))
        .min();
    let last = regions
        .values()
        .filter_map(|s| s.last().map(|p| p.timestamp))
        .max();

    let summary = MarketSummary {
        total_points: all_prices.len(),
        first,
        last,
        mean: statistics::mean(&all_prices),
        stdev: statistics::sample_stdev(&all_prices),
        events: event_counts(&all_prices, &settings.thresholds),
    };

    info!(
        "Analyzed {} regions, {} price points",
        analyses.len(),
        summary.total_points
    );

    MarketAnalysis {
        regions: analyses,
        summary,
    }
}
