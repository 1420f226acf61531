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

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::statistics::PriceThreshold;

const SNAPSHOT_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NemPriceConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub visualization: VisualizationSettings,
    #[serde(default)]
    pub coverage: CoverageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Dispatch interval length
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,
    #[serde(default = "default_top_hours")]
    pub top_hours: usize,
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<PriceThreshold>,
    /// Predicate for run detection (negative-price periods by default)
    #[serde(default = "default_run_threshold")]
    pub run_threshold: PriceThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub symbol: String,
    /// Prices strictly below this limit fall in the band
    pub below: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSettings {
    #[serde(default = "default_region")]
    pub region: String,
    /// Plot every Nth interval (6 = 30 minutes for 5-minute data)
    #[serde(default = "default_sample_every")]
    pub sample_every: usize,
    #[serde(default = "default_largest_changes")]
    pub largest_changes: usize,
    /// Ascending by `below`
    #[serde(default = "default_bands")]
    pub bands: Vec<PriceBand>,
    /// Symbol for prices above every band
    #[serde(default = "default_top_band_symbol")]
    pub top_band_symbol: String,
    /// Day of the snapshot table. First day of the dataset when unset.
    #[serde(default)]
    pub snapshot_date: Option<NaiveDate>,
    /// "HH:MM" market times
    #[serde(default = "default_snapshot_times")]
    pub snapshot_times: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSettings {
    /// Clock hours listed in the per-hour record count section
    #[serde(default = "default_hours_shown")]
    pub hours_shown: usize,
}

fn default_interval_minutes() -> i64 {
    5
}

fn default_top_hours() -> usize {
    3
}

fn default_percentiles() -> Vec<f64> {
    vec![10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0]
}

fn default_thresholds() -> Vec<PriceThreshold> {
    PriceThreshold::defaults()
}

fn default_run_threshold() -> PriceThreshold {
    PriceThreshold::below("negative", 0.0)
}

fn default_region() -> String {
    "SA1".to_owned()
}

fn default_sample_every() -> usize {
    6
}

fn default_largest_changes() -> usize {
    5
}

fn default_bands() -> Vec<PriceBand> {
    [("-", 0.0), ("L", 100.0), ("N", 200.0), ("H", 300.0)]
        .into_iter()
        .map(|(symbol, below)| PriceBand {
            symbol: symbol.to_owned(),
            below,
        })
        .collect()
}

fn default_top_band_symbol() -> String {
    "S".to_owned()
}

fn default_snapshot_times() -> Vec<String> {
    ["03:00", "07:30", "12:00", "14:30", "17:30"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn default_hours_shown() -> usize {
    5
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            top_hours: default_top_hours(),
            percentiles: default_percentiles(),
            thresholds: default_thresholds(),
            run_threshold: default_run_threshold(),
        }
    }
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            region: default_region(),
            sample_every: default_sample_every(),
            largest_changes: default_largest_changes(),
            bands: default_bands(),
            top_band_symbol: default_top_band_symbol(),
            snapshot_date: None,
            snapshot_times: default_snapshot_times(),
        }
    }
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            hours_shown: default_hours_shown(),
        }
    }
}

impl AnalysisSettings {
    pub fn interval(&self) -> Duration {
        Duration::minutes(self.interval_minutes)
    }
}

impl VisualizationSettings {
    pub fn band_symbol(&self, price: f64) -> &str {
        self.bands
            .iter()
            .find(|band| price < band.below)
            .map_or(self.top_band_symbol.as_str(), |band| band.symbol.as_str())
    }

    pub fn snapshot_times(&self) -> Result<Vec<NaiveTime>> {
        self.snapshot_times
            .iter()
            .map(|t| {
                NaiveTime::parse_from_str(t, SNAPSHOT_TIME_FORMAT)
                    .with_context(|| format!("Invalid snapshot time '{t}', expected HH:MM"))
            })
            .collect()
    }
}

impl NemPriceConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.interval_minutes <= 0 {
            bail!("analysis.interval_minutes must be positive");
        }
        if analysis.top_hours == 0 {
            bail!("analysis.top_hours must be at least 1");
        }
        if let Some(q) = analysis
            .percentiles
            .iter()
            .find(|q| !(0.0..=100.0).contains(*q))
        {
            bail!("analysis.percentiles must be within 0-100, got {q}");
        }
        if analysis.thresholds.iter().any(|t| t.name.is_empty()) {
            bail!("analysis.thresholds entries must have a name");
        }

        let visualization = &self.visualization;
        if visualization.region.is_empty() {
            bail!("visualization.region must be set");
        }
        if visualization.sample_every == 0 {
            bail!("visualization.sample_every must be at least 1");
        }
        if visualization
            .bands
            .windows(2)
            .any(|w| w[1].below <= w[0].below)
        {
            bail!("visualization.bands must be ordered by ascending 'below' limit");
        }
        visualization.snapshot_times()?;

        Ok(())
    }

    /// Annotated configuration with every default spelled out
    pub fn example_toml() -> &'static str {
        r#"# NEMPrice configuration

[analysis]
# Dispatch interval length in minutes
interval_minutes = 5
# Peak / off-peak hours listed per region
top_hours = 3
percentiles = [10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0]

# Event thresholds: "above" counts price > limit, "below" counts price < limit
[[analysis.thresholds]]
name = "spike"
direction = "above"
limit = 300.0

[[analysis.thresholds]]
name = "high"
direction = "above"
limit = 200.0

[[analysis.thresholds]]
name = "negative"
direction = "below"
limit = 0.0

[[analysis.thresholds]]
name = "low"
direction = "below"
limit = 100.0

# Periods reported as runs
[analysis.run_threshold]
name = "negative"
direction = "below"
limit = 0.0

[visualization]
region = "SA1"
# Plot every 6th interval (30 minutes)
sample_every = 6
largest_changes = 5
top_band_symbol = "S"
# snapshot_date = "2025-06-30"
snapshot_times = ["03:00", "07:30", "12:00", "14:30", "17:30"]

[[visualization.bands]]
symbol = "-"
below = 0.0

[[visualization.bands]]
symbol = "L"
below = 100.0

[[visualization.bands]]
symbol = "N"
below = 200.0

[[visualization.bands]]
symbol = "H"
below = 300.0

[coverage]
hours_shown = 5
"#
    }
}
