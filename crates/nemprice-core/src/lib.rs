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

//! NEMPrice analytics engine: record ingestion, series building, statistics,
//! temporal aggregation and coverage analysis over NEM dispatch prices.

pub mod analysis;
pub mod config;
pub mod coverage;
pub mod ingest;
pub mod series;
pub mod statistics;
pub mod temporal;

// Re-export common types for convenience
pub use analysis::{MarketAnalysis, MarketSummary, RegionAnalysis, analyze_market, analyze_region};
pub use config::{AnalysisSettings, CoverageSettings, NemPriceConfig, VisualizationSettings};
pub use coverage::{CoverageReport, analyze_coverage};
pub use ingest::{CleanCsvLoader, NemwebLoader, RecordLoader, loader_for};
pub use series::{BuildStats, SeriesBuilder, build_region_series};
pub use statistics::{Dispersion, EventCount, PriceThreshold};
pub use temporal::{PriceRun, SeriesCursor, nearest_at_or_after};
