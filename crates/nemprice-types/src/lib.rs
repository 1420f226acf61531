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

//! Shared data model for NEMPrice: dispatch price points, per-region series
//! and the error taxonomy of the analytics engine.

pub mod error;
pub mod price;

// Re-export common types for convenience
pub use error::AnalysisError;
pub use price::{PricePoint, PriceRecord, RegionMap, RegionSeries};
