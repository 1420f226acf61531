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

//! Error taxonomy for the analytics engine.
//!
//! Every variant is local to a single operation over a single region's
//! series. Callers map an error to a "not available" line and carry on with
//! the remaining metrics and regions.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("division by zero while computing {what}")]
    DivisionByZero { what: &'static str },

    #[error("no point at or after {target}")]
    NotFound { target: NaiveDateTime },

    #[error("series for region {region} is not strictly increasing at index {index}")]
    UnorderedSeries { region: String, index: usize },
}

impl AnalysisError {
    /// Shorthand for the minimum-length check shared by most operations.
    pub fn require(required: usize, actual: usize) -> Result<()> {
        if actual < required {
            Err(Self::InsufficientData { required, actual })
        } else {
            Ok(())
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
