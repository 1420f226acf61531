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

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalysisError, Result};

// ============= Price Data (NEM dispatch intervals) =============

/// One dispatch interval price for a region.
///
/// Timestamps are NEM market time (AEST, no daylight saving), kept naive so
/// the hour component is the market-local hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// End of the dispatch interval (AEMO SETTLEMENTDATE)
    pub timestamp: NaiveDateTime,

    /// Regional reference price ($/MWh). May be negative.
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// A single parsed input row, before deduplication and ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub settlement_date: NaiveDateTime,
    pub region_id: String,
    pub rrp: f64,
}

/// Time-ordered price series for one region.
///
/// `points` is strictly increasing by timestamp. The series builder upholds
/// this; analytics code relies on it and never re-sorts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    region_id: String,
    points: Vec<PricePoint>,
}

/// Region id -> series, iterated in ascending region order
pub type RegionMap = BTreeMap<String, RegionSeries>;

impl RegionSeries {
    /// Build a series, checking the ordering invariant.
    pub fn new(region_id: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let region_id = region_id.into();
        if let Some(index) = first_unordered_index(&points) {
            return Err(AnalysisError::UnorderedSeries {
                region: region_id,
                index,
            });
        }
        Ok(Self { region_id, points })
    }

    /// Build a series from points the caller already sorted and deduplicated.
    pub fn from_sorted(region_id: impl Into<String>, points: Vec<PricePoint>) -> Self {
        debug_assert!(
            first_unordered_index(&points).is_none(),
            "points must be strictly increasing by timestamp"
        );
        Self {
            region_id: region_id.into(),
            points,
        }
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Price projection, order preserved
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// Index of the first point whose timestamp does not exceed its predecessor's
pub fn first_unordered_index(points: &[PricePoint]) -> Option<usize> {
    points
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
        .map(|i| i + 1)
}
