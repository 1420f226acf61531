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

//! Series builder: raw records -> deduplicated, time-ordered series per region.

use chrono::NaiveDateTime;
use nemprice_types::{PricePoint, PriceRecord, RegionMap, RegionSeries};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Counters reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Records accepted into a series
    pub records: usize,
    /// Records dropped because their (settlement date, region) was already seen
    pub duplicates: usize,
    pub regions: usize,
}

/// Accumulates records in any order.
///
/// The first record seen for a `(settlement_date, region_id)` key wins.
#[derive(Debug, Default)]
pub struct SeriesBuilder {
    seen: HashSet<(NaiveDateTime, String)>,
    points: BTreeMap<String, Vec<PricePoint>>,
    duplicates: usize,
}

impl SeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the record was a duplicate and got dropped
    pub fn push(&mut self, record: PriceRecord) -> bool {
        let key = (record.settlement_date, record.region_id);
        if self.seen.contains(&key) {
            self.duplicates += 1;
            return false;
        }

        self.points
            .entry(key.1.clone())
            .or_default()
            .push(PricePoint::new(record.settlement_date, record.rrp));
        self.seen.insert(key);
        true
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = PriceRecord>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn finish(self) -> (RegionMap, BuildStats) {
        let stats = BuildStats {
            records: self.seen.len(),
            duplicates: self.duplicates,
            regions: self.points.len(),
        };

        let regions: RegionMap = self
            .points
            .into_iter()
            .map(|(region_id, mut points)| {
                points.sort_by_key(|p| p.timestamp);
                debug!("Region {}: {} intervals", region_id, points.len());
                let series = RegionSeries::from_sorted(region_id.clone(), points);
                (region_id, series)
            })
            .collect();

        info!(
            "Built {} region series from {} records ({} duplicates dropped)",
            stats.regions, stats.records, stats.duplicates
        );

        (regions, stats)
    }
}

/// One-shot build from a record list
pub fn build_region_series(
    records: impl IntoIterator<Item = PriceRecord>,
) -> (RegionMap, BuildStats) {
    let mut builder = SeriesBuilder::new();
    builder.extend(records);
    builder.finish()
}
