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

//! Coverage analyzer: date range, interval consistency, gaps and per-hour
//! record counts across every region of a dataset.

use chrono::{Duration, NaiveDateTime, Timelike};
use nemprice_types::RegionMap;
use nemprice_types::error::{AnalysisError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Interval between consecutive unique timestamps longer than expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub minutes: i64,
}

/// Record count per region for one clock hour
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    /// Start of the clock hour
    pub hour: NaiveDateTime,
    /// Every region of the dataset, zero when it has no records in this hour
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub span_minutes: i64,
    pub unique_timestamps: usize,
    pub regions: Vec<String>,
    /// Distinct gaps between consecutive unique timestamps, ascending
    pub interval_minutes: Vec<i64>,
    pub expected_interval_minutes: i64,
    pub gaps: Vec<Gap>,
    pub hourly_counts: Vec<HourlyCount>,
}

impl CoverageReport {
    pub fn span_hours(&self) -> f64 {
        self.span_minutes as f64 / 60.0
    }

    /// Records each region should have per clock hour
    #[expect(clippy::integer_division)]
    pub fn expected_per_hour(&self) -> i64 {
        if self.expected_interval_minutes > 0 {
            60 / self.expected_interval_minutes
        } else {
            0
        }
    }
}

pub fn analyze_coverage(regions: &RegionMap, interval: Duration) -> Result<CoverageReport> {
    let timestamps: BTreeSet<NaiveDateTime> = regions
        .values()
        .flat_map(|series| series.points().iter().map(|p| p.timestamp))
        .collect();

    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            actual: 0,
        });
    };

    let expected = interval.num_minutes();
    let ordered: Vec<NaiveDateTime> = timestamps.iter().copied().collect();

    let mut distinct = BTreeSet::new();
    let mut gaps = Vec::new();
    for pair in ordered.windows(2) {
        let minutes = (pair[1] - pair[0]).num_minutes();
        distinct.insert(minutes);
        if minutes > expected {
            gaps.push(Gap {
                from: pair[0],
                to: pair[1],
                minutes,
            });
        }
    }

    if !gaps.is_empty() {
        warn!("{} gaps longer than {} minutes", gaps.len(), expected);
    }

    let mut per_hour: BTreeMap<NaiveDateTime, BTreeMap<String, usize>> = BTreeMap::new();
    for (region_id, series) in regions {
        for point in series.points() {
            let hour = truncate_to_hour(point.timestamp);
            let counts = per_hour
                .entry(hour)
                .or_insert_with(|| regions.keys().map(|r| (r.clone(), 0)).collect());
            *counts.entry(region_id.clone()).or_default() += 1;
        }
    }

    let report = CoverageReport {
        first,
        last,
        span_minutes: (last - first).num_minutes(),
        unique_timestamps: ordered.len(),
        regions: regions.keys().cloned().collect(),
        interval_minutes: distinct.into_iter().collect(),
        expected_interval_minutes: expected,
        gaps,
        hourly_counts: per_hour
            .into_iter()
            .map(|(hour, counts)| HourlyCount { hour, counts })
            .collect(),
    };

    debug!(
        "Coverage: {} unique timestamps over {:.1} hours",
        report.unique_timestamps,
        report.span_hours()
    );
    Ok(report)
}

fn truncate_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .date()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nemprice_types::{PricePoint, RegionSeries};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn region(id: &str, times: &[(u32, u32)]) -> (String, RegionSeries) {
        let points = times
            .iter()
            .map(|&(h, m)| PricePoint::new(at(h, m), 50.0))
            .collect();
        (id.to_owned(), RegionSeries::new(id, points).unwrap())
    }

    #[test]
    fn test_empty_dataset_is_insufficient() {
        let err = analyze_coverage(&RegionMap::new(), Duration::minutes(5)).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_contiguous_data_has_no_gaps() {
        let regions: RegionMap = [
            region("NSW1", &[(0, 5), (0, 10), (0, 15)]),
            region("SA1", &[(0, 5), (0, 10), (0, 15)]),
        ]
        .into_iter()
        .collect();

        let report = analyze_coverage(&regions, Duration::minutes(5)).unwrap();
        assert_eq!(report.first, at(0, 5));
        assert_eq!(report.last, at(0, 15));
        assert_eq!(report.unique_timestamps, 3);
        assert_eq!(report.span_minutes, 10);
        assert_eq!(report.interval_minutes, vec![5]);
        assert!(report.gaps.is_empty());
        assert_eq!(report.regions, vec!["NSW1", "SA1"]);
        assert_eq!(report.expected_per_hour(), 12);
    }

    #[test]
    fn test_gaps_are_reported_with_length() {
        let regions: RegionMap = [region("VIC1", &[(0, 5), (0, 10), (0, 40), (0, 45)])]
            .into_iter()
            .collect();

        let report = analyze_coverage(&regions, Duration::minutes(5)).unwrap();
        assert_eq!(report.interval_minutes, vec![5, 30]);
        assert_eq!(
            report.gaps,
            vec![Gap {
                from: at(0, 10),
                to: at(0, 40),
                minutes: 30
            }]
        );
    }

    #[test]
    fn test_hourly_counts_include_missing_regions() {
        let regions: RegionMap = [
            region("NSW1", &[(0, 5), (0, 10), (1, 0)]),
            region("QLD1", &[(0, 5)]),
        ]
        .into_iter()
        .collect();

        let report = analyze_coverage(&regions, Duration::minutes(5)).unwrap();
        assert_eq!(report.hourly_counts.len(), 2);

        let first_hour = &report.hourly_counts[0];
        assert_eq!(first_hour.hour, at(0, 0));
        assert_eq!(first_hour.counts["NSW1"], 2);
        assert_eq!(first_hour.counts["QLD1"], 1);

        let second_hour = &report.hourly_counts[1];
        assert_eq!(second_hour.counts["NSW1"], 1);
        assert_eq!(second_hour.counts["QLD1"], 0);
    }

    #[test]
    fn test_single_timestamp() {
        let regions: RegionMap = [region("TAS1", &[(3, 0)])].into_iter().collect();
        let report = analyze_coverage(&regions, Duration::minutes(5)).unwrap();
        assert_eq!(report.span_minutes, 0);
        assert!(report.interval_minutes.is_empty());
        assert!((report.span_hours()).abs() < f64::EPSILON);
    }
}
