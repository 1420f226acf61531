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

//! Temporal aggregator.
//!
//! Operations over an ordered `(timestamp, price)` sequence: hour-of-day
//! grouping and ranking, maximal runs satisfying a price predicate,
//! nearest-timestamp lookup and largest consecutive moves.
//!
//! Every function expects the points strictly increasing by timestamp, as
//! guaranteed by `RegionSeries`.

use chrono::{Duration, NaiveDateTime, Timelike};
use nemprice_types::PricePoint;
use nemprice_types::error::{AnalysisError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Hour-of-day aggregation
// ============================================================================

/// Hour (0-23) -> mean price. Hours without observations are absent.
pub type HourlyAverages = BTreeMap<u32, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyPrice {
    pub hour: u32,
    pub mean_price: f64,
}

/// Most and least expensive hours of the day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourRanking {
    /// Highest mean first
    pub peak: Vec<HourlyPrice>,
    /// Lowest mean first
    pub off_peak: Vec<HourlyPrice>,
}

/// Mean price per market-local hour, pooled across every day in the series
pub fn group_by_hour_of_day(points: &[PricePoint]) -> HourlyAverages {
    let mut buckets: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for point in points {
        let (sum, count) = buckets.entry(point.timestamp.hour()).or_insert((0.0, 0));
        *sum += point.price;
        *count += 1;
    }

    buckets
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum / count as f64))
        .collect()
}

/// The `k` most expensive and `k` cheapest hours.
///
/// Equal means are ordered by hour number (earlier hour first) in both lists.
pub fn rank_hours(hourly: &HourlyAverages, k: usize) -> HourRanking {
    let mut hours: Vec<HourlyPrice> = hourly
        .iter()
        .map(|(&hour, &mean_price)| HourlyPrice { hour, mean_price })
        .collect();

    hours.sort_by(|a, b| {
        b.mean_price
            .total_cmp(&a.mean_price)
            .then(a.hour.cmp(&b.hour))
    });
    let peak = hours.iter().take(k).copied().collect();

    hours.sort_by(|a, b| {
        a.mean_price
            .total_cmp(&b.mean_price)
            .then(a.hour.cmp(&b.hour))
    });
    let off_peak = hours.into_iter().take(k).collect();

    HourRanking { peak, off_peak }
}

// ============================================================================
// Runs
// ============================================================================

/// Maximal block of consecutive points satisfying a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRun {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub length: usize,
    pub start_index: usize,
}

impl PriceRun {
    fn spanning(points: &[PricePoint], first: usize, last: usize) -> Self {
        Self {
            start: points[first].timestamp,
            end: points[last].timestamp,
            length: last - first + 1,
            start_index: first,
        }
    }

    /// Covered time when each point stands for one dispatch interval
    pub fn duration(&self, interval: Duration) -> Duration {
        i32::try_from(self.length)
            .ok()
            .and_then(|n| interval.checked_mul(n))
            .unwrap_or(Duration::MAX)
    }
}

/// Every maximal run of points whose price satisfies `predicate`.
///
/// Runs may start at the first point or end at the last one.
pub fn find_runs<F>(points: &[PricePoint], predicate: F) -> Vec<PriceRun>
where
    F: Fn(f64) -> bool,
{
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;

    for (index, point) in points.iter().enumerate() {
        match (predicate(point.price), open) {
            (true, None) => open = Some(index),
            (false, Some(first)) => {
                runs.push(PriceRun::spanning(points, first, index - 1));
                open = None;
            }
            (true, Some(_)) | (false, None) => {}
        }
    }

    if let Some(first) = open {
        runs.push(PriceRun::spanning(points, first, points.len() - 1));
    }

    runs
}

// ============================================================================
// Timestamp lookup
// ============================================================================

/// First point with `timestamp >= target`.
pub fn nearest_at_or_after(points: &[PricePoint], target: NaiveDateTime) -> Result<&PricePoint> {
    let index = points.partition_point(|p| p.timestamp < target);
    points.get(index).ok_or(AnalysisError::NotFound { target })
}

/// Forward cursor for many lookups against one series.
///
/// Ascending targets resume from the previous hit. An earlier target falls
/// back to a search from the start, so results always match
/// `nearest_at_or_after`.
#[derive(Debug, Clone)]
pub struct SeriesCursor<'a> {
    points: &'a [PricePoint],
    position: usize,
}

impl<'a> SeriesCursor<'a> {
    pub fn new(points: &'a [PricePoint]) -> Self {
        Self {
            points,
            position: 0,
        }
    }

    pub fn seek(&mut self, target: NaiveDateTime) -> Result<&'a PricePoint> {
        if self.position > 0
            && self
                .points
                .get(self.position - 1)
                .is_some_and(|p| p.timestamp >= target)
        {
            self.position = 0;
        }

        let remaining = self.points.get(self.position..).unwrap_or_default();
        self.position += remaining.partition_point(|p| p.timestamp < target);
        self.points
            .get(self.position)
            .ok_or(AnalysisError::NotFound { target })
    }
}

// ============================================================================
// Consecutive moves
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceChange {
    /// Timestamp of the later interval
    pub timestamp: NaiveDateTime,
    pub previous: f64,
    pub price: f64,
    pub change: f64,
}

/// The `k` interval-to-interval moves with the largest magnitude.
///
/// Equal magnitudes keep chronological order.
pub fn largest_changes(points: &[PricePoint], k: usize) -> Vec<PriceChange> {
    let mut changes: Vec<PriceChange> = points
        .windows(2)
        .map(|w| PriceChange {
            timestamp: w[1].timestamp,
            previous: w[0].price,
            price: w[1].price,
            change: w[1].price - w[0].price,
        })
        .collect();

    changes.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs()));
    changes.truncate(k);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(0, 5, 0)
            .unwrap()
    }

    /// 5-minute points starting at 00:05
    fn series(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint::new(base() + Duration::minutes(5 * i as i64), price))
            .collect()
    }

    fn hourly_points(day: NaiveDate, pattern: &[f64]) -> Vec<PricePoint> {
        pattern
            .iter()
            .enumerate()
            .map(|(hour, &price)| {
                PricePoint::new(day.and_hms_opt(hour as u32, 30, 0).unwrap(), price)
            })
            .collect()
    }

    #[test]
    fn test_group_by_hour_averages_within_hour() {
        let points = series(&[10.0, 20.0, 30.0]);
        let hourly = group_by_hour_of_day(&points);
        assert_eq!(hourly.len(), 1);
        assert!((hourly[&0] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_hour_two_identical_days_match_one_day() {
        let pattern: Vec<f64> = (0..24).map(|h| 50.0 + f64::from(h) * 3.25).collect();
        let day1 = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();

        let one_day = group_by_hour_of_day(&hourly_points(day1, &pattern));
        let mut both = hourly_points(day1, &pattern);
        both.extend(hourly_points(day2, &pattern));
        let two_days = group_by_hour_of_day(&both);

        assert_eq!(one_day.len(), 24);
        assert_eq!(one_day.keys().collect::<Vec<_>>(), two_days.keys().collect::<Vec<_>>());
        for (hour, mean) in &one_day {
            assert!((two_days[hour] - mean).abs() < 1e-9, "hour {hour}");
        }
    }

    #[test]
    fn test_group_by_hour_absent_hours_not_zero_filled() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let points = vec![
            PricePoint::new(day.and_hms_opt(3, 0, 0).unwrap(), 40.0),
            PricePoint::new(day.and_hms_opt(17, 0, 0).unwrap(), 140.0),
        ];
        let hourly = group_by_hour_of_day(&points);
        assert_eq!(hourly.keys().copied().collect::<Vec<_>>(), vec![3, 17]);
        assert!(!hourly.contains_key(&4));
    }

    #[test]
    fn test_rank_hours_orders_peak_and_off_peak() {
        let hourly: HourlyAverages =
            [(0, 40.0), (7, 180.0), (12, 20.0), (17, 250.0), (18, 210.0), (3, 35.0)]
                .into_iter()
                .collect();

        let ranking = rank_hours(&hourly, 3);
        let peak: Vec<u32> = ranking.peak.iter().map(|h| h.hour).collect();
        let off_peak: Vec<u32> = ranking.off_peak.iter().map(|h| h.hour).collect();

        assert_eq!(peak, vec![17, 18, 7]);
        assert_eq!(off_peak, vec![12, 3, 0]);
    }

    #[test]
    fn test_rank_hours_ties_break_by_hour() {
        let hourly: HourlyAverages = [(9, 100.0), (2, 100.0), (5, 100.0), (20, 50.0)]
            .into_iter()
            .collect();

        let ranking = rank_hours(&hourly, 2);
        assert_eq!(
            ranking.peak.iter().map(|h| h.hour).collect::<Vec<_>>(),
            vec![2, 5]
        );
        assert_eq!(
            ranking.off_peak.iter().map(|h| h.hour).collect::<Vec<_>>(),
            vec![20, 2]
        );
    }

    #[test]
    fn test_rank_hours_k_larger_than_available() {
        let hourly: HourlyAverages = [(1, 10.0)].into_iter().collect();
        let ranking = rank_hours(&hourly, 3);
        assert_eq!(ranking.peak.len(), 1);
        assert_eq!(ranking.off_peak.len(), 1);
    }

    #[test]
    fn test_find_runs_negative_prices() {
        let points = series(&[-5.0, -3.0, 2.0, -1.0, -1.0, 4.0]);
        let runs = find_runs(&points, |p| p < 0.0);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].start, points[0].timestamp);
        assert_eq!(runs[0].end, points[1].timestamp);
        assert_eq!(runs[0].length, 2);
        assert_eq!(runs[0].start_index, 0);
        assert_eq!(runs[1].start, points[3].timestamp);
        assert_eq!(runs[1].end, points[4].timestamp);
        assert_eq!(runs[1].length, 2);
    }

    #[test]
    fn test_find_runs_open_at_end_and_single_point() {
        let points = series(&[5.0, -1.0, 5.0, -2.0, -3.0]);
        let runs = find_runs(&points, |p| p < 0.0);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].length, 1);
        assert_eq!(runs[0].start, runs[0].end);
        assert_eq!(runs[1].start_index, 3);
        assert_eq!(runs[1].end, points[4].timestamp);
    }

    #[test]
    fn test_find_runs_whole_series_and_none() {
        let all_negative = series(&[-1.0, -2.0, -3.0]);
        let runs = find_runs(&all_negative, |p| p < 0.0);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].length, 3);

        assert!(find_runs(&series(&[1.0, 2.0]), |p| p < 0.0).is_empty());
        assert!(find_runs(&[], |p| p < 0.0).is_empty());
    }

    #[test]
    fn test_run_duration() {
        let points = series(&[-1.0, -1.0, -1.0]);
        let run = find_runs(&points, |p| p < 0.0)[0];
        assert_eq!(run.duration(Duration::minutes(5)), Duration::minutes(15));
    }

    #[test]
    fn test_nearest_exact_match_returns_entry() {
        let points = series(&[10.0, 20.0, 30.0]);
        let hit = nearest_at_or_after(&points, points[1].timestamp).unwrap();
        assert_eq!(hit.price, 20.0);
    }

    #[test]
    fn test_nearest_between_entries_returns_next() {
        let points = series(&[10.0, 20.0, 30.0]);
        let target = points[0].timestamp + Duration::minutes(2);
        assert_eq!(nearest_at_or_after(&points, target).unwrap().price, 20.0);

        let before_start = points[0].timestamp - Duration::hours(1);
        assert_eq!(nearest_at_or_after(&points, before_start).unwrap().price, 10.0);
    }

    #[test]
    fn test_nearest_after_last_is_not_found() {
        let points = series(&[10.0, 20.0]);
        let target = points[1].timestamp + Duration::minutes(1);
        assert_eq!(
            nearest_at_or_after(&points, target),
            Err(AnalysisError::NotFound { target })
        );
        assert!(nearest_at_or_after(&[], target).is_err());
    }

    #[test]
    fn test_cursor_matches_binary_search() {
        let points = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut cursor = SeriesCursor::new(&points);

        let targets = [
            base() - Duration::minutes(1),
            base() + Duration::minutes(7),
            base() + Duration::minutes(10),
            base() + Duration::minutes(24),
            // Going backwards still resolves correctly
            base() + Duration::minutes(3),
        ];
        for target in targets {
            assert_eq!(
                cursor.seek(target).map(|p| p.price),
                nearest_at_or_after(&points, target).map(|p| p.price)
            );
        }

        assert!(cursor.seek(base() + Duration::hours(2)).is_err());
    }

    #[test]
    fn test_largest_changes() {
        let points = series(&[100.0, 90.0, 400.0, 380.0, -20.0]);
        let changes = largest_changes(&points, 2);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change, -400.0);
        assert_eq!(changes[0].previous, 380.0);
        assert_eq!(changes[0].timestamp, points[4].timestamp);
        assert_eq!(changes[1].change, 310.0);
    }

    #[test]
    fn test_largest_changes_ties_keep_order() {
        let points = series(&[0.0, 10.0, 0.0, 10.0]);
        let changes = largest_changes(&points, 5);
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes.iter().map(|c| c.change).collect::<Vec<_>>(),
            vec![10.0, -10.0, 10.0]
        );
    }
}
