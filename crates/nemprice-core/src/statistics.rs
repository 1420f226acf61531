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

//! Statistics engine.
//!
//! Pure functions over a price sequence projected from a region series.
//! None of them assume the prices are sorted or positive. Where a minimum
//! length is needed the behavior is fixed per operation:
//!
//! - `dispersion`, `mean`, `median` and `percentile` fail with
//!   `InsufficientData` on an empty sequence; `sample_stdev` needs two
//!   prices, and inside `Dispersion` only the stdev and CV fields carry
//!   that error
//! - `mean_absolute_error`, `mean_absolute_percentage_error` and
//!   `direction_changes` fall back to `0`
//! - `direction_change_frequency` returns `None`

use nemprice_types::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Dispersion
// ============================================================================

/// Location and spread of a price sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispersion {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n-1 denominator), undefined below two prices
    pub stdev: Result<f64>,
    /// `stdev / mean * 100`, undefined without a stdev or when the mean is zero
    pub coefficient_of_variation: Result<f64>,
}

impl Dispersion {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Min, max, mean, median, sample stdev and coefficient of variation.
///
/// Fails only on an empty sequence. A single price still yields its
/// location; the stdev and CV fields then hold `InsufficientData`.
pub fn dispersion(prices: &[f64]) -> Result<Dispersion> {
    AnalysisError::require(1, prices.len())?;

    let sorted = sorted_copy(prices);
    let mean = mean(prices)?;
    let stdev = sample_stdev(prices);
    let coefficient_of_variation = stdev
        .clone()
        .and_then(|stdev| coefficient_of_variation(stdev, mean));

    Ok(Dispersion {
        count: prices.len(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        median: median_of_sorted(&sorted),
        stdev,
        coefficient_of_variation,
    })
}

pub fn mean(prices: &[f64]) -> Result<f64> {
    AnalysisError::require(1, prices.len())?;
    Ok(prices.iter().sum::<f64>() / prices.len() as f64)
}

pub fn median(prices: &[f64]) -> Result<f64> {
    AnalysisError::require(1, prices.len())?;
    Ok(median_of_sorted(&sorted_copy(prices)))
}

pub fn sample_stdev(prices: &[f64]) -> Result<f64> {
    AnalysisError::require(2, prices.len())?;
    let mean = mean(prices)?;
    let sum_sq: f64 = prices.iter().map(|p| (p - mean).powi(2)).sum();
    Ok((sum_sq / (prices.len() - 1) as f64).sqrt())
}

pub fn coefficient_of_variation(stdev: f64, mean: f64) -> Result<f64> {
    if mean == 0.0 {
        return Err(AnalysisError::DivisionByZero {
            what: "coefficient of variation",
        });
    }
    Ok(stdev / mean * 100.0)
}

fn sorted_copy(prices: &[f64]) -> Vec<f64> {
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[expect(clippy::integer_division)]
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// ============================================================================
// Consecutive-difference metrics
// ============================================================================

/// Mean of `|p[i] - p[i-1]|`. Zero for fewer than two prices.
pub fn mean_absolute_error(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let total: f64 = prices.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (prices.len() - 1) as f64
}

/// Mean of `|(p[i] - p[i-1]) / p[i-1]| * 100`.
///
/// Terms whose previous price is exactly zero are skipped. Zero when there
/// is no usable term.
pub fn mean_absolute_percentage_error(prices: &[f64]) -> f64 {
    let (total, terms) = prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .fold((0.0, 0_usize), |(total, terms), w| {
            (total + ((w[1] - w[0]) / w[0]).abs() * 100.0, terms + 1)
        });

    if terms == 0 {
        0.0
    } else {
        total / terms as f64
    }
}

/// Number of strict reversals between consecutive moves.
///
/// A flat move (zero difference) neither continues nor breaks a trend.
pub fn direction_changes(prices: &[f64]) -> usize {
    prices
        .windows(3)
        .filter(|w| (w[1] - w[0]) * (w[2] - w[1]) < 0.0)
        .count()
}

/// Direction changes as a percentage of the `n - 2` possible reversal points.
pub fn direction_change_frequency(prices: &[f64]) -> Option<f64> {
    if prices.len() < 3 {
        return None;
    }
    Some(direction_changes(prices) as f64 / (prices.len() - 2) as f64 * 100.0)
}

// ============================================================================
// Percentiles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

/// Nearest-rank percentile: element `floor(n * q / 100)` of the sorted
/// prices, clamped to the last element. Not interpolated.
pub fn percentile(prices: &[f64], q: f64) -> Result<f64> {
    AnalysisError::require(1, prices.len())?;
    Ok(nearest_rank(&sorted_copy(prices), q))
}

/// Several nearest-rank percentiles from a single sort
pub fn percentiles(prices: &[f64], qs: &[f64]) -> Result<Vec<PercentileValue>> {
    AnalysisError::require(1, prices.len())?;
    let sorted = sorted_copy(prices);
    Ok(qs
        .iter()
        .map(|&q| PercentileValue {
            percentile: q,
            value: nearest_rank(&sorted, q),
        })
        .collect())
}

fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    // Float to usize casts saturate, so q < 0 lands on index 0.
    let index = (sorted.len() as f64 * q / 100.0).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

// ============================================================================
// Threshold events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdDirection {
    /// price > limit
    Above,
    /// price < limit
    Below,
}

/// Named price band used for event counting (spike, negative, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceThreshold {
    pub name: String,
    pub direction: ThresholdDirection,
    pub limit: f64,
}

impl PriceThreshold {
    pub fn above(name: &str, limit: f64) -> Self {
        Self {
            name: name.to_owned(),
            direction: ThresholdDirection::Above,
            limit,
        }
    }

    pub fn below(name: &str, limit: f64) -> Self {
        Self {
            name: name.to_owned(),
            direction: ThresholdDirection::Below,
            limit,
        }
    }

    pub fn matches(&self, price: f64) -> bool {
        match self.direction {
            ThresholdDirection::Above => price > self.limit,
            ThresholdDirection::Below => price < self.limit,
        }
    }

    /// spike > 300, high > 200, negative < 0, low < 100 ($/MWh)
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::above("spike", 300.0),
            Self::above("high", 200.0),
            Self::below("negative", 0.0),
            Self::below("low", 100.0),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCount {
    pub threshold: PriceThreshold,
    pub count: usize,
    /// `count / n`, zero for an empty sequence
    pub fraction: f64,
    /// Highest matching price for `Above`, lowest for `Below`
    pub extreme: Option<f64>,
}

impl EventCount {
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

/// Count prices matching each threshold. Thresholds overlap freely; each one
/// is evaluated against the whole sequence.
pub fn event_counts(prices: &[f64], thresholds: &[PriceThreshold]) -> Vec<EventCount> {
    thresholds
        .iter()
        .map(|threshold| {
            let matching = prices.iter().copied().filter(|&p| threshold.matches(p));
            let (count, extreme) = match threshold.direction {
                ThresholdDirection::Above => {
                    matching.fold((0, None), |(c, e): (usize, Option<f64>), p| {
                        (c + 1, Some(e.map_or(p, |e| e.max(p))))
                    })
                }
                ThresholdDirection::Below => {
                    matching.fold((0, None), |(c, e): (usize, Option<f64>), p| {
                        (c + 1, Some(e.map_or(p, |e| e.min(p))))
                    })
                }
            };

            let fraction = if prices.is_empty() {
                0.0
            } else {
                count as f64 / prices.len() as f64
            };

            EventCount {
                threshold: threshold.clone(),
                count,
                fraction,
                extreme,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sample_prices() -> Vec<f64> {
        vec![85.2, 92.1, -15.0, 310.5, 120.0, 0.0, 88.8, 240.0, 95.5]
    }

    #[test]
    fn test_dispersion_bounds_hold() {
        let prices = sample_prices();
        let d = dispersion(&prices).unwrap();

        assert!(d.min <= d.median && d.median <= d.max);
        assert!(d.min <= d.mean && d.mean <= d.max);
        assert_eq!(d.count, prices.len());
        assert_eq!(d.min, -15.0);
        assert_eq!(d.max, 310.5);
        assert_eq!(d.median, 92.1);
    }

    #[test]
    fn test_dispersion_values() {
        let d = dispersion(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((d.mean - 5.0).abs() < EPS);
        assert!((d.median - 4.5).abs() < EPS);
        // Sample variance = 32 / 7
        let stdev = d.stdev.clone().unwrap();
        assert!((stdev - (32.0_f64 / 7.0).sqrt()).abs() < EPS);
        assert!((d.range() - 7.0).abs() < EPS);
        let cv = d.coefficient_of_variation.clone().unwrap();
        assert!((cv - stdev / 5.0 * 100.0).abs() < EPS);
    }

    #[test]
    fn test_dispersion_single_price_keeps_location() {
        let d = dispersion(&[42.0]).unwrap();

        assert_eq!(d.count, 1);
        assert_eq!((d.min, d.max, d.mean, d.median), (42.0, 42.0, 42.0, 42.0));
        assert!(d.min <= d.median && d.median <= d.max);
        assert!(d.min <= d.mean && d.mean <= d.max);
        assert_eq!(d.range(), 0.0);

        let too_short = AnalysisError::InsufficientData {
            required: 2,
            actual: 1,
        };
        assert_eq!(d.stdev, Err(too_short.clone()));
        assert_eq!(d.coefficient_of_variation, Err(too_short));
    }

    #[test]
    fn test_dispersion_empty() {
        assert_eq!(
            dispersion(&[]),
            Err(AnalysisError::InsufficientData {
                required: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean() {
        let d = dispersion(&[-10.0, 10.0]).unwrap();
        assert_eq!(d.mean, 0.0);
        assert!(matches!(
            d.coefficient_of_variation,
            Err(AnalysisError::DivisionByZero { .. })
        ));
        // The rest of the dispersion stays usable
        assert!((d.stdev.unwrap() - 200.0_f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_every_price_within_dispersion_bounds() {
        let prices = sample_prices();
        let d = dispersion(&prices).unwrap();
        assert!(prices.iter().all(|&p| d.min <= p && p <= d.max));
    }

    #[test]
    fn test_mean_absolute_error() {
        assert_eq!(mean_absolute_error(&[10.0, 10.0, 10.0]), 0.0);
        assert_eq!(mean_absolute_error(&[10.0, 20.0]), 10.0);
        assert!((mean_absolute_error(&[10.0, 20.0, 5.0]) - 12.5).abs() < EPS);
    }

    #[test]
    fn test_mean_absolute_error_short_series() {
        assert_eq!(mean_absolute_error(&[]), 0.0);
        assert_eq!(mean_absolute_error(&[99.0]), 0.0);
    }

    #[test]
    fn test_mape_skips_zero_denominators() {
        // Terms: 0 -> 50 skipped, 50 -> 100 = 100%, 100 -> 50 = 50%
        let mape = mean_absolute_percentage_error(&[0.0, 50.0, 100.0, 50.0]);
        assert!((mape - 75.0).abs() < EPS);
    }

    #[test]
    fn test_mape_fallbacks() {
        assert_eq!(mean_absolute_percentage_error(&[50.0]), 0.0);
        assert_eq!(mean_absolute_percentage_error(&[0.0, 10.0]), 0.0);
        assert_eq!(mean_absolute_percentage_error(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_mape_negative_base_uses_absolute_value() {
        // (-50 - -100) / -100 = -0.5 -> 50%
        let mape = mean_absolute_percentage_error(&[-100.0, -50.0]);
        assert!((mape - 50.0).abs() < EPS);
    }

    #[test]
    fn test_direction_changes_constant_and_monotonic() {
        assert_eq!(direction_changes(&[5.0, 5.0, 5.0, 5.0]), 0);
        assert_eq!(direction_changes(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0);
        assert_eq!(direction_changes(&[5.0, 4.0, 3.0, 2.0]), 0);
    }

    #[test]
    fn test_direction_changes_alternating() {
        assert_eq!(direction_changes(&[1.0, 2.0, 1.0, 2.0, 1.0]), 3);
    }

    #[test]
    fn test_direction_changes_flat_step_is_not_a_change() {
        // up, flat, down: neither pair has a strictly negative product
        assert_eq!(direction_changes(&[1.0, 2.0, 2.0, 1.0]), 0);
    }

    #[test]
    fn test_direction_changes_short_series() {
        assert_eq!(direction_changes(&[]), 0);
        assert_eq!(direction_changes(&[1.0, 2.0]), 0);
    }

    #[test]
    fn test_direction_change_frequency() {
        let freq = direction_change_frequency(&[1.0, 2.0, 1.0, 2.0, 1.0]).unwrap();
        assert!((freq - 100.0).abs() < EPS);
        assert_eq!(direction_change_frequency(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_percentile_nearest_rank_median() {
        let prices: Vec<f64> = (1..=10).map(f64::from).collect();
        // floor(10 * 50 / 100) = index 5 -> 6, not the interpolated 5.5
        assert_eq!(percentile(&prices, 50.0).unwrap(), 6.0);
        assert_eq!(percentile(&prices, 10.0).unwrap(), 2.0);
        assert_eq!(percentile(&prices, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_percentile_clamps_at_hundred() {
        let prices = vec![3.0, 1.0, 2.0];
        assert_eq!(percentile(&prices, 100.0).unwrap(), 3.0);
        assert_eq!(percentile(&prices, 99.0).unwrap(), 3.0);
    }

    #[test]
    fn test_percentile_ignores_input_order() {
        let prices = vec![10.0, -5.0, 7.0, 3.0];
        assert_eq!(percentile(&prices, 25.0).unwrap(), 3.0);
    }

    #[test]
    fn test_percentile_empty() {
        assert!(matches!(
            percentile(&[], 50.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_percentiles_match_single_lookups() {
        let prices = sample_prices();
        let qs = [10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];
        let table = percentiles(&prices, &qs).unwrap();
        assert_eq!(table.len(), qs.len());
        for row in table {
            assert_eq!(row.value, percentile(&prices, row.percentile).unwrap());
        }
    }

    #[test]
    fn test_event_counts_defaults() {
        let prices = sample_prices();
        let counts = event_counts(&prices, &PriceThreshold::defaults());

        let by_name = |name: &str| counts.iter().find(|c| c.threshold.name == name).unwrap();

        assert_eq!(by_name("spike").count, 1);
        assert_eq!(by_name("spike").extreme, Some(310.5));
        assert_eq!(by_name("high").count, 2);
        assert_eq!(by_name("negative").count, 1);
        assert_eq!(by_name("negative").extreme, Some(-15.0));
        // -15, 0, 85.2, 88.8, 92.1, 95.5
        assert_eq!(by_name("low").count, 6);
        assert!((by_name("low").fraction - 6.0 / 9.0).abs() < EPS);
    }

    #[test]
    fn test_event_counts_strict_inequalities() {
        let thresholds = vec![PriceThreshold::above("spike", 300.0)];
        let counts = event_counts(&[300.0, 300.01], &thresholds);
        assert_eq!(counts[0].count, 1);
        assert!((counts[0].percent() - 50.0).abs() < EPS);
    }

    #[test]
    fn test_event_counts_empty_series() {
        let counts = event_counts(&[], &PriceThreshold::defaults());
        assert!(counts.iter().all(|c| c.count == 0 && c.fraction == 0.0));
        assert!(counts.iter().all(|c| c.extreme.is_none()));
    }
}
