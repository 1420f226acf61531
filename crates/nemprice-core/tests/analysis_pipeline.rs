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

//! End-to-end pipeline: NEMWEB file -> clean CSV -> series -> analysis.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use nemprice_core::ingest::{read_nemweb, write_clean_csv_file};
use nemprice_core::{
    NemPriceConfig, analyze_coverage, analyze_market, build_region_series, loader_for,
    nearest_at_or_after,
};
use std::fmt::Write as _;
use std::io::Write;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 30)
        .unwrap()
        .and_hms_opt(0, 5, 0)
        .unwrap()
}

/// Two regions over two hours; SA1 goes negative between 00:30 and 00:45
fn nemweb_fixture() -> String {
    let mut text = String::from("C,NEMP.WORLD,PRICES,AEMO,PUBLIC,2025/07/01,04:05:07\n");
    text.push_str("I,DREGION,,3,SETTLEMENTDATE,RUNNO,REGIONID,INTERVENTION,RRP\n");

    for i in 0..24 {
        let timestamp = start() + Duration::minutes(5 * i);
        let date = timestamp.format("%Y/%m/%d %H:%M:%S");
        let nsw = 80.0 + i as f64;
        let sa = if (5..=8).contains(&i) { -25.0 } else { 120.0 + 10.0 * i as f64 };
        writeln!(text, "D,DREGION,,3,\"{date}\",1,NSW1,0,{nsw}").unwrap();
        writeln!(text, "D,DREGION,,3,\"{date}\",1,SA1,0,{sa}").unwrap();
    }

    // Re-published interval: the first copy must win
    writeln!(text, "D,DREGION,,3,\"2025/06/30 00:05:00\",2,NSW1,0,9999").unwrap();
    text.push_str("C,\"END OF REPORT\",53\n");
    text
}

#[test]
fn test_pipeline_from_raw_file() {
    let mut raw = tempfile::NamedTempFile::new().unwrap();
    raw.write_all(nemweb_fixture().as_bytes()).unwrap();

    let records = loader_for(raw.path(), true).load().unwrap();
    assert_eq!(records.len(), 49);

    let (regions, stats) = build_region_series(records);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.regions, 2);
    assert_eq!(regions["NSW1"].first().unwrap().price, 80.0);

    let config = NemPriceConfig::default();
    let market = analyze_market(&regions, &config.analysis);
    assert_eq!(market.region_ids(), vec!["NSW1", "SA1"]);

    let sa = market.region("SA1").unwrap();
    assert_eq!(sa.runs.len(), 1);
    assert_eq!(sa.runs[0].length, 4);
    assert_eq!(sa.runs[0].start, start() + Duration::minutes(25));
    assert_eq!(sa.runs[0].duration(config.analysis.interval()), Duration::minutes(20));
    assert_eq!(sa.event("negative").unwrap().count, 4);
    assert_eq!(sa.event("spike").unwrap().count, 5);

    let nsw = market.region("NSW1").unwrap();
    assert_eq!(nsw.direction_changes, 0);
    assert!(nsw.dispersion.is_ok());
    assert_eq!(nsw.ranking.peak[0].hour, 2);
    assert_eq!(nsw.ranking.off_peak[0].hour, 0);

    assert_eq!(market.summary.total_points, 48);
}

#[test]
fn test_clean_csv_round_trip_preserves_analysis() {
    let parsed = read_nemweb(nemweb_fixture().as_bytes()).unwrap();
    let (regions, _) = build_region_series(parsed.records);

    let clean = tempfile::NamedTempFile::new().unwrap();
    write_clean_csv_file(clean.path(), &regions).unwrap();
    let (reloaded, stats) = build_region_series(loader_for(clean.path(), false).load().unwrap());

    assert_eq!(stats.duplicates, 0);
    assert_eq!(reloaded, regions);
}

#[test]
fn test_coverage_and_snapshot_lookup() {
    let parsed = read_nemweb(nemweb_fixture().as_bytes()).unwrap();
    let (regions, _) = build_region_series(parsed.records);

    let coverage = analyze_coverage(&regions, Duration::minutes(5)).unwrap();
    assert_eq!(coverage.unique_timestamps, 24);
    assert!(coverage.gaps.is_empty());
    assert_eq!(coverage.hourly_counts[0].counts["SA1"], 11);
    assert_eq!(coverage.hourly_counts[1].counts["SA1"], 12);

    let target = start() + Duration::minutes(27);
    let hit = nearest_at_or_after(regions["SA1"].points(), target).unwrap();
    assert_eq!(hit.timestamp, start() + Duration::minutes(30));

    let past_end = start() + Duration::hours(3);
    assert!(nearest_at_or_after(regions["SA1"].points(), past_end).is_err());
}
