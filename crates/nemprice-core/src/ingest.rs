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

//! Record ingestion from AEMO NEMWEB `PUBLIC_PRICES` files and from the
//! cleaned flat CSV format (`SETTLEMENTDATE,REGIONID,RRP`).

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use nemprice_types::{PriceRecord, RegionMap};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Date format used by NEMWEB and by the clean CSV writer
pub const NEMWEB_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Clean CSV column names
pub const CLEAN_CSV_HEADER: [&str; 3] = ["SETTLEMENTDATE", "REGIONID", "RRP"];

/// Trait for loading price records from various sources
pub trait RecordLoader {
    fn load(&self) -> Result<Vec<PriceRecord>>;
}

/// Pick the loader for a file: raw NEMWEB when `raw`, clean CSV otherwise
pub fn loader_for(path: impl Into<PathBuf>, raw: bool) -> Box<dyn RecordLoader> {
    let path = path.into();
    if raw {
        Box::new(NemwebLoader::new(path))
    } else {
        Box::new(CleanCsvLoader::new(path))
    }
}

/// Accepts `YYYY/MM/DD HH:MM:SS` and `YYYY-MM-DD HH:MM:SS`
pub fn parse_settlement_date(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim().trim_matches('"');
    NaiveDateTime::parse_from_str(value, NEMWEB_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, ISO_DATE_FORMAT))
        .with_context(|| format!("Invalid settlement date: {value}"))
}

// ============================================================================
// NEMWEB raw files
// ============================================================================

/// Loader for raw `PUBLIC_PRICES_*.CSV` files
#[derive(Debug, Clone)]
pub struct NemwebLoader {
    path: PathBuf,
}

/// Price rows of a NEMWEB file plus the number of rows that failed to parse
#[derive(Debug, Clone, Default)]
pub struct NemwebRecords {
    pub records: Vec<PriceRecord>,
    pub skipped: usize,
}

impl NemwebLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordLoader for NemwebLoader {
    fn load(&self) -> Result<Vec<PriceRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open NEMWEB file {}", self.path.display()))?;
        let parsed = read_nemweb(file)
            .with_context(|| format!("Failed to read NEMWEB file {}", self.path.display()))?;

        info!(
            "Loaded {} price rows from {} ({} skipped)",
            parsed.records.len(),
            self.path.display(),
            parsed.skipped
        );
        Ok(parsed.records)
    }
}

/// Read the `D,DREGION` rows of a headerless, ragged NEMWEB CSV.
///
/// Rows that fail to parse are skipped with a warning. Framing and I/O
/// errors abort.
pub fn read_nemweb<R: Read>(reader: R) -> Result<NemwebRecords> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut parsed = NemwebRecords::default();
    for (index, row) in reader.records().enumerate() {
        let row = row.context("Failed to read CSV record")?;
        if row.get(0) != Some("D") || row.get(1) != Some("DREGION") {
            continue;
        }

        match parse_dregion_row(&row) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!("Skipping DREGION row {}: {:#}", index + 1, e);
                parsed.skipped += 1;
            }
        }
    }

    debug!(
        "NEMWEB parse: {} records, {} skipped",
        parsed.records.len(),
        parsed.skipped
    );
    Ok(parsed)
}

fn parse_dregion_row(row: &StringRecord) -> Result<PriceRecord> {
    let field = |index: usize| {
        row.get(index)
            .with_context(|| format!("missing field {index}"))
    };

    let settlement_date = parse_settlement_date(field(4)?)?;
    let region_id = field(6)?.trim();
    if region_id.is_empty() {
        bail!("empty region id");
    }
    let rrp_text = field(8)?.trim();
    let rrp: f64 = rrp_text
        .parse()
        .with_context(|| format!("invalid RRP: {rrp_text}"))?;

    Ok(PriceRecord {
        settlement_date,
        region_id: region_id.to_owned(),
        rrp,
    })
}

// ============================================================================
// Clean flat CSV
// ============================================================================

#[derive(Debug, Deserialize)]
struct CleanRow {
    #[serde(rename = "SETTLEMENTDATE")]
    settlement_date: String,
    #[serde(rename = "REGIONID")]
    region_id: String,
    #[serde(rename = "RRP")]
    rrp: f64,
}

/// Loader for `SETTLEMENTDATE,REGIONID,RRP` files
#[derive(Debug, Clone)]
pub struct CleanCsvLoader {
    path: PathBuf,
}

impl CleanCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordLoader for CleanCsvLoader {
    fn load(&self) -> Result<Vec<PriceRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open CSV file {}", self.path.display()))?;
        let records = read_clean_csv(file)
            .with_context(|| format!("Failed to read CSV file {}", self.path.display()))?;

        info!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

/// Read a clean CSV. Extra columns are ignored; any malformed row aborts.
pub fn read_clean_csv<R: Read>(reader: R) -> Result<Vec<PriceRecord>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<CleanRow>().enumerate() {
        // Line 1 is the header
        let line = index + 2;
        let row = row.with_context(|| format!("Malformed row at line {line}"))?;
        let settlement_date = parse_settlement_date(&row.settlement_date)
            .with_context(|| format!("Malformed row at line {line}"))?;

        records.push(PriceRecord {
            settlement_date,
            region_id: row.region_id,
            rrp: row.rrp,
        });
    }

    Ok(records)
}

/// Write regions in ascending order, points ascending. Returns rows written.
pub fn write_clean_csv<W: Write>(writer: W, regions: &RegionMap) -> Result<usize> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer
        .write_record(CLEAN_CSV_HEADER)
        .context("Failed to write CSV header")?;

    let mut rows = 0;
    for (region_id, series) in regions {
        for point in series.points() {
            writer
                .write_record([
                    point.timestamp.format(NEMWEB_DATE_FORMAT).to_string(),
                    region_id.clone(),
                    point.price.to_string(),
                ])
                .context("Failed to write CSV record")?;
            rows += 1;
        }
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(rows)
}

pub fn write_clean_csv_file(path: &Path, regions: &RegionMap) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let rows = write_clean_csv(file, regions)?;
    info!("Wrote {} records to {}", rows, path.display());
    Ok(rows)
}
