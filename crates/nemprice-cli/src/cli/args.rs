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

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nemprice")]
#[command(author, version, about = "NEM dispatch price analysis CLI")]
#[command(
    long_about = "Analyze 5-minute dispatch prices from AEMO NEMWEB PUBLIC_PRICES files.\n\
    \nConverts raw NEMWEB files into a clean CSV, checks data coverage, computes\n\
    per-region and market-wide statistics and renders a text price timeline.\n\
    \nExamples:\n  \
    nemprice extract --input PUBLIC_PRICES_202506300000.CSV --output prices.csv\n  \
    nemprice coverage --input prices.csv\n  \
    nemprice analyze --input prices.csv --format json\n  \
    nemprice visualize --input prices.csv --region SA1"
)]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Configuration file (defaults apply when omitted)",
        long_help = "TOML file with [analysis], [visualization] and [coverage] sections.\n\
          Missing sections and keys fall back to defaults.\n\
          \nPrint an annotated example with: nemprice example-config"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract dispatch prices from a raw NEMWEB file into a clean CSV
    #[command(
        long_about = "Read the D,DREGION rows of a NEMWEB PUBLIC_PRICES file and write\n\
        SETTLEMENTDATE,REGIONID,RRP rows sorted by region and time.\n\
        \nRows that fail to parse are skipped with a warning.\n\
        \nExamples:\n  \
        nemprice extract --input PUBLIC_PRICES_202506300000.CSV\n  \
        nemprice extract --input raw.CSV --output clean.csv"
    )]
    Extract(ExtractArgs),

    /// Report date range, interval consistency and gaps of a dataset
    #[command(
        long_about = "Check how completely a dataset covers its time range.\n\
        \nLists unique intervals between timestamps, every gap longer than the\n\
        dispatch interval and the record count per hour for each region.\n\
        \nExamples:\n  \
        nemprice coverage --input prices.csv\n  \
        nemprice coverage --input raw.CSV --raw --hours 24"
    )]
    Coverage(CoverageArgs),

    /// Per-region and market-wide price statistics
    #[command(
        long_about = "Compute price statistics, volatility, error metrics, price events,\n\
        intraday patterns, percentiles and negative-price periods per region,\n\
        followed by an inter-regional comparison and market summary.\n\
        \nExamples:\n  \
        nemprice analyze --input prices.csv\n  \
        nemprice analyze --input prices.csv --format json\n  \
        nemprice analyze --input prices.csv --write-final prices_final.csv"
    )]
    Analyze(AnalyzeArgs),

    /// Text price timeline and volatility examples for one region
    #[command(
        long_about = "Render a price band timeline for one region, its largest price\n\
        changes, negative-price periods and a snapshot of all regions at key times.\n\
        \nBands: [-] negative, [L] < $100, [N] < $200, [H] < $300, [S] spike.\n\
        \nExamples:\n  \
        nemprice visualize --input prices.csv\n  \
        nemprice visualize --input prices.csv --region VIC1"
    )]
    Visualize(VisualizeArgs),

    /// Print an annotated example configuration
    ExampleConfig,
}

/// Dataset to load
#[derive(Args)]
pub struct InputArgs {
    /// Price data file
    #[arg(
        long,
        short,
        value_name = "PATH",
        help = "Clean CSV (SETTLEMENTDATE,REGIONID,RRP) or raw NEMWEB file with --raw"
    )]
    pub input: PathBuf,

    /// Input is a raw NEMWEB PUBLIC_PRICES file
    #[arg(long, default_value_t = false, help = "Parse input as a raw NEMWEB file")]
    pub raw: bool,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// Raw NEMWEB PUBLIC_PRICES file
    #[arg(long, short, value_name = "PATH", help = "Raw NEMWEB file to extract")]
    pub input: PathBuf,

    /// Clean CSV destination
    #[arg(
        long,
        short,
        value_name = "PATH",
        default_value = "aemo_prices_clean.csv",
        help = "Where to write the clean CSV"
    )]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct CoverageArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Hours listed in the per-hour record counts (overrides config)
    #[arg(long, value_name = "N", help = "Number of clock hours to list")]
    pub hours: Option<usize>,

    /// Output format: table or json
    #[arg(long, default_value = "table",
          value_parser = ["table", "json"],
          help = "How to display results")]
    pub format: String,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format: table or json
    #[arg(long, default_value = "table",
          value_parser = ["table", "json"],
          help = "How to display results")]
    pub format: String,

    /// Write the deduplicated dataset as clean CSV
    #[arg(
        long,
        value_name = "PATH",
        help = "Save the deduplicated, sorted dataset",
        long_help = "Write the deduplicated dataset (first record per interval and region)\n\
          as SETTLEMENTDATE,REGIONID,RRP sorted by region and time.\n\
          \nExample: --write-final aemo_prices_final.csv"
    )]
    pub write_final: Option<PathBuf>,
}

#[derive(Parser)]
pub struct VisualizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Region to plot (overrides config)
    #[arg(long, value_name = "REGIONID", help = "Region to visualize, e.g. SA1")]
    pub region: Option<String>,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Extract(_) => "extract",
            Self::Coverage(_) => "coverage",
            Self::Analyze(_) => "analyze",
            Self::Visualize(_) => "visualize",
            Self::ExampleConfig => "example-config",
        }
    }
}
