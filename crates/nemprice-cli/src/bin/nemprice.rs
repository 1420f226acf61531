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

//! CLI entry point for NEMPrice

use anyhow::{Context, Result};
use clap::Parser;
use nemprice_cli::cli::{
    AnalyzeArgs, Cli, Commands, CoverageArgs, ExtractArgs, InputArgs, JsonFormatter,
    TableFormatter, TimelineRenderer, VisualizeArgs,
};
use nemprice_core::ingest::write_clean_csv_file;
use nemprice_core::{
    NemPriceConfig, NemwebLoader, RecordLoader, analyze_coverage, analyze_market,
    build_region_series, loader_for,
};
use nemprice_types::RegionMap;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Logs on stderr, reports on stdout
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    debug!("Running '{}'", cli.command.name());

    match cli.command {
        Commands::Extract(args) => extract_command(&args, &config),
        Commands::Coverage(args) => coverage_command(&args, &config),
        Commands::Analyze(args) => analyze_command(&args, &config),
        Commands::Visualize(args) => visualize_command(&args, &config),
        Commands::ExampleConfig => {
            print!("{}", NemPriceConfig::example_toml());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<NemPriceConfig> {
    match path {
        Some(path) => {
            let config = NemPriceConfig::from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(NemPriceConfig::default()),
    }
}

fn load_regions(input: &InputArgs) -> Result<RegionMap> {
    let records = loader_for(&input.input, input.raw).load()?;
    let (regions, _) = build_region_series(records);
    Ok(regions)
}

fn extract_command(args: &ExtractArgs, config: &NemPriceConfig) -> Result<()> {
    let records = NemwebLoader::new(&args.input).load()?;
    let (regions, stats) = build_region_series(records);
    write_clean_csv_file(&args.output, &regions)?;

    let analysis = analyze_market(&regions, &config.analysis);
    print!("{}", TableFormatter::format_extract_summary(&analysis, &stats));
    println!("\nData saved to {}", args.output.display());
    Ok(())
}

fn coverage_command(args: &CoverageArgs, config: &NemPriceConfig) -> Result<()> {
    let regions = load_regions(&args.input)?;
    let report = analyze_coverage(&regions, config.analysis.interval())
        .context("Coverage analysis failed")?;

    if args.format == "json" {
        println!("{}", JsonFormatter::format(&report)?);
    } else {
        let hours = args.hours.unwrap_or(config.coverage.hours_shown);
        print!("{}", TableFormatter::format_coverage(&report, hours));
    }
    Ok(())
}

fn analyze_command(args: &AnalyzeArgs, config: &NemPriceConfig) -> Result<()> {
    let regions = load_regions(&args.input)?;

    if let Some(path) = &args.write_final {
        write_clean_csv_file(path, &regions)?;
    }

    let analysis = analyze_market(&regions, &config.analysis);
    if args.format == "json" {
        println!("{}", JsonFormatter::format(&analysis)?);
    } else {
        print!("{}", TableFormatter::format_analysis(&analysis, &config.analysis));
        if let Some(path) = &args.write_final {
            println!("\nData saved to: {}", path.display());
        }
    }
    Ok(())
}

fn visualize_command(args: &VisualizeArgs, config: &NemPriceConfig) -> Result<()> {
    let regions = load_regions(&args.input)?;
    let region = args
        .region
        .as_deref()
        .unwrap_or(&config.visualization.region);

    let renderer = TimelineRenderer::new(&config.visualization, &config.analysis);
    print!("{}", renderer.render(&regions, region)?);
    Ok(())
}
