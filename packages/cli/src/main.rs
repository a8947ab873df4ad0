#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the infrastructure ground-motion pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`infra_motion_cli_utils::init_logger`])
//! so log lines and progress bars never fight for the terminal.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use infra_motion_cli::{Stage, run_all, run_buffers, run_join, run_maps, run_stats};
use infra_motion_cli_utils::{IndicatifProgress, init_logger};
use infra_motion_config::AnalysisConfig;
use infra_motion_models::ZonePointSet;

const DEFAULT_CONFIG: &str = "infra_motion.toml";

#[derive(Parser)]
#[command(
    name = "infra_motion",
    about = "Ground-motion analysis around infrastructure"
)]
struct Cli {
    /// Configuration file (defaults to `infra_motion.toml` if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Root directory for all outputs
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Metric CRS for buffering and joining (e.g. "EPSG:2157")
    #[arg(long, global = true)]
    target_crs: Option<String>,
    /// Half-width of the stability band in mm/yr
    #[arg(long, global = true)]
    stability_half_width: Option<f64>,
    /// Measurement points file (`GeoJSON` or CSV)
    #[arg(long, global = true)]
    points: Option<PathBuf>,
    /// Baseline points file (defaults to the measurement points)
    #[arg(long, global = true)]
    baseline: Option<PathBuf>,
    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a buffer zone per infrastructure class
    Buffers,
    /// Select the measurement points inside each zone
    Join,
    /// Compute statistics, baseline comparison and risk tiers
    Stats,
    /// Render one map per zone
    Maps,
    /// Run all four stages in sequence
    Run,
    /// Print the default configuration as TOML
    InitConfig,
}

impl Cli {
    fn load_config(&self) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => {
                AnalysisConfig::load(Path::new(DEFAULT_CONFIG))?
            }
            None => {
                log::info!("No {DEFAULT_CONFIG} found, using defaults");
                AnalysisConfig::default()
            }
        };

        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(crs) = &self.target_crs {
            config.target_crs.clone_from(crs);
        }
        if let Some(width) = self.stability_half_width {
            config.statistics.stability_half_width_mm = width;
        }
        if let Some(points) = &self.points {
            config.points.clone_from(points);
        }
        if let Some(baseline) = &self.baseline {
            config.baseline = Some(baseline.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::InitConfig) {
        print!("{}", AnalysisConfig::default().to_toml_string()?);
        return Ok(());
    }

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let multi = init_logger(level);
    let config = cli.load_config()?;

    let items = IndicatifProgress::steps_bar(&multi, "Classes", 0);
    match cli.command {
        Commands::Buffers => {
            let zones = run_buffers(&config, items.as_ref())?;
            items.finish_and_clear();
            log::info!("{} stage complete: {} zones", Stage::Buffers, zones.len());
        }
        Commands::Join => {
            let sets = run_join(&config, items.as_ref())?;
            items.finish_and_clear();
            let total: usize = sets.iter().map(ZonePointSet::len).sum();
            log::info!(
                "{} stage complete: {total} points in {} zones",
                Stage::Join,
                sets.len()
            );
        }
        Commands::Stats => {
            items.finish_and_clear();
            let report = run_stats(&config)?;
            log::info!("{} stage complete: {} zones", Stage::Stats, report.zones.len());
        }
        Commands::Maps => {
            let maps = run_maps(&config, items.as_ref())?;
            items.finish_and_clear();
            log::info!(
                "{} stage complete: {} maps in {}",
                Stage::Maps,
                maps.len(),
                config.layout().maps_dir().display()
            );
        }
        Commands::Run => {
            let stages = IndicatifProgress::steps_bar(&multi, "Stages", Stage::ALL.len() as u64);
            run_all(&config, stages.as_ref(), items.as_ref())?;
            items.finish_and_clear();
            log::info!("Outputs in {}", config.output_dir.display());
        }
        Commands::InitConfig => {}
    }

    Ok(())
}
