//! Stage drivers: read inputs, call the stage library, write outputs.

use std::path::PathBuf;

use infra_motion_analytics::tables;
use infra_motion_analytics_models::AnalysisReport;
use infra_motion_buffer::{BufferOutput, build_zone};
use infra_motion_cli_utils::ProgressCallback;
use infra_motion_config::AnalysisConfig;
use infra_motion_io::{table, vector, write_atomic};
use infra_motion_models::{BufferZone, ZonePointSet};
use infra_motion_render::{MapRequest, encode_png, render_map};
use infra_motion_spatial::join_zones;

use crate::{PipelineError, Stage, StageError};

/// Builds and writes the buffer zone of every configured class.
///
/// # Errors
///
/// Returns a [`StageError`] for [`Stage::Buffers`] if an input is missing,
/// a class has no features, or a CRS cannot be resolved.
pub fn run_buffers(
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<BufferZone>, StageError> {
    buffers(config, progress).map_err(StageError::wrap(Stage::Buffers))
}

fn buffers(
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<BufferZone>, PipelineError> {
    let target = config.target_crs()?;
    let layout = config.layout();
    log::info!("Buffering {} classes in {target}", config.classes.len());

    progress.set_total(config.classes.len() as u64);
    let mut outputs: Vec<BufferOutput> = Vec::with_capacity(config.classes.len());
    for class in &config.classes {
        progress.set_message(format!("Buffering {}", class.name));
        let layer = vector::read_infrastructure(&class.input, &class.name)?;
        log::info!(
            "{}: {} features ({})",
            class.name,
            layer.features.len(),
            layer.crs
        );
        outputs.push(build_zone(&layer, class.buffer_m, target, config.dissolve)?);
        progress.inc(1);
    }

    for (class, output) in config.classes.iter().zip(&outputs) {
        let per_feature = layout.feature_buffers_path(&class.name, class.buffer_m);
        vector::write_feature_buffers(&per_feature, target, &output.features)?;
        let zone = layout.zone_path(&class.name, output.zone.dissolved);
        vector::write_zone(&zone, &output.zone)?;
        log::info!("Saved: {}", zone.display());
    }

    Ok(outputs.into_iter().map(|o| o.zone).collect())
}

/// Joins the measurement points against every zone written by
/// [`run_buffers`] and writes the non-empty zone point sets.
///
/// Output files of zones that catch no points are removed so the
/// statistics stage never reads a stale set.
///
/// # Errors
///
/// Returns a [`StageError`] for [`Stage::Join`] if the points or a zone
/// file are missing or the CRSs cannot be reconciled.
pub fn run_join(
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<ZonePointSet>, StageError> {
    join(config, progress).map_err(StageError::wrap(Stage::Join))
}

fn join(
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<ZonePointSet>, PipelineError> {
    let target = config.target_crs()?;
    let layout = config.layout();

    let points = infra_motion_io::read_points(&config.points, config.points_crs()?)?;
    log::info!("Total points: {}", points.len());

    let zones = config
        .classes
        .iter()
        .map(|class| vector::read_zone(&layout.zone_path(&class.name, config.dissolve)))
        .collect::<Result<Vec<_>, _>>()?;

    progress.set_total(zones.len() as u64);
    let sets = join_zones(&points, &zones, target)?;

    let mut stale = Vec::new();
    for set in &sets {
        progress.set_message(format!("Saving {}", set.infrastructure));
        let csv = layout.zone_points_csv(&set.infrastructure);
        let geojson = layout.zone_points_geojson(&set.infrastructure);
        if set.is_empty() {
            log::warn!("Skipping {}: no points within zone", set.infrastructure);
            stale.extend([csv, geojson].into_iter().filter(|p| p.exists()));
        } else {
            table::write_zone_points_csv(&csv, set)?;
            vector::write_zone_points(&geojson, set)?;
            log::info!("Saved: {}", csv.display());
        }
        progress.inc(1);
    }

    // only once every non-empty zone is written
    for path in stale {
        std::fs::remove_file(&path).map_err(infra_motion_io::IoError::from)?;
        log::debug!("Removed stale {}", path.display());
    }

    Ok(sets)
}

/// Computes statistics, baseline comparison and risk for every zone that
/// has a point set, writes the three tables and prints them.
///
/// # Errors
///
/// Returns a [`StageError`] for [`Stage::Stats`] if the baseline is missing
/// or empty, or its mean is exactly zero.
pub fn run_stats(config: &AnalysisConfig) -> Result<AnalysisReport, StageError> {
    stats(config).map_err(StageError::wrap(Stage::Stats))
}

fn stats(config: &AnalysisConfig) -> Result<AnalysisReport, PipelineError> {
    let target = config.target_crs()?;
    let layout = config.layout();

    let baseline = infra_motion_io::read_points(config.baseline_path(), config.points_crs()?)?;

    let mut zones = Vec::with_capacity(config.classes.len());
    for class in &config.classes {
        let path = layout.zone_points_csv(&class.name);
        if !path.exists() {
            log::warn!("Skipping {}: no zone point set", class.name);
            continue;
        }
        let set = table::read_points_csv(&path, target)?;
        zones.push(ZonePointSet {
            infrastructure: class.name.clone(),
            crs: set.crs,
            points: set.points,
        });
    }

    let report = infra_motion_analytics::analyze(
        &config.baseline_label,
        &baseline.points,
        &zones,
        &config.statistics,
    )?;

    let summary = tables::summary_table(&report).to_csv()?;
    let comparison = tables::comparison_table(&report).to_csv()?;
    let risk = tables::risk_table(&report).to_csv()?;

    write_atomic(&layout.summary_csv(), summary.as_bytes())?;
    write_atomic(&layout.comparison_csv(), comparison.as_bytes())?;
    write_atomic(&layout.risk_csv(), risk.as_bytes())?;
    log::info!("Saved tables to {}", layout.statistics_dir().display());

    println!("{}", tables::render_summary(&report));

    Ok(report)
}

/// Renders one map per zone that has a point set.
///
/// Maps are numbered by class position, so a skipped class leaves a gap.
///
/// # Errors
///
/// Returns a [`StageError`] for [`Stage::Maps`] if a zone or
/// infrastructure file is missing.
pub fn run_maps(
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<PathBuf>, StageError> {
    maps(config, progress).map_err(StageError::wrap(Stage::Maps))
}

fn maps(
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<PathBuf>, PipelineError> {
    let layout = config.layout();
    let half_width = config.statistics.stability_half_width_mm;

    progress.set_total(config.classes.len() as u64);
    let mut documents = Vec::with_capacity(config.classes.len());
    for (index, class) in config.classes.iter().enumerate() {
        progress.set_message(format!("Rendering {}", class.name));
        let points_path = layout.zone_points_geojson(&class.name);
        if !points_path.exists() {
            log::warn!("Skipping {} map: no zone point set", class.name);
            progress.inc(1);
            continue;
        }

        let points = vector::read_zone_points(&points_path, &class.name)?;
        let zone = vector::read_zone(&layout.zone_path(&class.name, config.dissolve))?;
        let infrastructure = vector::read_infrastructure(&class.input, &class.name)?;
        let stats =
            infra_motion_analytics::zone_statistics(&class.name, &points.points, half_width)?;

        let title = format!("{} - Ground Motion Analysis", class.name);
        let image = render_map(&MapRequest {
            title: &title,
            zone: &zone,
            infrastructure: &infrastructure,
            points: &points,
            stats: &stats,
            stability_half_width_mm: half_width,
        })?;
        documents.push((layout.map_path(index + 1, &class.name), encode_png(&image)?));
        progress.inc(1);
    }

    let mut written = Vec::with_capacity(documents.len());
    for (path, png) in documents {
        write_atomic(&path, &png)?;
        log::info!("Saved: {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Runs all four stages in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the [`StageError`] of the first stage that fails.
pub fn run_all(
    config: &AnalysisConfig,
    stages: &dyn ProgressCallback,
    items: &dyn ProgressCallback,
) -> Result<AnalysisReport, StageError> {
    stages.set_total(Stage::ALL.len() as u64);

    stages.set_message(Stage::Buffers.to_string());
    run_buffers(config, items)?;
    stages.inc(1);

    stages.set_message(Stage::Join.to_string());
    run_join(config, items)?;
    stages.inc(1);

    stages.set_message(Stage::Stats.to_string());
    let report = run_stats(config)?;
    stages.inc(1);

    stages.set_message(Stage::Maps.to_string());
    run_maps(config, items)?;
    stages.inc(1);

    stages.finish("Pipeline complete".to_string());
    Ok(report)
}
