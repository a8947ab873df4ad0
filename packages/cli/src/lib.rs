#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The four pipeline stages as callable functions.
//!
//! Each stage reads the outputs of the previous one from the configured
//! output directory, computes everything in memory, and only then writes
//! its own files. A stage that fails writes nothing.

pub mod stages;

use infra_motion_analytics::AnalyticsError;
use infra_motion_buffer::BufferError;
use infra_motion_config::ConfigError;
use infra_motion_crs::CrsError;
use infra_motion_io::IoError;
use infra_motion_render::RenderError;
use infra_motion_spatial::JoinError;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use stages::{run_all, run_buffers, run_join, run_maps, run_stats};

/// Pipeline stage names, as used on the command line and in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Buffer Builder.
    Buffers,
    /// Zone Join.
    Join,
    /// Statistics & Risk Engine.
    Stats,
    /// Map Renderer.
    Maps,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: &[Self] = &[Self::Buffers, Self::Join, Self::Stats, Self::Maps];
}

/// Any failure inside a stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// A CRS could not be resolved.
    #[error(transparent)]
    Crs(#[from] CrsError),

    /// Buffering failed.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Joining points to zones failed.
    #[error(transparent)]
    Join(#[from] JoinError),

    /// Statistics failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A [`PipelineError`] tagged with the stage it aborted.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {source}")]
pub struct StageError {
    /// The failing stage.
    pub stage: Stage,
    /// What went wrong.
    #[source]
    pub source: PipelineError,
}

impl StageError {
    pub(crate) fn wrap(stage: Stage) -> impl FnOnce(PipelineError) -> Self {
        move |source| Self { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Buffers.to_string(), "buffers");
        assert_eq!("maps".parse::<Stage>().unwrap(), Stage::Maps);
        assert_eq!(Stage::ALL.len(), 4);
    }

    #[test]
    fn stage_error_names_the_stage() {
        let err = StageError {
            stage: Stage::Join,
            source: PipelineError::Io(IoError::InputNotFound {
                path: "zones/rail.geojson".into(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "stage 'join' failed: Input not found: zones/rail.geojson"
        );
    }
}
