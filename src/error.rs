//! Error types for grid generation.

use thiserror::Error;

use crate::geometry::Axis;

/// Errors that can occur while building a simulation grid.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GridError {
    /// The grid specification cannot be evaluated with the given inputs
    /// (missing wavelength, ambiguous sources, out-of-range parameters).
    #[error("invalid grid configuration: {0}")]
    Configuration(String),

    /// User supplied boundaries do not overlap the simulation domain.
    #[error("simulation domain does not overlap with the provided grid in '{axis}' direction")]
    DomainMismatch {
        /// Axis on which the mismatch was detected.
        axis: Axis,
    },

    /// The graded mesher produced boundaries that do not reproduce the
    /// domain. This is a defect in the mesher, not bad input.
    #[error(
        "auto grid coordinates along '{axis}' do not match the simulation domain ({detail}); \
         switch to a uniform or custom grid along this axis"
    )]
    InternalConsistency {
        /// Axis being meshed.
        axis: Axis,
        /// What went wrong.
        detail: String,
    },

    /// Malformed JSON input.
    #[error("failed to parse grid job: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing a job file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The text report template failed to render.
    #[error("failed to render grid report: {0}")]
    Render(#[from] minijinja::Error),
}

impl GridError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        GridError::Configuration(msg.into())
    }

    pub(crate) fn internal(axis: Axis, detail: impl Into<String>) -> Self {
        GridError::InternalConsistency {
            axis,
            detail: detail.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;
