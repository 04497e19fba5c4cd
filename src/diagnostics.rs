//! Non-fatal findings collected while building a grid.
//!
//! The pipeline never consults global logging state to decide anything;
//! warnings are pushed into a [`Diagnostics`] value that is returned to the
//! caller. Each warning is also forwarded to `tracing` when recorded.

use serde::Serialize;

use crate::geometry::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A snapping point was dropped because a boundary already sits too close
    SnapPointDropped,
    /// Override structures were supplied for an axis that is not auto-meshed
    OverrideIgnored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub axis: Option<Axis>,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, axis: Option<Axis>, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(?axis, ?kind, "{}", message);
        self.warnings.push(Warning {
            axis,
            kind,
            message,
        });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Append another sink's warnings, keeping their order
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}
