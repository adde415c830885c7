//! Transform descriptors: which color operation to run and how strongly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ColorLensError, Result};

/// Class of color-vision deficiency to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deficiency {
    /// Missing or anomalous L cones (red).
    Protan,
    /// Missing or anomalous M cones (green).
    Deutan,
    /// Missing or anomalous S cones (blue).
    Tritan,
}

impl Deficiency {
    /// Map the host's integer code (0 = protan, 1 = deutan, 2 = tritan).
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Protan),
            1 => Ok(Self::Deutan),
            2 => Ok(Self::Tritan),
            other => Err(ColorLensError::invalid(format!(
                "unknown deficiency code {other}"
            ))),
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            Self::Protan => 0,
            Self::Deutan => 1,
            Self::Tritan => 2,
        }
    }

    /// Human-readable label for logs and the demo CLI.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Protan => "protanopia",
            Self::Deutan => "deuteranopia",
            Self::Tritan => "tritanopia",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [Deficiency; 3] = [Deficiency::Protan, Deficiency::Deutan, Deficiency::Tritan];
        &ALL
    }
}

impl fmt::Display for Deficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The color operation applied by a transform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformKind {
    /// Leaves every byte untouched. Used to exercise pipeline wiring.
    Identity,
    /// Simulate how the image is perceived under a deficiency class.
    Simulate(Deficiency),
}

/// Immutable per-call description of a transform.
///
/// Severity is clamped into `[0, 1]` on construction; NaN becomes `0.0`.
/// Applying the same non-identity descriptor twice is not idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    kind: TransformKind,
    severity: f32,
}

impl TransformDescriptor {
    pub fn new(kind: TransformKind, severity: f32) -> Self {
        Self {
            kind,
            severity: clamp_severity(severity),
        }
    }

    pub fn identity() -> Self {
        Self::new(TransformKind::Identity, 0.0)
    }

    pub fn simulate(deficiency: Deficiency, severity: f32) -> Self {
        Self::new(TransformKind::Simulate(deficiency), severity)
    }

    /// Build from the host's integer deficiency code.
    pub fn from_host(deficiency: i32, severity: f32) -> Result<Self> {
        Ok(Self::simulate(Deficiency::from_code(deficiency)?, severity))
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// Severity, always within `[0, 1]`.
    pub fn severity(&self) -> f32 {
        self.severity
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, TransformKind::Identity)
    }
}

/// Clamp a host-supplied severity into `[0, 1]`.
pub fn clamp_severity(severity: f32) -> f32 {
    if severity.is_nan() {
        tracing::debug!("severity is NaN, using 0.0");
        return 0.0;
    }
    let clamped = severity.clamp(0.0, 1.0);
    if clamped != severity {
        tracing::debug!("severity {severity} clamped to {clamped}");
    }
    clamped
}
