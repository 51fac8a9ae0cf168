use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::spec::{FACIAL_BLENDSHAPES, ROTATION_PARAMETERS};

// ─── Issues and reports ───────────────────────────────────────────────────────

/// Severity level used by validation issues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation issue produced by one of the validators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub stage: String,
}

impl ValidationIssue {
    pub fn error(stage: &str, code: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message,
            stage: stage.to_string(),
        }
    }

    pub fn warning(stage: &str, code: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message,
            stage: stage.to_string(),
        }
    }
}

/// Immutable per-invocation verdict produced by the stage gate.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub stage: String,
    pub issues: Vec<ValidationIssue>,
    pub passed: bool,
    /// Raw-to-canonical pairs resolved by the name mapper.
    pub mapped: Vec<(String, String)>,
    /// Raw morph identifiers no rule could resolve.
    pub unmapped: Vec<String>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
            .count()
    }
}

// ─── Asset snapshot ───────────────────────────────────────────────────────────

/// Extracted asset metadata handed over by the external extractor.
///
/// Read-only once constructed; the validators never mutate it. The optional
/// container buffer is only present for stages that package a binary scene
/// file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub morph_names: Vec<String>,
    pub bone_names: Vec<String>,
    pub vertex_count: u64,
    pub file_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_bytes: Option<Vec<u8>>,
}

// ─── Stage configuration ──────────────────────────────────────────────────────

/// Hard bound with an optional tighter soft sub-range.
///
/// Values outside the hard bound are errors; values inside the hard bound but
/// outside the soft bound are warnings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub hard: (u64, u64),
    pub soft: Option<(u64, u64)>,
}

impl ThresholdBand {
    /// Classify a value against the band.
    pub fn classify(&self, value: u64) -> Option<Severity> {
        let (hard_min, hard_max) = self.hard;
        if value < hard_min || value > hard_max {
            return Some(Severity::Error);
        }
        if let Some((soft_min, soft_max)) = self.soft
            && (value < soft_min || value > soft_max)
        {
            return Some(Severity::Warning);
        }
        None
    }
}

/// Per-stage validation contract, passed explicitly into every gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub stage: String,
    /// Canonical names this stage requires; BTreeSet keeps the
    /// missing-parameter report order deterministic.
    pub required: BTreeSet<String>,
    pub allow_extra: bool,
    pub vertex_bounds: ThresholdBand,
    pub file_size_bounds: ThresholdBand,
}

impl StageConfig {
    /// The default full-surface stage: all 55 canonical parameters required,
    /// extras tolerated, thresholds matching the upstream tool's sanity
    /// bands (warn under 1 MiB / over 500 MiB, error outside hard bounds).
    pub fn full_surface(stage: &str) -> Self {
        let required = FACIAL_BLENDSHAPES
            .iter()
            .chain(ROTATION_PARAMETERS.iter())
            .map(|name| name.to_string())
            .collect();

        Self {
            stage: stage.to_string(),
            required,
            allow_extra: true,
            vertex_bounds: ThresholdBand {
                hard: (1_000, 2_000_000),
                soft: Some((10_000, 500_000)),
            },
            file_size_bounds: ThresholdBand {
                hard: (1_024, 2_147_483_648),
                soft: Some((1_048_576, 524_288_000)),
            },
        }
    }

    /// A mappability-only stage: no required names, extras tolerated, bounds
    /// wide open. Always structurally passes.
    pub fn mappability_only(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            required: BTreeSet::new(),
            allow_extra: true,
            vertex_bounds: ThresholdBand {
                hard: (0, u64::MAX),
                soft: None,
            },
            file_size_bounds: ThresholdBand {
                hard: (0, u64::MAX),
                soft: None,
            },
        }
    }
}
