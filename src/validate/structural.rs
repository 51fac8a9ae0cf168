//! Structural validator: canonicalized snapshot vs. stage contract.

use crate::validate::mapping::CanonicalizedSnapshot;
use crate::validate::types::{AssetSnapshot, Severity, StageConfig, ValidationIssue};

// ─── Issue codes ──────────────────────────────────────────────────────────────

pub const MISSING_REQUIRED_PARAMETER: &str = "MISSING_REQUIRED_PARAMETER";
pub const UNREQUIRED_PARAMETER: &str = "UNREQUIRED_PARAMETER";
pub const UNMAPPED_IDENTIFIER: &str = "UNMAPPED_IDENTIFIER";
pub const AMBIGUOUS_MAPPING: &str = "AMBIGUOUS_MAPPING";
pub const VERTEX_COUNT_OUT_OF_RANGE: &str = "VERTEX_COUNT_OUT_OF_RANGE";
pub const FILE_SIZE_OUT_OF_RANGE: &str = "FILE_SIZE_OUT_OF_RANGE";

// ─── Validator ────────────────────────────────────────────────────────────────

/// Check a canonicalized snapshot against a stage's required-parameter and
/// threshold contract. Issues are collected, never thrown; ordering is
/// deterministic (missing, extras, unmapped, ambiguous, thresholds).
pub fn check(
    canonical: &CanonicalizedSnapshot,
    snapshot: &AssetSnapshot,
    config: &StageConfig,
) -> Vec<ValidationIssue> {
    let stage = config.stage.as_str();
    let mut issues = Vec::new();

    for name in &config.required {
        if !canonical.resolved.contains_key(name) {
            issues.push(ValidationIssue::error(
                stage,
                MISSING_REQUIRED_PARAMETER,
                format!("missing required parameter '{name}'"),
            ));
        }
    }

    let extra_severity = if config.allow_extra {
        Severity::Warning
    } else {
        Severity::Error
    };

    for name in canonical.resolved.keys() {
        if !config.required.contains(name) {
            issues.push(issue_with_severity(
                stage,
                extra_severity,
                UNREQUIRED_PARAMETER,
                format!("unrequired parameter '{name}' present"),
            ));
        }
    }

    for raw in &canonical.unmapped_morphs {
        issues.push(issue_with_severity(
            stage,
            extra_severity,
            UNMAPPED_IDENTIFIER,
            format!("no mapping rule resolves morph identifier '{raw}'"),
        ));
    }

    for (name, raws) in &canonical.resolved {
        if raws.len() > 1 {
            issues.push(ValidationIssue::error(
                stage,
                AMBIGUOUS_MAPPING,
                format!(
                    "ambiguous mapping for '{}': raw identifiers [{}] all resolve to it",
                    name,
                    raws.join(", ")
                ),
            ));
        }
    }

    if let Some(severity) = config.vertex_bounds.classify(snapshot.vertex_count) {
        issues.push(issue_with_severity(
            stage,
            severity,
            VERTEX_COUNT_OUT_OF_RANGE,
            format!(
                "vertex count {} outside {} bound {:?}",
                snapshot.vertex_count,
                bound_kind(severity),
                bound_for(severity, &config.vertex_bounds.hard, config.vertex_bounds.soft),
            ),
        ));
    }

    if let Some(severity) = config.file_size_bounds.classify(snapshot.file_size_bytes) {
        issues.push(issue_with_severity(
            stage,
            severity,
            FILE_SIZE_OUT_OF_RANGE,
            format!(
                "file size {} bytes outside {} bound {:?}",
                snapshot.file_size_bytes,
                bound_kind(severity),
                bound_for(
                    severity,
                    &config.file_size_bounds.hard,
                    config.file_size_bounds.soft
                ),
            ),
        ));
    }

    issues
}

fn issue_with_severity(
    stage: &str,
    severity: Severity,
    code: &str,
    message: String,
) -> ValidationIssue {
    match severity {
        Severity::Error => ValidationIssue::error(stage, code, message),
        Severity::Warning => ValidationIssue::warning(stage, code, message),
    }
}

fn bound_kind(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "hard",
        Severity::Warning => "soft",
    }
}

fn bound_for(severity: Severity, hard: &(u64, u64), soft: Option<(u64, u64)>) -> (u64, u64) {
    match severity {
        Severity::Error => *hard,
        Severity::Warning => soft.unwrap_or(*hard),
    }
}
