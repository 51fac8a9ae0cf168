//! Stage gate: the single externally-callable validation entry point.
//!
//! One call runs the name mapper, the structural validator and, for
//! packaging stages, the binary container validator, then merges every
//! issue into one fresh [`ValidationReport`]. Calls are pure and
//! call-local: nothing is retained between stages, so batch validation of
//! many assets can run concurrently without locking.

pub mod container;
pub mod mapping;
pub mod structural;
mod types;

use tracing::{debug, info, warn};

pub use mapping::{CanonicalizedSnapshot, MappingRule, RuleTable, canonicalize};
pub use types::{
    AssetSnapshot, Severity, StageConfig, ThresholdBand, ValidationIssue, ValidationReport,
};

use crate::error::ConfigError;
use crate::spec::CanonicalSpec;

/// Issue code for a binary-container stage whose snapshot carries no buffer.
pub const MISSING_CONTAINER_BUFFER: &str = "MISSING_CONTAINER_BUFFER";

/// The stage gate, holding the process-wide static tables.
///
/// Construction verifies both tables and is the only point where
/// [`ConfigError`] can surface; after that every `validate` call is
/// infallible and collects its findings into the report instead.
#[derive(Debug, Clone)]
pub struct StageGate {
    spec: CanonicalSpec,
    rules: RuleTable,
}

impl StageGate {
    /// Build the gate over the standard canonical table and rule table.
    pub fn standard() -> Result<Self, ConfigError> {
        let spec = CanonicalSpec::standard()?;
        let rules = RuleTable::standard();
        rules.verify_coverage(&spec)?;
        Ok(Self { spec, rules })
    }

    pub fn spec(&self) -> &CanonicalSpec {
        &self.spec
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Run the validators applicable to one stage and merge their issues.
    ///
    /// The snapshot is never mutated and the report is fresh per call;
    /// validating the same `(snapshot, config)` pair twice yields identical
    /// reports.
    pub fn validate(
        &self,
        snapshot: &AssetSnapshot,
        config: &StageConfig,
        check_binary: bool,
    ) -> ValidationReport {
        info!(
            stage = %config.stage,
            morphs = snapshot.morph_names.len(),
            bones = snapshot.bone_names.len(),
            check_binary,
            "validating asset snapshot"
        );

        let canonical = canonicalize(snapshot, &self.rules, &self.spec);
        debug!(
            resolved = canonical.resolved.len(),
            unmapped = canonical.unmapped_morphs.len(),
            "canonicalized identifiers"
        );

        let mut issues = structural::check(&canonical, snapshot, config);

        if check_binary {
            match snapshot.container_bytes.as_deref() {
                Some(bytes) => issues.extend(container::check(bytes, &config.stage)),
                None => issues.push(ValidationIssue::error(
                    &config.stage,
                    MISSING_CONTAINER_BUFFER,
                    "binary container check requested but snapshot carries no buffer".to_string(),
                )),
            }
        }

        let passed = !issues
            .iter()
            .any(|issue| issue.severity == Severity::Error);

        if passed {
            info!(stage = %config.stage, warnings = issues.len(), "stage gate passed");
        } else {
            warn!(
                stage = %config.stage,
                errors = issues.iter().filter(|i| i.severity == Severity::Error).count(),
                "stage gate failed"
            );
        }

        ValidationReport {
            stage: config.stage.clone(),
            issues,
            passed,
            mapped: canonical.mapped_pairs(),
            unmapped: canonical.unmapped_morphs,
        }
    }
}
