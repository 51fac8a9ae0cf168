//! Facial control-surface validation gate.
//!
//! Validates and normalizes a character asset's facial-animation control
//! surface (morph targets and skeletal bones) against the fixed 55-parameter
//! playback contract, and verifies the packaged binary scene container at
//! the byte level. The external extraction pipeline supplies an
//! [`AssetSnapshot`](validate::AssetSnapshot); this crate returns a
//! pass/fail [`ValidationReport`](validate::ValidationReport).

pub mod error;
pub mod spec;
pub mod validate;

pub use error::ConfigError;
pub use validate::{
    AssetSnapshot, Severity, StageConfig, StageGate, ThresholdBand, ValidationIssue,
    ValidationReport,
};
