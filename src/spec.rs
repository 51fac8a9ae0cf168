//! Canonical playback parameter table.
//!
//! The downstream speech-driven animation service addresses facial controls
//! by exact name and, in packed encodings, by fixed numeric index: 52 facial
//! blendshapes at indices 0-51 followed by 3 rotation parameters at 52-54.
//! The ordering below is a compatibility contract and must never be
//! reordered.

use serde::Serialize;

use crate::error::ConfigError;

// ─── Parameter name constants ─────────────────────────────────────────────────

/// The 52 ARKit-style facial blendshape names, in playback index order.
pub const FACIAL_BLENDSHAPES: [&str; 52] = [
    // Eye (14)
    "eyeBlinkLeft",
    "eyeBlinkRight",
    "eyeLookDownLeft",
    "eyeLookDownRight",
    "eyeLookInLeft",
    "eyeLookInRight",
    "eyeLookOutLeft",
    "eyeLookOutRight",
    "eyeLookUpLeft",
    "eyeLookUpRight",
    "eyeSquintLeft",
    "eyeSquintRight",
    "eyeWideLeft",
    "eyeWideRight",
    // Jaw (4)
    "jawForward",
    "jawLeft",
    "jawRight",
    "jawOpen",
    // Mouth (24)
    "mouthClose",
    "mouthFunnel",
    "mouthPucker",
    "mouthLeft",
    "mouthRight",
    "mouthSmileLeft",
    "mouthSmileRight",
    "mouthFrownLeft",
    "mouthFrownRight",
    "mouthDimpleLeft",
    "mouthDimpleRight",
    "mouthStretchLeft",
    "mouthStretchRight",
    "mouthRollLower",
    "mouthRollUpper",
    "mouthShrugLower",
    "mouthShrugUpper",
    "mouthPressLeft",
    "mouthPressRight",
    "mouthLowerDownLeft",
    "mouthLowerDownRight",
    "mouthUpperUpLeft",
    "mouthUpperUpRight",
    "tongueOut",
    // Brow (5)
    "browDownLeft",
    "browDownRight",
    "browInnerUp",
    "browOuterUpLeft",
    "browOuterUpRight",
    // Cheek (3)
    "cheekPuff",
    "cheekSquintLeft",
    "cheekSquintRight",
    // Nose (2)
    "noseSneerLeft",
    "noseSneerRight",
];

/// The 3 rotation parameters occupying indices 52-54, driven by head and eye
/// bones rather than morph targets.
pub const ROTATION_PARAMETERS: [&str; 3] = ["headRoll", "leftEyeRoll", "rightEyeRoll"];

/// Total parameter count the playback contract expects.
pub const TOTAL_PARAMETERS: usize = FACIAL_BLENDSHAPES.len() + ROTATION_PARAMETERS.len();

// ─── Canonical spec ───────────────────────────────────────────────────────────

/// One entry of the canonical parameter table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CanonicalEntry {
    pub index: usize,
    pub name: &'static str,
    pub is_rotation: bool,
}

/// The ordered, immutable 55-entry canonical parameter table.
#[derive(Debug, Clone)]
pub struct CanonicalSpec {
    entries: Vec<CanonicalEntry>,
}

impl CanonicalSpec {
    /// Build the standard table and verify its invariants.
    pub fn standard() -> Result<Self, ConfigError> {
        let entries = FACIAL_BLENDSHAPES
            .iter()
            .map(|name| (*name, false))
            .chain(ROTATION_PARAMETERS.iter().map(|name| (*name, true)))
            .enumerate()
            .map(|(index, (name, is_rotation))| CanonicalEntry {
                index,
                name,
                is_rotation,
            })
            .collect();

        let spec = Self { entries };
        spec.verify()?;
        Ok(spec)
    }

    pub fn entries(&self) -> &[CanonicalEntry] {
        &self.entries
    }

    /// Resolve a name case-insensitively to its canonical entry.
    pub fn resolve(&self, name: &str) -> Option<&CanonicalEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn by_index(&self, index: usize) -> Option<&CanonicalEntry> {
        self.entries.get(index)
    }

    /// Check the compatibility-contract invariants: exactly 55 uniquely named
    /// entries, contiguous indices, rotations exactly at 52-54.
    fn verify(&self) -> Result<(), ConfigError> {
        if self.entries.len() != TOTAL_PARAMETERS {
            return Err(ConfigError::WrongEntryCount {
                expected: TOTAL_PARAMETERS,
                found: self.entries.len(),
            });
        }

        for (expected, entry) in self.entries.iter().enumerate() {
            if entry.index != expected {
                return Err(ConfigError::IndexOutOfOrder {
                    index: entry.index,
                    expected,
                });
            }

            let should_rotate = expected >= FACIAL_BLENDSHAPES.len();
            if entry.is_rotation != should_rotate {
                return Err(ConfigError::RotationFlagMismatch { index: expected });
            }

            let duplicated = self.entries[..expected]
                .iter()
                .any(|earlier| earlier.name.eq_ignore_ascii_case(entry.name));
            if duplicated {
                return Err(ConfigError::DuplicateCanonicalName {
                    name: entry.name.to_string(),
                });
            }
        }

        Ok(())
    }
}
