//! Name mapper: canonicalizes vendor-spelled identifiers.
//!
//! Mapping is an ordered rule walk, first match wins, case-insensitive.
//! There is deliberately no fuzzy matching beyond the explicit synonym
//! table: a silently mis-mapped control changes the meaning of downstream
//! motion data, so anything the rules cannot resolve stays unmapped and is
//! surfaced by the structural validator.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::spec::{CanonicalSpec, FACIAL_BLENDSHAPES, ROTATION_PARAMETERS};
use crate::validate::types::AssetSnapshot;

// ─── Vendor suffix conventions ────────────────────────────────────────────────

/// Trailing side markers rewritten to the canonical `Left`/`Right` suffix
/// before re-testing against the canonical table.
const SUFFIX_SWAPS: [(&str, &str); 4] = [
    ("_l", "Left"),
    ("_r", "Right"),
    ("_left", "Left"),
    ("_right", "Right"),
];

// ─── Vendor synonym table ─────────────────────────────────────────────────────

/// Explicit raw-spelling to canonical-name synonyms for MetaHuman-style
/// exports, one raw spelling per entry.
///
/// Where the vendor rig splits one canonical control across paired morphs
/// (lip rolls, inner brow raise, funnel/purse corner variants), exactly one
/// variant is listed; mapping both would collide on the canonical name and
/// be rejected as ambiguous. Entries exist both with the LOD0 mesh prefix
/// and in the older unprefixed spelling.
const PATTERN_SUBSTITUTES: [(&str, &str); 109] = [
    // Eye, prefixed. A left eye looking left is looking inward; a right eye
    // looking left is looking outward.
    ("head_lod0_mesh__eye_blink_L", "eyeBlinkLeft"),
    ("head_lod0_mesh__eye_blink_R", "eyeBlinkRight"),
    ("head_lod0_mesh__eye_lookDown_L", "eyeLookDownLeft"),
    ("head_lod0_mesh__eye_lookDown_R", "eyeLookDownRight"),
    ("head_lod0_mesh__eye_lookLeft_L", "eyeLookInLeft"),
    ("head_lod0_mesh__eye_lookLeft_R", "eyeLookOutRight"),
    ("head_lod0_mesh__eye_lookRight_L", "eyeLookOutLeft"),
    ("head_lod0_mesh__eye_lookRight_R", "eyeLookInRight"),
    ("head_lod0_mesh__eye_lookUp_L", "eyeLookUpLeft"),
    ("head_lod0_mesh__eye_lookUp_R", "eyeLookUpRight"),
    ("head_lod0_mesh__eye_squintInner_L", "eyeSquintLeft"),
    ("head_lod0_mesh__eye_squintInner_R", "eyeSquintRight"),
    ("head_lod0_mesh__eye_widen_L", "eyeWideLeft"),
    ("head_lod0_mesh__eye_widen_R", "eyeWideRight"),
    // Jaw, prefixed
    ("head_lod0_mesh__jaw_fwd", "jawForward"),
    ("head_lod0_mesh__jaw_left", "jawLeft"),
    ("head_lod0_mesh__jaw_right", "jawRight"),
    ("head_lod0_mesh__jaw_open", "jawOpen"),
    // Mouth, prefixed
    ("head_lod0_mesh__mouth_down", "mouthClose"),
    ("head_lod0_mesh__mouth_funnel_DL", "mouthFunnel"),
    ("head_lod0_mesh__mouth_lipsPurse_DL", "mouthPucker"),
    ("head_lod0_mesh__mouth_left", "mouthLeft"),
    ("head_lod0_mesh__mouth_right", "mouthRight"),
    ("head_lod0_mesh__mouth_cornerPull_left", "mouthSmileLeft"),
    ("head_lod0_mesh__mouth_cornerPull_right", "mouthSmileRight"),
    ("head_lod0_mesh__mouth_cornerDepress_L", "mouthFrownLeft"),
    ("head_lod0_mesh__mouth_cornerDepress_R", "mouthFrownRight"),
    ("head_lod0_mesh__mouth_dimple_left", "mouthDimpleLeft"),
    ("head_lod0_mesh__mouth_dimple_right", "mouthDimpleRight"),
    ("head_lod0_mesh__mouth_stretch_left", "mouthStretchLeft"),
    ("head_lod0_mesh__mouth_stretch_right", "mouthStretchRight"),
    ("head_lod0_mesh__mouth_lowerLipRollIn_L", "mouthRollLower"),
    ("head_lod0_mesh__mouth_upperLipRollIn_L", "mouthRollUpper"),
    ("head_lod0_mesh__mouth_lowerLipRollOut_L", "mouthShrugLower"),
    ("head_lod0_mesh__mouth_upperLipRollOut_L", "mouthShrugUpper"),
    ("head_lod0_mesh__mouth_lipsPress_L", "mouthPressLeft"),
    ("head_lod0_mesh__mouth_lipsPress_R", "mouthPressRight"),
    ("head_lod0_mesh__mouth_lowerLipDepress_left", "mouthLowerDownLeft"),
    ("head_lod0_mesh__mouth_lowerLipDepress_right", "mouthLowerDownRight"),
    ("head_lod0_mesh__mouth_upperLipRaise_left", "mouthUpperUpLeft"),
    ("head_lod0_mesh__mouth_upperLipRaise_right", "mouthUpperUpRight"),
    // Tongue lives on the teeth mesh, not the head mesh
    ("teeth_lod0_mesh__tongue_out_cor", "tongueOut"),
    // Brow, prefixed
    ("head_lod0_mesh__brow_down_L", "browDownLeft"),
    ("head_lod0_mesh__brow_down_R", "browDownRight"),
    ("head_lod0_mesh__brow_raiseIn_L", "browInnerUp"),
    ("head_lod0_mesh__brow_raiseOuter_left", "browOuterUpLeft"),
    ("head_lod0_mesh__brow_raiseOuter_right", "browOuterUpRight"),
    // Cheek, prefixed
    ("head_lod0_mesh__cheek_blow_cor", "cheekPuff"),
    ("head_lod0_mesh__EcheekRaise_EsquintInner_L", "cheekSquintLeft"),
    ("head_lod0_mesh__EcheekRaise_EsquintInner_R", "cheekSquintRight"),
    // Nose, prefixed
    ("head_lod0_mesh__nose_wrinkle_left", "noseSneerLeft"),
    ("head_lod0_mesh__nose_wrinkle_right", "noseSneerRight"),
    // Unprefixed legacy spellings (older exporter versions)
    ("eye_blink_L", "eyeBlinkLeft"),
    ("eye_blink_R", "eyeBlinkRight"),
    ("eye_lookDown_L", "eyeLookDownLeft"),
    ("eye_lookDown_R", "eyeLookDownRight"),
    ("eye_lookLeft_L", "eyeLookInLeft"),
    ("eye_lookLeft_R", "eyeLookOutRight"),
    ("eye_lookRight_L", "eyeLookOutLeft"),
    ("eye_lookRight_R", "eyeLookInRight"),
    ("eye_lookUp_L", "eyeLookUpLeft"),
    ("eye_lookUp_R", "eyeLookUpRight"),
    ("eye_squintInner_L", "eyeSquintLeft"),
    ("eye_squintInner_R", "eyeSquintRight"),
    ("eye_widen_L", "eyeWideLeft"),
    ("eye_widen_R", "eyeWideRight"),
    ("jaw_fwd", "jawForward"),
    ("jaw_left", "jawLeft"),
    ("jaw_right", "jawRight"),
    ("jaw_open", "jawOpen"),
    ("mouth_down", "mouthClose"),
    ("mouth_funnel_DL", "mouthFunnel"),
    ("mouth_lipsPurse_DL", "mouthPucker"),
    ("mouth_left", "mouthLeft"),
    ("mouth_right", "mouthRight"),
    ("mouth_cornerPull_left", "mouthSmileLeft"),
    ("mouth_cornerPull_right", "mouthSmileRight"),
    ("mouth_cornerDepress_L", "mouthFrownLeft"),
    ("mouth_cornerDepress_R", "mouthFrownRight"),
    ("mouth_dimple_left", "mouthDimpleLeft"),
    ("mouth_dimple_right", "mouthDimpleRight"),
    ("mouth_stretch_left", "mouthStretchLeft"),
    ("mouth_stretch_right", "mouthStretchRight"),
    ("mouth_lowerLipRollIn_L", "mouthRollLower"),
    ("mouth_upperLipRollIn_L", "mouthRollUpper"),
    ("mouth_lowerLipRollOut_L", "mouthShrugLower"),
    ("mouth_upperLipRollOut_L", "mouthShrugUpper"),
    ("mouth_lipsPress_L", "mouthPressLeft"),
    ("mouth_lipsPress_R", "mouthPressRight"),
    ("mouth_lowerLipDepress_left", "mouthLowerDownLeft"),
    ("mouth_lowerLipDepress_right", "mouthLowerDownRight"),
    ("mouth_upperLipRaise_left", "mouthUpperUpLeft"),
    ("mouth_upperLipRaise_right", "mouthUpperUpRight"),
    ("tongue_out_cor", "tongueOut"),
    ("brow_down_L", "browDownLeft"),
    ("brow_down_R", "browDownRight"),
    ("brow_raiseIn_L", "browInnerUp"),
    ("brow_raiseOuter_left", "browOuterUpLeft"),
    ("brow_raiseOuter_right", "browOuterUpRight"),
    ("cheek_blow_cor", "cheekPuff"),
    ("EcheekRaise_EsquintInner_L", "cheekSquintLeft"),
    ("EcheekRaise_EsquintInner_R", "cheekSquintRight"),
    ("nose_wrinkle_left", "noseSneerLeft"),
    ("nose_wrinkle_right", "noseSneerRight"),
    // Rotation parameters are driven by skeleton bones
    ("head", "headRoll"),
    ("FACIAL_L_Eye", "leftEyeRoll"),
    ("FACIAL_R_Eye", "rightEyeRoll"),
    ("LeftEye", "leftEyeRoll"),
    ("RightEye", "rightEyeRoll"),
];

// ─── Rule table ───────────────────────────────────────────────────────────────

/// One mapping rule; evaluation is ordered and the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingRule {
    /// Case-insensitive match against one canonical name.
    ExactMatch { canonical: &'static str },
    /// Rewrite a trailing vendor side marker to the canonical suffix, then
    /// re-test the result against the canonical table.
    SuffixSwap {
        raw_suffix: &'static str,
        canonical_suffix: &'static str,
    },
    /// Explicit synonym: one raw spelling resolves to one canonical name.
    PatternSubstitute {
        pattern: &'static str,
        canonical: &'static str,
    },
}

/// The ordered mapping rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<MappingRule>,
}

impl RuleTable {
    /// Build the standard table: exact matches for every canonical name,
    /// then suffix-convention rewrites, then the vendor synonym table.
    pub fn standard() -> Self {
        let mut rules = Vec::new();

        for canonical in FACIAL_BLENDSHAPES.iter().chain(ROTATION_PARAMETERS.iter()) {
            rules.push(MappingRule::ExactMatch { canonical });
        }
        for (raw_suffix, canonical_suffix) in SUFFIX_SWAPS {
            rules.push(MappingRule::SuffixSwap {
                raw_suffix,
                canonical_suffix,
            });
        }
        for (pattern, canonical) in PATTERN_SUBSTITUTES {
            rules.push(MappingRule::PatternSubstitute { pattern, canonical });
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Load-time self-check: every canonical name must be reachable from at
    /// least one rule, and every explicit rule target must be canonical.
    pub fn verify_coverage(&self, spec: &CanonicalSpec) -> Result<(), ConfigError> {
        for rule in &self.rules {
            let (pattern, canonical) = match rule {
                MappingRule::ExactMatch { canonical } => (*canonical, *canonical),
                MappingRule::SuffixSwap { .. } => continue,
                MappingRule::PatternSubstitute { pattern, canonical } => (*pattern, *canonical),
            };
            if spec.resolve(canonical).is_none() {
                return Err(ConfigError::UnknownRuleTarget {
                    pattern: pattern.to_string(),
                    canonical: canonical.to_string(),
                });
            }
        }

        for entry in spec.entries() {
            let reachable = self.rules.iter().any(|rule| match rule {
                MappingRule::ExactMatch { canonical }
                | MappingRule::PatternSubstitute { canonical, .. } => {
                    canonical.eq_ignore_ascii_case(entry.name)
                }
                MappingRule::SuffixSwap { .. } => false,
            });
            if !reachable {
                return Err(ConfigError::UnreachableCanonicalName {
                    name: entry.name.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Resolve one raw identifier to a canonical name, or `None` when no
    /// rule matches. Pure over `(identifier, rule table)`.
    pub fn resolve(&self, raw: &str, spec: &CanonicalSpec) -> Option<(&'static str, &MappingRule)> {
        self.rules.iter().find_map(|rule| {
            let canonical = match rule {
                MappingRule::ExactMatch { canonical } => {
                    raw.eq_ignore_ascii_case(canonical).then_some(*canonical)
                }
                MappingRule::SuffixSwap {
                    raw_suffix,
                    canonical_suffix,
                } => {
                    let candidate = swap_suffix(raw, raw_suffix, canonical_suffix)?;
                    spec.resolve(&candidate).map(|entry| entry.name)
                }
                MappingRule::PatternSubstitute { pattern, canonical } => {
                    raw.eq_ignore_ascii_case(pattern).then_some(*canonical)
                }
            };
            canonical.map(|canonical| (canonical, rule))
        })
    }
}

/// Rewrite a trailing vendor suffix, case-insensitively.
fn swap_suffix(raw: &str, raw_suffix: &str, canonical_suffix: &str) -> Option<String> {
    if raw.len() <= raw_suffix.len() {
        return None;
    }
    let split = raw.len() - raw_suffix.len();
    if !raw.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = raw.split_at(split);
    tail.eq_ignore_ascii_case(raw_suffix)
        .then(|| format!("{stem}{canonical_suffix}"))
}

// ─── Snapshot canonicalization ────────────────────────────────────────────────

/// Result of running the mapper over every identifier in a snapshot.
#[derive(Debug, Clone)]
pub struct CanonicalizedSnapshot {
    /// Canonical name to the raw identifiers that resolved to it; more than
    /// one raw per canonical is an ambiguity the structural validator
    /// rejects. BTreeMap keeps report ordering deterministic.
    pub resolved: BTreeMap<String, Vec<String>>,
    /// Raw morph identifiers no rule matched. Unmapped bone names are not
    /// tracked: rigs legitimately carry hundreds of non-facial bones.
    pub unmapped_morphs: Vec<String>,
}

impl CanonicalizedSnapshot {
    /// Flattened raw-to-canonical pairs for reporting.
    pub fn mapped_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .resolved
            .iter()
            .flat_map(|(canonical, raws)| {
                raws.iter()
                    .map(|raw| (raw.clone(), canonical.clone()))
            })
            .collect();
        pairs.sort();
        pairs
    }
}

/// Run the mapper over all raw identifiers of a snapshot.
pub fn canonicalize(
    snapshot: &AssetSnapshot,
    rules: &RuleTable,
    spec: &CanonicalSpec,
) -> CanonicalizedSnapshot {
    let mut resolved = BTreeMap::<String, Vec<String>>::new();
    let mut unmapped_morphs = Vec::new();

    for raw in &snapshot.morph_names {
        match rules.resolve(raw, spec) {
            Some((canonical, _)) => resolved
                .entry(canonical.to_string())
                .or_default()
                .push(raw.clone()),
            None => unmapped_morphs.push(raw.clone()),
        }
    }

    for raw in &snapshot.bone_names {
        if let Some((canonical, _)) = rules.resolve(raw, spec) {
            resolved
                .entry(canonical.to_string())
                .or_default()
                .push(raw.clone());
        }
    }

    CanonicalizedSnapshot {
        resolved,
        unmapped_morphs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CanonicalSpec {
        CanonicalSpec::standard().unwrap()
    }

    #[test]
    fn given_standard_rules_when_verifying_coverage_then_every_canonical_name_is_reachable() {
        let table = RuleTable::standard();
        table
            .verify_coverage(&spec())
            .expect("standard rule table must cover all 55 names");
    }

    #[test]
    fn given_canonical_spelling_when_resolving_then_exact_match_wins() {
        let table = RuleTable::standard();
        let (canonical, rule) = table.resolve("eyeBlinkLeft", &spec()).unwrap();

        assert_eq!(canonical, "eyeBlinkLeft");
        assert!(matches!(rule, MappingRule::ExactMatch { .. }));
    }

    #[test]
    fn given_uppercase_spelling_when_resolving_then_match_is_case_insensitive() {
        let table = RuleTable::standard();
        let (canonical, _) = table.resolve("MOUTHSMILELEFT", &spec()).unwrap();

        assert_eq!(canonical, "mouthSmileLeft");
    }

    #[test]
    fn given_side_marker_suffix_when_resolving_then_suffix_swap_applies() {
        let table = RuleTable::standard();

        let (canonical, rule) = table.resolve("mouthSmile_L", &spec()).unwrap();
        assert_eq!(canonical, "mouthSmileLeft");
        assert!(matches!(rule, MappingRule::SuffixSwap { .. }));

        let (canonical, _) = table.resolve("browOuterUp_right", &spec()).unwrap();
        assert_eq!(canonical, "browOuterUpRight");
    }

    #[test]
    fn given_vendor_spelling_when_resolving_then_synonym_table_applies() {
        let table = RuleTable::standard();

        let (canonical, rule) = table
            .resolve("head_lod0_mesh__eye_lookLeft_R", &spec())
            .unwrap();
        assert_eq!(canonical, "eyeLookOutRight");
        assert!(matches!(rule, MappingRule::PatternSubstitute { .. }));

        let (canonical, _) = table
            .resolve("teeth_lod0_mesh__tongue_out_cor", &spec())
            .unwrap();
        assert_eq!(canonical, "tongueOut");
    }

    #[test]
    fn given_unknown_identifier_when_resolving_then_no_rule_guesses() {
        let table = RuleTable::standard();

        assert!(table.resolve("cheekbone_flex_22", &spec()).is_none());
        assert!(table.resolve("", &spec()).is_none());
        // Suffix swap alone must not invent a canonical name
        assert!(table.resolve("earWiggle_L", &spec()).is_none());
    }

    #[test]
    fn given_head_and_eye_bones_when_canonicalizing_then_rotation_parameters_resolve() {
        let table = RuleTable::standard();
        let snapshot = AssetSnapshot {
            morph_names: vec!["jawOpen".to_string()],
            bone_names: vec![
                "head".to_string(),
                "FACIAL_L_Eye".to_string(),
                "FACIAL_R_Eye".to_string(),
                "spine_01".to_string(),
            ],
            vertex_count: 10_000,
            file_size_bytes: 2_000_000,
            container_bytes: None,
        };

        let canonical = canonicalize(&snapshot, &table, &spec());

        assert!(canonical.resolved.contains_key("headRoll"));
        assert!(canonical.resolved.contains_key("leftEyeRoll"));
        assert!(canonical.resolved.contains_key("rightEyeRoll"));
        // Non-facial rig bones are ignored, not reported as unmapped
        assert!(canonical.unmapped_morphs.is_empty());
    }

    #[test]
    fn given_two_spellings_of_one_control_when_canonicalizing_then_both_raws_are_kept() {
        let table = RuleTable::standard();
        let snapshot = AssetSnapshot {
            morph_names: vec!["jawOpen".to_string(), "jaw_open".to_string()],
            bone_names: vec![],
            vertex_count: 10_000,
            file_size_bytes: 2_000_000,
            container_bytes: None,
        };

        let canonical = canonicalize(&snapshot, &table, &spec());
        assert_eq!(canonical.resolved["jawOpen"].len(), 2);
    }
}
