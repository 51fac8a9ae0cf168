//! Binary container validator.
//!
//! The one place raw bytes are interpreted directly: verifies the packaged
//! GLB scene file's header and chunk structure, and that the JSON chunk's
//! scene-graph index references resolve within bounds. All issues are
//! errors; byte-level ambiguity is fatal for the stage, never a warning.

use serde_json::Value;

use crate::validate::types::ValidationIssue;

// ─── Container constants ──────────────────────────────────────────────────────

/// ASCII "glTF", little-endian.
pub const CONTAINER_MAGIC: u32 = 0x4654_6C67;
/// Only container version 2 is supported.
pub const SUPPORTED_VERSION: u32 = 2;
/// ASCII "JSON", little-endian.
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;
/// ASCII "BIN\0", little-endian.
pub const CHUNK_TYPE_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

// ─── Issue codes ──────────────────────────────────────────────────────────────

pub const INVALID_MAGIC: &str = "INVALID_MAGIC";
pub const UNSUPPORTED_VERSION: &str = "UNSUPPORTED_VERSION";
pub const LENGTH_MISMATCH: &str = "LENGTH_MISMATCH";
pub const MALFORMED_JSON_CHUNK_HEADER: &str = "MALFORMED_JSON_CHUNK_HEADER";
pub const MALFORMED_JSON: &str = "MALFORMED_JSON";
pub const DANGLING_REFERENCE: &str = "DANGLING_REFERENCE";
pub const MALFORMED_BIN_CHUNK: &str = "MALFORMED_BIN_CHUNK";

// ─── Validator ────────────────────────────────────────────────────────────────

/// Verify a packaged binary scene buffer.
///
/// Checks run in container order and stop at the first structural failure:
/// once the header or a chunk header is invalid, nothing after it is parsed.
/// Dangling scene-graph references are content defects, not structural ones;
/// they are all collected and the trailing binary chunk is still checked.
pub fn check(bytes: &[u8], stage: &str) -> Vec<ValidationIssue> {
    let fail = |code: &str, message: String| vec![ValidationIssue::error(stage, code, message)];

    if bytes.len() < HEADER_LEN || read_u32_le(bytes, 0) != Some(CONTAINER_MAGIC) {
        return fail(
            INVALID_MAGIC,
            format!(
                "invalid magic at offset 0: expected 0x{:08X} ('glTF'), buffer is {} bytes",
                CONTAINER_MAGIC,
                bytes.len()
            ),
        );
    }

    let version = read_u32_le(bytes, 4).unwrap_or_default();
    if version != SUPPORTED_VERSION {
        return fail(
            UNSUPPORTED_VERSION,
            format!("unsupported version {version} at offset 4 (expected {SUPPORTED_VERSION})"),
        );
    }

    let declared_length = read_u32_le(bytes, 8).unwrap_or_default() as usize;
    if declared_length != bytes.len() {
        return fail(
            LENGTH_MISMATCH,
            format!(
                "length mismatch at offset 8: header declares {declared_length} bytes, buffer is {} bytes",
                bytes.len()
            ),
        );
    }

    let (Some(json_length), Some(json_type)) = (
        read_u32_le(bytes, HEADER_LEN),
        read_u32_le(bytes, HEADER_LEN + 4),
    ) else {
        return fail(
            MALFORMED_JSON_CHUNK_HEADER,
            format!("truncated JSON chunk header at offset {HEADER_LEN}"),
        );
    };
    let json_length = json_length as usize;
    let json_start = HEADER_LEN + CHUNK_HEADER_LEN;

    if json_type != CHUNK_TYPE_JSON {
        return fail(
            MALFORMED_JSON_CHUNK_HEADER,
            format!(
                "first chunk type at offset {} is 0x{:08X}, expected 0x{:08X} ('JSON')",
                HEADER_LEN + 4,
                json_type,
                CHUNK_TYPE_JSON
            ),
        );
    }
    if json_length % 4 != 0 || json_start + json_length > bytes.len() {
        return fail(
            MALFORMED_JSON_CHUNK_HEADER,
            format!(
                "JSON chunk length {json_length} at offset {HEADER_LEN} is not a multiple of 4 or overruns the buffer"
            ),
        );
    }

    let json: Value = match serde_json::from_slice(&bytes[json_start..json_start + json_length]) {
        Ok(json) => json,
        Err(err) => {
            return fail(
                MALFORMED_JSON,
                format!("JSON chunk at offset {json_start} does not parse: {err}"),
            );
        }
    };

    let mut issues = check_references(&json, stage);

    let bin_start = json_start + json_length;
    if bin_start < bytes.len() {
        issues.extend(check_bin_chunk(bytes, bin_start, stage));
    }

    issues
}

/// Verify the trailing binary-buffer chunk's header and byte span.
fn check_bin_chunk(bytes: &[u8], offset: usize, stage: &str) -> Vec<ValidationIssue> {
    let fail = |message: String| {
        vec![ValidationIssue::error(
            stage,
            MALFORMED_BIN_CHUNK,
            message,
        )]
    };

    let (Some(bin_length), Some(bin_type)) =
        (read_u32_le(bytes, offset), read_u32_le(bytes, offset + 4))
    else {
        return fail(format!("truncated binary chunk header at offset {offset}"));
    };

    if bin_type != CHUNK_TYPE_BIN {
        return fail(format!(
            "second chunk type at offset {} is 0x{:08X}, expected 0x{:08X} ('BIN\\0')",
            offset + 4,
            bin_type,
            CHUNK_TYPE_BIN
        ));
    }

    let actual_span = bytes.len() - offset - CHUNK_HEADER_LEN;
    if bin_length as usize != actual_span {
        return fail(format!(
            "binary chunk at offset {offset} declares {bin_length} bytes, actual span is {actual_span}"
        ));
    }

    Vec::new()
}

// ─── Scene-graph reference integrity ──────────────────────────────────────────

/// Check that every node/mesh/accessor/buffer-view index reference in the
/// scene graph resolves within bounds.
fn check_references(json: &Value, stage: &str) -> Vec<ValidationIssue> {
    let count_of = |key: &str| {
        json.get(key)
            .and_then(Value::as_array)
            .map(|array| array.len())
            .unwrap_or(0)
    };
    let node_count = count_of("nodes");
    let mesh_count = count_of("meshes");
    let accessor_count = count_of("accessors");
    let buffer_view_count = count_of("bufferViews");
    let scene_count = count_of("scenes");

    let mut issues = Vec::new();
    let mut dangling = |field: String, index: u64, limit: usize| {
        issues.push(ValidationIssue::error(
            stage,
            DANGLING_REFERENCE,
            format!("dangling reference: {field} = {index}, only {limit} defined"),
        ));
    };

    if let Some(scene) = json.get("scene").and_then(Value::as_u64)
        && scene as usize >= scene_count
    {
        dangling("scene".to_string(), scene, scene_count);
    }

    for (scene_index, scene) in iter_array(json, "scenes") {
        for root in scene
            .get("nodes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_u64)
        {
            if root as usize >= node_count {
                dangling(format!("scenes[{scene_index}].nodes"), root, node_count);
            }
        }
    }

    for (node_index, node) in iter_array(json, "nodes") {
        for child in node
            .get("children")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_u64)
        {
            if child as usize >= node_count {
                dangling(format!("nodes[{node_index}].children"), child, node_count);
            }
        }
        if let Some(mesh) = node.get("mesh").and_then(Value::as_u64)
            && mesh as usize >= mesh_count
        {
            dangling(format!("nodes[{node_index}].mesh"), mesh, mesh_count);
        }
    }

    for (mesh_index, mesh) in iter_array(json, "meshes") {
        for (primitive_index, primitive) in iter_array(mesh, "primitives") {
            let location = format!("meshes[{mesh_index}].primitives[{primitive_index}]");

            for accessor in primitive
                .get("attributes")
                .and_then(Value::as_object)
                .into_iter()
                .flat_map(|attributes| attributes.values())
                .filter_map(Value::as_u64)
            {
                if accessor as usize >= accessor_count {
                    dangling(format!("{location}.attributes"), accessor, accessor_count);
                }
            }

            if let Some(indices) = primitive.get("indices").and_then(Value::as_u64)
                && indices as usize >= accessor_count
            {
                dangling(format!("{location}.indices"), indices, accessor_count);
            }

            // Morph target attribute accessors
            for target in primitive
                .get("targets")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                for accessor in target
                    .as_object()
                    .into_iter()
                    .flat_map(|attributes| attributes.values())
                    .filter_map(Value::as_u64)
                {
                    if accessor as usize >= accessor_count {
                        dangling(format!("{location}.targets"), accessor, accessor_count);
                    }
                }
            }
        }
    }

    for (accessor_index, accessor) in iter_array(json, "accessors") {
        if let Some(buffer_view) = accessor.get("bufferView").and_then(Value::as_u64)
            && buffer_view as usize >= buffer_view_count
        {
            dangling(
                format!("accessors[{accessor_index}].bufferView"),
                buffer_view,
                buffer_view_count,
            );
        }
    }

    issues
}

fn iter_array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = (usize, &'a Value)> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(slice.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a well-formed container around the given JSON document.
    fn build_container(json: &Value, bin: Option<&[u8]>) -> Vec<u8> {
        let mut payload = serde_json::to_vec(json).unwrap();
        while payload.len() % 4 != 0 {
            payload.push(b' ');
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&SUPPORTED_VERSION.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // patched below
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
        bytes.extend_from_slice(&payload);
        if let Some(bin) = bin {
            bytes.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
            bytes.extend_from_slice(bin);
        }

        let total = bytes.len() as u32;
        bytes[8..12].copy_from_slice(&total.to_le_bytes());
        bytes
    }

    fn minimal_scene() -> Value {
        serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [ { "nodes": [0] } ],
            "nodes": [ { "mesh": 0, "children": [1] }, {} ],
            "meshes": [ {
                "primitives": [ {
                    "attributes": { "POSITION": 0 },
                    "indices": 1,
                    "targets": [ { "POSITION": 2 } ]
                } ]
            } ],
            "accessors": [
                { "bufferView": 0 },
                { "bufferView": 0 },
                { "bufferView": 0 }
            ],
            "bufferViews": [ {} ]
        })
    }

    #[test]
    fn given_well_formed_container_when_checking_then_no_issues_are_raised() {
        let bytes = build_container(&minimal_scene(), Some(&[0u8; 16]));
        let issues = check(&bytes, "package");
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn given_wrong_magic_when_checking_then_single_error_and_no_further_parsing() {
        // Everything after the magic is garbage; a validator that kept
        // parsing would report more than one issue.
        let mut bytes = build_container(&minimal_scene(), None);
        bytes[0..4].copy_from_slice(b"FOOO");
        bytes[4] = 0xFF; // also corrupt the version field

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, INVALID_MAGIC);
    }

    #[test]
    fn given_short_buffer_when_checking_then_magic_error_is_raised() {
        let issues = check(b"glTF", "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, INVALID_MAGIC);
    }

    #[test]
    fn given_unsupported_version_when_checking_then_version_error_is_raised() {
        let mut bytes = build_container(&minimal_scene(), None);
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes());

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, UNSUPPORTED_VERSION);
    }

    #[test]
    fn given_declared_length_off_by_fifty_when_checking_then_length_mismatch_is_raised() {
        let mut bytes = build_container(&minimal_scene(), None);
        let wrong = (bytes.len() + 50) as u32;
        bytes[8..12].copy_from_slice(&wrong.to_le_bytes());

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, LENGTH_MISMATCH);
        assert!(issues[0].message.contains(&format!("{wrong}")));
    }

    #[test]
    fn given_first_chunk_not_json_typed_when_checking_then_chunk_header_error_is_raised() {
        let mut bytes = build_container(&minimal_scene(), None);
        bytes[16..20].copy_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, MALFORMED_JSON_CHUNK_HEADER);
    }

    #[test]
    fn given_json_length_not_multiple_of_four_when_checking_then_chunk_header_error_is_raised() {
        let mut bytes = build_container(&minimal_scene(), None);
        let declared = read_u32_le(&bytes, 12).unwrap();
        bytes[12..16].copy_from_slice(&(declared - 1).to_le_bytes());

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, MALFORMED_JSON_CHUNK_HEADER);
    }

    #[test]
    fn given_unparseable_json_chunk_when_checking_then_json_error_is_raised() {
        let mut bytes = build_container(&minimal_scene(), None);
        bytes[20] = b'{';
        bytes[21] = b'{';

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, MALFORMED_JSON);
    }

    #[test]
    fn given_out_of_bounds_references_when_checking_then_every_dangling_index_is_reported() {
        let mut scene = minimal_scene();
        scene["nodes"][0]["mesh"] = serde_json::json!(7);
        scene["meshes"][0]["primitives"][0]["indices"] = serde_json::json!(9);
        let bytes = build_container(&scene, None);

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|issue| issue.code == DANGLING_REFERENCE));
        assert!(issues[0].message.contains("nodes[0].mesh"));
        assert!(issues[1].message.contains("indices"));
    }

    #[test]
    fn given_bin_chunk_with_wrong_declared_length_when_checking_then_bin_error_is_raised() {
        let mut bytes = build_container(&minimal_scene(), Some(&[0u8; 16]));
        let bin_header = bytes.len() - 16 - 8;
        bytes[bin_header..bin_header + 4].copy_from_slice(&99u32.to_le_bytes());

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, MALFORMED_BIN_CHUNK);
    }

    #[test]
    fn given_second_chunk_with_json_type_when_checking_then_bin_error_is_raised() {
        let mut bytes = build_container(&minimal_scene(), Some(&[0u8; 16]));
        let bin_header = bytes.len() - 16 - 8;
        bytes[bin_header + 4..bin_header + 8].copy_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());

        let issues = check(&bytes, "package");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, MALFORMED_BIN_CHUNK);
    }
}
