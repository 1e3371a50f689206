//! Canonical byte forms and content addressing.
//!
//! Everything the registry hashes goes through one of two canonicalization
//! rules before it touches a digest:
//! - structured payloads: compact JSON with sorted keys, UTF-8
//! - text payloads: LF line endings, trailing whitespace stripped per line,
//!   leading/trailing blank lines dropped
//!
//! Both rules are pure functions over the payload bytes. File-system
//! metadata (mtime, path, permissions) never participates, so the same
//! content hashes identically on every platform.

#![deny(unsafe_code)]

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Canonical JSON byte form: compact separators, sorted keys, UTF-8.
///
/// `serde_json` keeps object keys in a sorted map, so two structurally
/// equal documents produce identical bytes regardless of original key
/// order or formatting.
pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    // Infallible for Value: no non-string keys, no foreign Serialize impls.
    serde_json::to_vec(value).expect("serializing serde_json::Value cannot fail")
}

/// Hex-encoded SHA-256 of the canonical JSON form of `value`.
pub fn hash_json(value: &Value) -> String {
    sha256_hex(&canonical_json_bytes(value))
}

/// Canonical text form: CRLF and lone CR normalized to LF, trailing
/// whitespace stripped from every line, leading/trailing blank lines
/// removed.
pub fn canonical_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let normalized = unified
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    normalized.trim_matches('\n').to_string()
}

/// Canonical text form as UTF-8 bytes.
pub fn canonical_text_bytes(text: &str) -> Vec<u8> {
    canonical_text(text).into_bytes()
}

/// Hex-encoded SHA-256 of the canonical text form of `text`.
pub fn hash_text(text: &str) -> String {
    sha256_hex(&canonical_text_bytes(text))
}

/// Resolve an RFC 6901 JSON pointer inside `root`.
///
/// The empty pointer addresses the whole document. Returns `None` for a
/// malformed pointer or a path that does not exist.
pub fn slice_at_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    root.pointer(pointer)
}

/// Hex-encoded SHA-256 of the canonical JSON form of the value addressed
/// by `pointer` inside `root`.
pub fn hash_slice(root: &Value, pointer: &str) -> Option<String> {
    slice_at_pointer(root, pointer).map(hash_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_hash_independent_of_key_order() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": {"y": 2, "x": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": {"x": 3, "y": 2}, "b": 1}"#).unwrap();
        assert_eq!(hash_json(&a), hash_json(&b));
    }

    #[test]
    fn json_hash_independent_of_formatting() {
        let a: Value = serde_json::from_str("{\"k\":  [1,\n 2,\t3]}").unwrap();
        let b: Value = serde_json::from_str(r#"{"k":[1,2,3]}"#).unwrap();
        assert_eq!(hash_json(&a), hash_json(&b));
    }

    #[test]
    fn json_hash_sees_content_changes() {
        assert_ne!(hash_json(&json!({"k": 1})), hash_json(&json!({"k": 2})));
    }

    #[test]
    fn canonical_json_keeps_non_ascii_unescaped() {
        let value = json!({"name": "ré"});
        let bytes = canonical_json_bytes(&value);
        assert_eq!(bytes, "{\"name\":\"ré\"}".as_bytes());
    }

    #[test]
    fn text_hash_ignores_line_ending_convention() {
        assert_eq!(hash_text("a\r\nb\r\nc"), hash_text("a\nb\nc"));
        assert_eq!(hash_text("a\rb"), hash_text("a\nb"));
    }

    #[test]
    fn text_hash_ignores_trailing_whitespace() {
        assert_eq!(hash_text("line one   \nline two\t"), hash_text("line one\nline two"));
    }

    #[test]
    fn text_hash_ignores_leading_and_trailing_blank_lines() {
        assert_eq!(hash_text("\n\nbody\n\n\n"), hash_text("body"));
        assert_eq!(hash_text("body\n"), hash_text("body"));
    }

    #[test]
    fn text_hash_preserves_interior_blank_lines() {
        assert_ne!(hash_text("a\n\nb"), hash_text("a\nb"));
    }

    #[test]
    fn text_hash_sees_content_changes() {
        assert_ne!(hash_text("alpha"), hash_text("beta"));
    }

    #[test]
    fn empty_pointer_addresses_whole_document() {
        let doc = json!({"metrics": {"tau": 1.5}});
        assert_eq!(slice_at_pointer(&doc, ""), Some(&doc));
    }

    #[test]
    fn pointer_addresses_nested_values() {
        let doc = json!({"metrics": {"tau": [1, 2, 3]}});
        assert_eq!(
            slice_at_pointer(&doc, "/metrics/tau/1"),
            Some(&json!(2))
        );
        assert!(slice_at_pointer(&doc, "/metrics/missing").is_none());
        assert!(slice_at_pointer(&doc, "metrics").is_none());
    }

    #[test]
    fn slice_hash_matches_direct_hash_of_value() {
        let doc = json!({"summary": {"status": "pass", "n": 4}});
        let direct = hash_json(&json!({"status": "pass", "n": 4}));
        assert_eq!(hash_slice(&doc, "/summary"), Some(direct));
    }

    #[test]
    fn sha256_matches_known_vector() {
        // sha256("") is a fixed constant; guards against accidental digest swaps.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn text_canonicalization_is_idempotent(s in "\\PC*") {
                let once = canonical_text(&s);
                prop_assert_eq!(canonical_text(&once), once);
            }

            #[test]
            fn text_hash_stable_under_crlf_rewrite(s in "[a-z \\n]{0,64}") {
                let crlf = s.replace('\n', "\r\n");
                prop_assert_eq!(hash_text(&crlf), hash_text(&s));
            }
        }

        #[test]
        fn json_canonicalization_is_idempotent() {
            let doc = serde_json::json!({"z": [1, {"b": 2, "a": 3}], "a": "x"});
            let once = canonical_json_bytes(&doc);
            let reparsed: Value = serde_json::from_slice(&once).unwrap();
            assert_eq!(canonical_json_bytes(&reparsed), once);
        }
    }
}
