//! GA4GH digest computation: canonical JSON + truncated SHA-512, base64url.
//!
//! Mirrors the `sha512t24u` scheme used throughout the GA4GH VRS/refget
//! ecosystem: SHA-512 of the canonical JSON encoding of an object,
//! truncated to the first 24 bytes, base64url-encoded without padding.
//! Two objects with equal canonical encodings share a digest by
//! construction (spec.md §3 invariant 1).

use sha2::{Digest, Sha512};

/// Serialize `value` to canonical JSON: object keys sorted lexicographically,
/// no insignificant whitespace. `serde_json::Value`'s `BTreeMap`-backed
/// object representation already sorts keys on `Serialize`, so a compact
/// `to_string` is canonical as long as the `preserve_order` feature (which
/// would use insertion order instead) is not relied upon for this path.
pub fn canonicalize_json(value: &serde_json::Value) -> String {
    fn sort(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let mut sorted: std::collections::BTreeMap<String, serde_json::Value> =
                    std::collections::BTreeMap::new();
                for (k, v) in map {
                    sorted.insert(k.clone(), sort(v));
                }
                let mut out = serde_json::Map::new();
                for (k, v) in sorted {
                    out.insert(k, v);
                }
                serde_json::Value::Object(out)
            }
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(sort).collect())
            }
            other => other.clone(),
        }
    }
    serde_json::to_string(&sort(value)).expect("serializing a Value cannot fail")
}

/// SHA-512 truncated to the first 24 bytes, base64url-encoded without padding.
pub fn sha512t24u(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let hash = hasher.finalize();
    base64_url::encode(&hash[..24])
}

/// Compute the digest of a canonical-JSON-encodable object.
pub fn digest_of(value: &serde_json::Value) -> String {
    sha512t24u(canonicalize_json(value).as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn canonicalize_sorts_keys() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonicalize_json(&a), canonicalize_json(&b));
    }

    #[test]
    fn digest_is_deterministic() {
        let value = json!({"end": 87894077, "start": 87894076, "type": "SequenceLocation"});
        assert_eq!(digest_of(&value), digest_of(&value));
        assert_eq!(digest_of(&value).len(), 32);
    }

    #[test]
    fn digest_differs_on_content_change() {
        let a = json!({"start": 1, "end": 2});
        let b = json!({"start": 1, "end": 3});
        assert_ne!(digest_of(&a), digest_of(&b));
    }
}
