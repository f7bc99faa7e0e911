use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Fingerprint used for tasks that have no cache key.
pub const UNKEYED_FINGERPRINT: &str = "····";

/// Canonical JSON text: recursively sorted object keys, compact
/// separators. Two structurally equal values always produce the same
/// text regardless of construction order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut names: Vec<&String> = map.keys().collect();
            names.sort();
            out.push('{');
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*name).clone()).to_string());
                out.push(':');
                write_canonical(&map[*name], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// SHA-256 hex digest of the canonical JSON form of the selected
/// argument values.
pub fn cache_key(values: &Map<String, Value>) -> String {
    let canonical = canonical_json(&Value::Object(values.clone()));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short human-scannable fingerprint for a cache key: the first four
/// key bytes mapped into the U+1F300 pictogram block.
pub fn fingerprint(key: &str) -> String {
    let mut out = String::new();
    for i in 0..4 {
        let byte = key
            .get(i * 2..i * 2 + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok());
        match byte.and_then(|b| char::from_u32(0x1F300 + b as u32)) {
            Some(c) => out.push(c),
            None => return UNKEYED_FINGERPRINT.to_string(),
        }
    }
    out
}
