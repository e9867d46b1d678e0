//! Row codec for bulk table import and export.
//!
//! A table row is a `(Key, Value)` pair of strings: the key is the source
//! text, the value is the vector rendered as a JSON array
//! (e.g. `"[0.25,-1.0,3.5]"`). Container formats are the caller's concern;
//! this module only maps rows to and from store entries.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::EmbeddingStore;

/// One exported `(text, vector)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Render a vector as a JSON array string.
pub fn encode_vector(key: &str, vector: &[f32]) -> Result<String> {
    serde_json::to_string(vector).map_err(|e| Error::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a JSON array string back into a vector.
pub fn decode_vector(key: &str, value: &str) -> Result<Vec<f32>> {
    serde_json::from_str::<Vec<f32>>(value.trim()).map_err(|e| Error::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Decode every row, failing on the first malformed value.
///
/// The result feeds straight into [`EmbeddingStore::bulk_load`].
pub fn decode_rows(rows: &[TableRow]) -> Result<Vec<(String, Vec<f32>)>> {
    rows.iter()
        .map(|row| Ok((row.key.clone(), decode_vector(&row.key, &row.value)?)))
        .collect()
}

impl EmbeddingStore {
    /// Export entries as rows, in insertion order.
    pub fn to_rows(&self) -> Result<Vec<TableRow>> {
        self.entries()
            .map(|e| {
                Ok(TableRow {
                    key: e.text.clone(),
                    value: encode_vector(&e.text, &e.vector)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_vector() {
        assert_eq!(encode_vector("k", &[0.25, -1.0, 3.5]).unwrap(), "[0.25,-1.0,3.5]");
        assert_eq!(encode_vector("k", &[]).unwrap(), "[]");
        let v = decode_vector("k", &encode_vector("k", &[1.0 / 3.0]).unwrap()).unwrap();
        assert_eq!(v, vec![1.0 / 3.0]);
    }

    #[test]
    fn test_decode_accepts_json_stringify_output() {
        let v = decode_vector("k", "[-0.0061, 0.0123, 1e-3]").unwrap();
        assert_eq!(v.len(), 3);
        assert!((v[2] - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_decode_failure_names_key() {
        let err = decode_vector("my doc", "not a vector").unwrap_err();
        match err {
            Error::Decode { key, .. } => assert_eq!(key, "my doc"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rows_reload_into_fresh_store() {
        let mut store = EmbeddingStore::new();
        store.insert("alpha", vec![0.1, -0.2, 0.3]).unwrap();
        store.insert("beta", vec![1.0 / 3.0, 2.5e-5, -7.0]).unwrap();

        let rows = store.to_rows().unwrap();
        assert_eq!(rows[0].key, "alpha");

        let mut reloaded = EmbeddingStore::new();
        reloaded.bulk_load(decode_rows(&rows).unwrap()).unwrap();

        assert_eq!(reloaded.len(), store.len());
        for entry in store.entries() {
            let other = reloaded.get(&entry.text).unwrap();
            for (a, b) in entry.vector.iter().zip(other) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_row_serde_uses_key_value_columns() {
        let row = TableRow {
            key: "k".to_string(),
            value: "[1]".to_string(),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"Key":"k","Value":"[1]"}"#);
    }
}
