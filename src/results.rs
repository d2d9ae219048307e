//! Cached analysis results and their reuse check.
//!
//! Optional analysis modules store their output between runs; before re-running
//! they ask whether the stored result still belongs to the record at hand.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A previously computed per-record analysis result.
pub trait ModuleResult {
    /// Identifier of the record this result was computed for.
    fn record_id(&self) -> &str;

    /// Whether this result can be reused for `record_id` instead of
    /// recomputing.
    fn is_valid_for(&self, record_id: &str) -> bool {
        self.record_id() == record_id
    }
}

/// JSON-backed result envelope binding a payload to its source record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResult<T> {
    pub record_id: String,
    pub payload: T,
}

impl<T> CachedResult<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(record_id: &str, payload: T) -> Self {
        Self {
            record_id: record_id.to_string(),
            payload,
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::Format(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::Parse(format!("malformed cached result: {e}")))
    }
}

impl<T> ModuleResult for CachedResult<T> {
    fn record_id(&self) -> &str {
        &self.record_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_check() {
        let result = CachedResult::new("NC_000001.11", vec![3, 20, 41]);
        assert!(result.is_valid_for("NC_000001.11"));
        assert!(!result.is_valid_for("NC_000002.12"));
    }

    #[test]
    fn json_round_trip() {
        let result = CachedResult::new("ctg1", vec![0.1, 0.7]);
        let json = result.to_json().unwrap();
        let back: CachedResult<Vec<f64>> = CachedResult::from_json(&json).unwrap();
        assert_eq!(back.record_id, "ctg1");
        assert_eq!(back.payload, vec![0.1, 0.7]);
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(CachedResult::<Vec<u32>>::from_json("{not json").is_err());
    }
}
