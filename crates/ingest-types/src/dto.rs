//! Request and response DTOs for the ingestion HTTP API.

use serde::{Deserialize, Serialize};

use crate::{BatchStatus, IngestError, Priority};

/// Body of `POST /ingest`.
///
/// Fields are kept loosely typed so that a wrong shape is reported as an
/// invalid-input error instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub ids: Option<serde_json::Value>,
    #[serde(default)]
    pub priority: Option<serde_json::Value>,
}

impl IngestRequest {
    /// Check shape and return the identifier list and priority.
    pub fn validate(&self) -> Result<(Vec<i64>, Priority), IngestError> {
        let ids = match self.ids.as_ref().and_then(|v| v.as_array()) {
            Some(arr) if !arr.is_empty() => arr
                .iter()
                .map(|v| {
                    v.as_i64().ok_or_else(|| {
                        IngestError::InvalidInput(format!("id is not an integer: {}", v))
                    })
                })
                .collect::<Result<Vec<i64>, _>>()?,
            _ => return Err(IngestError::InvalidInput("Invalid input".to_string())),
        };
        let priority = match self.priority.as_ref().and_then(|v| v.as_str()) {
            Some(p) => p.parse::<Priority>()?,
            None => return Err(IngestError::InvalidInput("Invalid input".to_string())),
        };
        Ok((ids, priority))
    }
}

/// Response of a successful `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ingestion_id: String,
}

/// One batch in a status view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchView {
    pub batch_id: String,
    pub ids: Vec<i64>,
    pub status: BatchStatus,
}

/// Response of `GET /status/{ingestion_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ingestion_id: String,
    pub status: BatchStatus,
    pub batches: Vec<BatchView>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn req(v: serde_json::Value) -> IngestRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        let (ids, p) = req(json!({"ids": [1, 2, 3], "priority": "LOW"}))
            .validate()
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(p, Priority::Low);
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let bad = [
            json!({"priority": "HIGH"}),
            json!({"ids": [], "priority": "HIGH"}),
            json!({"ids": "1,2", "priority": "HIGH"}),
            json!({"ids": [1, "x"], "priority": "HIGH"}),
            json!({"ids": [1]}),
            json!({"ids": [1], "priority": "NOW"}),
            json!({"ids": [1], "priority": 1}),
        ];
        for body in bad {
            let err = req(body.clone()).validate().unwrap_err();
            assert!(
                matches!(err, IngestError::InvalidInput(_)),
                "expected InvalidInput for {}",
                body
            );
        }
    }
}
