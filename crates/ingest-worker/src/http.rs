//! HTTP fetcher: `GET {base_url}/{id}` against an external service.

use ingest_types::{FetchWorker, WorkerError};

pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpFetcher {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build from `INGEST_FETCH_URL` / `INGEST_FETCH_API_KEY`; `None` if no URL is set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("INGEST_FETCH_URL").ok()?;
        let api_key = std::env::var("INGEST_FETCH_API_KEY").ok();
        Some(Self::new(url, api_key))
    }

    fn url_for(&self, id: i64) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

#[async_trait::async_trait]
impl FetchWorker for HttpFetcher {
    async fn fetch(&self, id: i64) -> Result<serde_json::Value, WorkerError> {
        let mut req = self.client.get(self.url_for(id));
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.map_err(|e| WorkerError::Failed {
            id,
            reason: e.to_string(),
        })?;
        let status = res.status();
        let body = res.text().await.map_err(|e| WorkerError::Failed {
            id,
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(WorkerError::Failed {
                id,
                reason: format!("upstream error {}: {}", status, body),
            });
        }
        if body.trim().is_empty() {
            return Ok(serde_json::json!({ "id": id }));
        }
        serde_json::from_str(&body).map_err(|e| WorkerError::Failed {
            id,
            reason: format!("invalid JSON body: {}", e),
        })
    }
}
