use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::json;

use crate::outcall::{self, OutcallError};
use crate::retrieval::ports::RetrievalPort;
use crate::retrieval::types::RetrievalReply;

/// HTTP client for the knowledge retrieval service.
#[derive(Clone)]
pub struct HttpRetrievalClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    deadline: Duration,
}

impl HttpRetrievalClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, deadline: Duration) -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client must build"),
            base_url: base_url.into(),
            api_key,
            deadline,
        }
    }
}

#[async_trait]
impl RetrievalPort for HttpRetrievalClient {
    async fn query(&self, question: &str, dataset_id: &str) -> Result<RetrievalReply, OutcallError> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        let body = json!({
            "question": question,
            "dataset_id": dataset_id,
        });
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let deadline = self.deadline;
        let dataset = dataset_id.to_string();

        outcall::bounded("retrieval", deadline, async move {
            let started_at = Instant::now();
            let mut req_builder = client
                .post(&url)
                .timeout(deadline)
                .header(header::CONTENT_TYPE, "application/json")
                .json(&body);
            if let Some(api_key) = api_key {
                req_builder = req_builder.header(header::AUTHORIZATION, format!("Bearer {api_key}"));
            }

            let response = req_builder.send().await.map_err(outcall::request_failed)?;
            let status = response.status();
            tracing::debug!(
                target: "retrieval",
                status = status.as_u16(),
                dataset_id = %dataset,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "retrieval_http_headers"
            );

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(outcall::status_error(status.as_u16(), &text));
            }

            response
                .json::<RetrievalReply>()
                .await
                .map_err(outcall::request_failed)
        })
        .await
    }
}
