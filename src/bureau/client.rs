use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;

use crate::bureau::ports::BureauPort;
use crate::bureau::types::{BureauReply, RestrictionReport};
use crate::outcall::{self, OutcallError};

/// HTTP client for the external restriction registry.
#[derive(Clone)]
pub struct HttpBureauClient {
    client: Client,
    base_url: String,
    deadline: Duration,
}

impl HttpBureauClient {
    pub fn new(base_url: impl Into<String>, deadline: Duration) -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client must build"),
            base_url: base_url.into(),
            deadline,
        }
    }
}

#[async_trait]
impl BureauPort for HttpBureauClient {
    async fn check_restrictions(&self, document_id: &str) -> Result<BureauReply, OutcallError> {
        let url = format!(
            "{}/restrictions/{}",
            self.base_url.trim_end_matches('/'),
            document_id
        );
        let client = self.client.clone();
        let deadline = self.deadline;

        outcall::bounded("bureau", deadline, async move {
            let started_at = Instant::now();
            let response = client
                .get(&url)
                .timeout(deadline)
                .header(header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(outcall::request_failed)?;

            let status = response.status();
            tracing::debug!(
                target: "bureau",
                status = status.as_u16(),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                url = %url,
                "bureau_http_headers"
            );

            if status == StatusCode::NOT_FOUND {
                return Ok(BureauReply::NotFound);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(outcall::status_error(status.as_u16(), &body));
            }

            let raw = response
                .json::<Value>()
                .await
                .map_err(outcall::request_failed)?;
            Ok(BureauReply::Report(decode_report(raw)?))
        })
        .await
    }
}

fn decode_report(raw: Value) -> Result<RestrictionReport, OutcallError> {
    let has_restriction = raw
        .get("has_restriction")
        .and_then(Value::as_bool)
        .ok_or_else(|| outcall::malformed("bureau reply lacks a boolean 'has_restriction'"))?;
    let name = raw.get("name").and_then(Value::as_str).map(str::to_string);
    let document_id = raw
        .get("document_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(RestrictionReport {
        has_restriction,
        name,
        document_id,
        raw,
    })
}
