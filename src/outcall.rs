use std::fmt;
use std::future::Future;

use tokio::time::{Duration, timeout};

const BODY_SNIPPET_LIMIT: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcallErrorKind {
    /// The deadline elapsed before the service answered.
    Timeout,
    /// The request never produced an HTTP response.
    Transport,
    /// The service answered with a non-success status.
    Status,
    /// The response arrived but its payload could not be decoded.
    Malformed,
}

/// Failure of one bounded call to an external service.
///
/// Every service client funnels its failures through this one type, so call
/// sites apply a single degraded path per service no matter how the call
/// failed.
#[derive(Debug, Clone)]
pub struct OutcallError {
    pub kind: OutcallErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl OutcallError {
    pub fn new(kind: OutcallErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for OutcallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OutcallError {}

/// Runs one external call under a hard deadline.
pub async fn bounded<T, F>(service: &str, deadline: Duration, call: F) -> Result<T, OutcallError>
where
    F: Future<Output = Result<T, OutcallError>>,
{
    match timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(format!(
            "{service} call timed out after {}ms",
            deadline.as_millis()
        ))),
    }
}

pub fn timed_out(message: impl Into<String>) -> OutcallError {
    OutcallError::new(OutcallErrorKind::Timeout, message)
}

pub fn transport(message: impl Into<String>) -> OutcallError {
    OutcallError::new(OutcallErrorKind::Transport, message)
}

pub fn malformed(message: impl Into<String>) -> OutcallError {
    OutcallError::new(OutcallErrorKind::Malformed, message)
}

pub fn status_error(status: u16, body: &str) -> OutcallError {
    let snippet = body.chars().take(BODY_SNIPPET_LIMIT).collect::<String>();
    let message = if snippet.is_empty() {
        format!("service returned status {status}")
    } else {
        format!("service returned status {status}: {snippet}")
    };
    OutcallError::new(OutcallErrorKind::Status, message).with_status(status)
}

pub fn request_failed(err: reqwest::Error) -> OutcallError {
    if err.is_timeout() {
        timed_out(format!("request timed out: {err}"))
    } else if err.is_decode() {
        malformed(format!("response body could not be decoded: {err}"))
    } else {
        transport(format!("request failed: {err}"))
    }
}
