use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::outcall::OutcallError;

pub const DEFAULT_RECIPIENT: &str = "analista@empresa.com";
pub const COMPLETED_SUBJECT: &str = "Análise de Risco Concluída";

/// Notification emitted when an analysis finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn send(&self, notification: &NotificationRecord) -> Result<(), OutcallError>;
}

/// Notifier that records the delivery in the structured log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifierPort for LogNotifier {
    async fn send(&self, notification: &NotificationRecord) -> Result<(), OutcallError> {
        tracing::info!(
            target: "notify",
            recipient = %notification.recipient,
            subject = %notification.subject,
            "notification_sent"
        );
        Ok(())
    }
}
