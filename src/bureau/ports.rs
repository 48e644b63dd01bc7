use async_trait::async_trait;

use crate::bureau::types::BureauReply;
use crate::outcall::OutcallError;

/// Restriction registry consumed by the risk-scoring stage.
#[async_trait]
pub trait BureauPort: Send + Sync {
    async fn check_restrictions(&self, document_id: &str) -> Result<BureauReply, OutcallError>;
}
