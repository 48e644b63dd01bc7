use async_trait::async_trait;

use crate::outcall::OutcallError;
use crate::retrieval::types::RetrievalReply;

/// Knowledge-base search consumed by the policy stage.
#[async_trait]
pub trait RetrievalPort: Send + Sync {
    async fn query(&self, question: &str, dataset_id: &str) -> Result<RetrievalReply, OutcallError>;
}
