use async_trait::async_trait;
use serde_json::Value;

use crate::store::error::StoreError;
use crate::store::types::{ClientRecord, LoanRecord};

/// Persistence gateway consumed by the pipeline.
///
/// Callers treat every failure as degradable: a broken store downgrades the
/// run (simulated client, empty history, unsaved report) instead of aborting
/// it, so implementations should return errors rather than panic.
#[async_trait]
pub trait StorePort: Send + Sync {
    async fn find_client(&self, document_id: &str) -> Result<Option<ClientRecord>, StoreError>;

    /// Registers a new client. Fails with a conflict when the document id is
    /// already taken.
    async fn insert_client(&self, record: ClientRecord) -> Result<(), StoreError>;

    /// Rewrites an existing client record. Fails with a conflict when the
    /// document id is unknown.
    async fn update_client(&self, record: ClientRecord) -> Result<(), StoreError>;

    /// Loans of the given client that still carry an outstanding balance.
    async fn list_active_loans(&self, document_id: &str) -> Result<Vec<LoanRecord>, StoreError>;

    /// Appends a finished analysis report verbatim.
    async fn save_analysis(&self, report: &Value) -> Result<(), StoreError>;

    async fn save_loan(&self, loan: LoanRecord) -> Result<(), StoreError>;
}
