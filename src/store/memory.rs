use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::store::error::{StoreError, conflict};
use crate::store::ports::StorePort;
use crate::store::types::{ClientRecord, LoanRecord};

#[derive(Debug, Default)]
struct MemoryState {
    clients: BTreeMap<String, ClientRecord>,
    loans: Vec<LoanRecord>,
    analyses: Vec<Value>,
}

/// Ephemeral store used when no state file is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn loans(&self) -> Vec<LoanRecord> {
        self.state.lock().await.loans.clone()
    }

    pub async fn analyses(&self) -> Vec<Value> {
        self.state.lock().await.analyses.clone()
    }
}

#[async_trait]
impl StorePort for MemoryStore {
    async fn find_client(&self, document_id: &str) -> Result<Option<ClientRecord>, StoreError> {
        Ok(self.state.lock().await.clients.get(document_id).cloned())
    }

    async fn insert_client(&self, record: ClientRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.clients.contains_key(&record.document_id) {
            return Err(conflict(format!(
                "client '{}' is already registered",
                record.document_id
            )));
        }
        state.clients.insert(record.document_id.clone(), record);
        Ok(())
    }

    async fn update_client(&self, record: ClientRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.clients.contains_key(&record.document_id) {
            return Err(conflict(format!(
                "client '{}' is not registered",
                record.document_id
            )));
        }
        state.clients.insert(record.document_id.clone(), record);
        Ok(())
    }

    async fn list_active_loans(&self, document_id: &str) -> Result<Vec<LoanRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .loans
            .iter()
            .filter(|loan| loan.document_id == document_id && loan.is_active())
            .cloned()
            .collect())
    }

    async fn save_analysis(&self, report: &Value) -> Result<(), StoreError> {
        self.state.lock().await.analyses.push(report.clone());
        Ok(())
    }

    async fn save_loan(&self, loan: LoanRecord) -> Result<(), StoreError> {
        self.state.lock().await.loans.push(loan);
        Ok(())
    }
}
