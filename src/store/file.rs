use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::store::error::{StoreError, conflict, corrupt, unavailable};
use crate::store::ports::StorePort;
use crate::store::types::{ClientRecord, LoanRecord};

const STORE_VERSION: u64 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedStore {
    version: u64,
    clients: BTreeMap<String, ClientRecord>,
    loans: Vec<LoanRecord>,
    analyses: Vec<Value>,
}

/// Store backed by a single JSON state file.
///
/// The full state is kept in memory and rewritten atomically (temp file plus
/// rename) after every mutation, so a crash mid-write never leaves a torn
/// state file behind.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<PersistedStore>,
}

impl JsonFileStore {
    /// Opens the state file, creating an empty store when none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    unavailable(format!(
                        "failed to create store directory '{}': {err}",
                        parent.display()
                    ))
                })?;
            }
        }
        let state = match load(&path)? {
            Some(state) => state,
            None => PersistedStore {
                version: STORE_VERSION,
                ..PersistedStore::default()
            },
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load(path: &Path) -> Result<Option<PersistedStore>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(unavailable(format!(
                "failed to read store state '{}': {err}",
                path.display()
            )));
        }
    };

    let parsed: PersistedStore = serde_json::from_str(&content).map_err(|err| {
        corrupt(format!(
            "failed to parse store state '{}': {err}",
            path.display()
        ))
    })?;
    if parsed.version != STORE_VERSION {
        return Err(corrupt(format!(
            "unsupported store state version {} at '{}'",
            parsed.version,
            path.display()
        )));
    }

    Ok(Some(parsed))
}

fn save(path: &Path, state: &PersistedStore) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let file = fs::File::create(&tmp_path).map_err(|err| {
        unavailable(format!(
            "failed to create store temp file '{}': {err}",
            tmp_path.display()
        ))
    })?;
    {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state).map_err(|err| {
            unavailable(format!(
                "failed to serialize store state '{}': {err}",
                tmp_path.display()
            ))
        })?;
        writer.write_all(b"\n").map_err(|err| {
            unavailable(format!(
                "failed to finalize store state '{}': {err}",
                tmp_path.display()
            ))
        })?;
        writer.flush().map_err(|err| {
            unavailable(format!(
                "failed to flush store state '{}': {err}",
                tmp_path.display()
            ))
        })?;
    }

    let tmp_file = fs::OpenOptions::new()
        .read(true)
        .open(&tmp_path)
        .map_err(|err| {
            unavailable(format!(
                "failed to reopen store temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;
    tmp_file.sync_all().map_err(|err| {
        unavailable(format!(
            "failed to sync store temp file '{}': {err}",
            tmp_path.display()
        ))
    })?;

    fs::rename(&tmp_path, path).map_err(|err| {
        unavailable(format!(
            "failed to replace store state '{}' from '{}': {err}",
            path.display(),
            tmp_path.display()
        ))
    })?;

    if let Some(parent) = path.parent() {
        if let Ok(parent_file) = fs::File::open(parent) {
            let _ = parent_file.sync_all();
        }
    }

    Ok(())
}

#[async_trait]
impl StorePort for JsonFileStore {
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
        save(&self.path, &state)
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
        save(&self.path, &state)
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
        let mut state = self.state.lock().await;
        state.analyses.push(report.clone());
        save(&self.path, &state)
    }

    async fn save_loan(&self, loan: LoanRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.loans.push(loan);
        save(&self.path, &state)
    }
}
