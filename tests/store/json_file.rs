use std::fs;
use std::path::PathBuf;

use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crivo::store::{ClientRecord, JsonFileStore, LoanRecord, StoreErrorKind, StorePort};

fn work_dir() -> PathBuf {
    std::env::temp_dir().join(format!("crivo-store-test-{}", Uuid::now_v7()))
}

fn client(document_id: &str, name: &str) -> ClientRecord {
    ClientRecord {
        document_id: document_id.to_string(),
        name: name.to_string(),
        email: Some("ana@exemplo.com".to_string()),
        phone: Some("11987654321".to_string()),
        monthly_income: 8500.0,
        registered_at: OffsetDateTime::now_utc(),
    }
}

fn loan(document_id: &str, outstanding_balance: f64) -> LoanRecord {
    LoanRecord {
        id: Uuid::now_v7(),
        document_id: document_id.to_string(),
        analysis_id: None,
        amount: 10_000.0,
        outstanding_balance,
        term_months: 12,
        purpose: "teste".to_string(),
        status: "APPROVED".to_string(),
        created_at: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
async fn open_creates_parent_dirs_and_defers_the_first_write() {
    let dir = work_dir();
    let path = dir.join("nested/state.json");

    let store = JsonFileStore::open(&path).expect("open must succeed");
    assert!(path.parent().unwrap().is_dir());
    assert!(!path.exists(), "no mutation yet, no state file yet");

    let found = store
        .find_client("52998224725")
        .await
        .expect("find must succeed");
    assert!(found.is_none());

    store
        .insert_client(client("52998224725", "Ana Silva"))
        .await
        .expect("insert must succeed");
    assert!(path.exists(), "the first mutation writes the file");

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn state_survives_a_reopen() {
    let dir = work_dir();
    let path = dir.join("state.json");

    {
        let store = JsonFileStore::open(&path).expect("open must succeed");
        store
            .insert_client(client("52998224725", "Ana Silva"))
            .await
            .expect("insert must succeed");
        store
            .save_loan(loan("52998224725", 4000.0))
            .await
            .expect("loan must save");
        store
            .save_analysis(&json!({ "id_analise": "a-1", "recomendacao": "APPROVED" }))
            .await
            .expect("analysis must save");
    }

    let reopened = JsonFileStore::open(&path).expect("reopen must succeed");
    let found = reopened
        .find_client("52998224725")
        .await
        .expect("find must succeed")
        .expect("client must survive the reopen");
    assert_eq!(found.name, "Ana Silva");
    assert_eq!(found.monthly_income, 8500.0);

    let loans = reopened
        .list_active_loans("52998224725")
        .await
        .expect("loans must list");
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].outstanding_balance, 4000.0);

    // The state file is plain JSON with the analyses stored verbatim.
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("state file must read"))
            .expect("state file must be valid JSON");
    assert_eq!(raw["version"], 1);
    assert_eq!(raw["analyses"].as_array().map(Vec::len), Some(1));
    assert_eq!(raw["analyses"][0]["recomendacao"], "APPROVED");

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn corrupt_state_is_refused_on_open() {
    let dir = work_dir();
    fs::create_dir_all(&dir).expect("work dir must exist");
    let path = dir.join("state.json");
    fs::write(&path, "{not valid json").expect("garbage must be written");

    let err = JsonFileStore::open(&path).expect_err("corrupt state must not open");
    assert_eq!(err.kind, StoreErrorKind::Corrupt);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unsupported_version_is_refused_on_open() {
    let dir = work_dir();
    fs::create_dir_all(&dir).expect("work dir must exist");
    let path = dir.join("state.json");
    fs::write(
        &path,
        r#"{ "version": 99, "clients": {}, "loans": [], "analyses": [] }"#,
    )
    .expect("state must be written");

    let err = JsonFileStore::open(&path).expect_err("future versions must not open");
    assert_eq!(err.kind, StoreErrorKind::Corrupt);
    assert!(err.message.contains("version"));

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn duplicate_insert_conflicts_without_clobbering_the_file() {
    let dir = work_dir();
    let path = dir.join("state.json");

    let store = JsonFileStore::open(&path).expect("open must succeed");
    store
        .insert_client(client("52998224725", "Ana Silva"))
        .await
        .expect("first insert must succeed");
    let err = store
        .insert_client(client("52998224725", "Outra Pessoa"))
        .await
        .expect_err("second insert must conflict");
    assert_eq!(err.kind, StoreErrorKind::Conflict);

    let reopened = JsonFileStore::open(&path).expect("reopen must succeed");
    let found = reopened
        .find_client("52998224725")
        .await
        .expect("find must succeed")
        .expect("client must exist");
    assert_eq!(found.name, "Ana Silva", "the original record must win");

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn update_requires_an_existing_client() {
    let dir = work_dir();
    let path = dir.join("state.json");

    let store = JsonFileStore::open(&path).expect("open must succeed");
    let err = store
        .update_client(client("52998224725", "Ana Silva"))
        .await
        .expect_err("updating an unknown client must conflict");
    assert_eq!(err.kind, StoreErrorKind::Conflict);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn settled_loans_are_filtered_and_no_temp_file_lingers() {
    let dir = work_dir();
    let path = dir.join("state.json");

    let store = JsonFileStore::open(&path).expect("open must succeed");
    store
        .save_loan(loan("52998224725", 0.0))
        .await
        .expect("settled loan must save");
    store
        .save_loan(loan("52998224725", 500.0))
        .await
        .expect("active loan must save");

    let active = store
        .list_active_loans("52998224725")
        .await
        .expect("loans must list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].outstanding_balance, 500.0);

    assert!(
        !path.with_extension("tmp").exists(),
        "the atomic write must leave no temp file behind"
    );

    let _ = fs::remove_dir_all(&dir);
}
