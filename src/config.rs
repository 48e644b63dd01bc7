use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notify::DEFAULT_RECIPIENT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreRuntimeConfig,
    #[serde(default)]
    pub bureau: BureauConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/crivo")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

fn default_store_state_path() -> Option<PathBuf> {
    Some(PathBuf::from("./state/crivo.json"))
}

fn default_bureau_base_url() -> String {
    "http://localhost:8100".to_string()
}

fn default_bureau_timeout_ms() -> u64 {
    10_000
}

fn default_retrieval_base_url() -> String {
    "http://localhost:9380".to_string()
}

fn default_retrieval_timeout_ms() -> u64 {
    15_000
}

fn default_policy_dataset_id() -> String {
    "politicas_credito".to_string()
}

fn default_regulation_dataset_id() -> String {
    "regulamentacoes".to_string()
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_notify_recipient() -> String {
    DEFAULT_RECIPIENT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

/// `state_path: null` selects the in-memory store, so nothing survives the
/// process. Omitting the field keeps the default on-disk state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRuntimeConfig {
    #[serde(default = "default_store_state_path")]
    pub state_path: Option<PathBuf>,
}

impl Default for StoreRuntimeConfig {
    fn default() -> Self {
        Self {
            state_path: default_store_state_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BureauConfig {
    #[serde(default = "default_bureau_base_url")]
    pub base_url: String,
    #[serde(default = "default_bureau_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BureauConfig {
    fn default() -> Self {
        Self {
            base_url: default_bureau_base_url(),
            timeout_ms: default_bureau_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_retrieval_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_retrieval_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_policy_dataset_id")]
    pub policy_dataset_id: String,
    #[serde(default = "default_regulation_dataset_id")]
    pub regulation_dataset_id: String,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: default_retrieval_base_url(),
            api_key: None,
            timeout_ms: default_retrieval_timeout_ms(),
            policy_dataset_id: default_policy_dataset_id(),
            regulation_dataset_id: default_regulation_dataset_id(),
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_recipient")]
    pub recipient: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient: default_notify_recipient(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize crivo config")?;

        if let Some(state_path) = &config.store.state_path {
            if !state_path.is_absolute() {
                config.store.state_path = Some(config_base.join(state_path));
            }
        }

        Ok(config)
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join("crivo.schema.json");
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or crivo.schema.json next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
