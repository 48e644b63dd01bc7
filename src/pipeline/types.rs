use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::document::DocumentKind;
use crate::journal::JournalEntry;
use crate::notify::NotificationRecord;
use crate::pipeline::error::{PipelineError, internal_error};
use crate::store::types::LoanRecord;

/// Application as submitted by the operator's front end.
///
/// Email and phone are deliberately absent: for unknown clients they are
/// collected through the onboarding interrupt, for known clients they come
/// from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub document_id: String,
    pub monthly_income: f64,
    pub requested_amount: f64,
    pub term_months: u32,
    #[serde(default)]
    pub purpose: String,
}

/// Client attributes after intake resolved them against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    /// Normalized digits, formatting stripped.
    pub document_id: String,
    pub monthly_income: f64,
    pub requested_amount: f64,
    pub term_months: u32,
    pub purpose: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditHistory {
    pub active_loan_count: usize,
    pub total_outstanding_balance: f64,
    pub loans: Vec<LoanRecord>,
}

impl CreditHistory {
    /// Builds the summary from the already-filtered active loans.
    pub fn from_loans(loans: Vec<LoanRecord>) -> Self {
        let total_outstanding_balance = loans.iter().map(|loan| loan.outstanding_balance).sum();
        Self {
            active_loan_count: loans.len(),
            total_outstanding_balance,
            loans,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskClass {
    Low,
    Medium,
    High,
}

impl RiskClass {
    pub fn from_score(score: i32) -> Self {
        if score >= 700 {
            RiskClass::Low
        } else if score >= 500 {
            RiskClass::Medium
        } else {
            RiskClass::High
        }
    }

    /// Label used in operator-facing text and retrieval questions.
    pub fn portuguese_label(&self) -> &'static str {
        match self {
            RiskClass::Low => "Baixo",
            RiskClass::Medium => "Médio",
            RiskClass::High => "Alto",
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskClass::Low => write!(f, "LOW"),
            RiskClass::Medium => write!(f, "MEDIUM"),
            RiskClass::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Approved,
    ApprovedWithConditions,
    ApprovedWithCaveats,
    ManualReview,
    Rejected,
}

impl Recommendation {
    /// Approval states are the ones that open a loan record.
    pub fn is_approval(&self) -> bool {
        matches!(
            self,
            Recommendation::Approved
                | Recommendation::ApprovedWithConditions
                | Recommendation::ApprovedWithCaveats
        )
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Approved => write!(f, "APPROVED"),
            Recommendation::ApprovedWithConditions => write!(f, "APPROVED_WITH_CONDITIONS"),
            Recommendation::ApprovedWithCaveats => write!(f, "APPROVED_WITH_CAVEATS"),
            Recommendation::ManualReview => write!(f, "MANUAL_REVIEW"),
            Recommendation::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Mutable record one run threads through the stages.
///
/// Fields start empty and are filled stage by stage; each stage resolves the
/// predecessors' fields through the `require_*` accessors so a missing field
/// surfaces as an internal error at the stage boundary instead of deeper in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(default)]
    pub document_kind: Option<DocumentKind>,
    #[serde(default)]
    pub client: Option<ClientProfile>,
    #[serde(default)]
    pub credit_history: Option<CreditHistory>,
    #[serde(default)]
    pub debt_ratio: Option<f64>,
    #[serde(default)]
    pub has_restriction: Option<bool>,
    #[serde(default)]
    pub restriction_details: Option<Value>,
    #[serde(default)]
    pub financial_score: Option<i32>,
    #[serde(default)]
    pub risk_class: Option<RiskClass>,
    #[serde(default)]
    pub default_probability: Option<f64>,
    #[serde(default)]
    pub applicable_policy: Option<String>,
    #[serde(default)]
    pub applicable_regulations: Option<Vec<String>>,
    #[serde(default)]
    pub final_recommendation: Option<Recommendation>,
    #[serde(default)]
    pub analysis_id: Option<Uuid>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: OffsetDateTime::now_utc(),
            document_kind: None,
            client: None,
            credit_history: None,
            debt_ratio: None,
            has_restriction: None,
            restriction_details: None,
            financial_score: None,
            risk_class: None,
            default_probability: None,
            applicable_policy: None,
            applicable_regulations: None,
            final_recommendation: None,
            analysis_id: None,
        }
    }

    pub fn require_client(&self) -> Result<&ClientProfile, PipelineError> {
        self.client
            .as_ref()
            .ok_or_else(|| internal_error("context is missing the client profile"))
    }

    pub fn require_debt_ratio(&self) -> Result<f64, PipelineError> {
        self.debt_ratio
            .ok_or_else(|| internal_error("context is missing debt_ratio"))
    }

    pub fn require_restriction_flag(&self) -> Result<bool, PipelineError> {
        self.has_restriction
            .ok_or_else(|| internal_error("context is missing has_restriction"))
    }

    pub fn require_financial_score(&self) -> Result<i32, PipelineError> {
        self.financial_score
            .ok_or_else(|| internal_error("context is missing financial_score"))
    }

    pub fn require_risk_class(&self) -> Result<RiskClass, PipelineError> {
        self.risk_class
            .ok_or_else(|| internal_error("context is missing risk_class"))
    }

    pub fn require_default_probability(&self) -> Result<f64, PipelineError> {
        self.default_probability
            .ok_or_else(|| internal_error("context is missing default_probability"))
    }

    pub fn require_policy(&self) -> Result<&str, PipelineError> {
        self.applicable_policy
            .as_deref()
            .ok_or_else(|| internal_error("context is missing applicable_policy"))
    }

    pub fn require_regulations(&self) -> Result<&[String], PipelineError> {
        self.applicable_regulations
            .as_deref()
            .ok_or_else(|| internal_error("context is missing applicable_regulations"))
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a finished run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    pub analysis_id: Uuid,
    pub recommendation: Recommendation,
    pub decision_notes: Vec<String>,
    /// False when the store rejected the report; the run still completes.
    pub persisted: bool,
    pub loan_recorded: bool,
    pub notification: Option<NotificationRecord>,
    /// Report document exactly as handed to the store.
    pub report_document: Value,
    pub context: AnalysisContext,
    pub journal: Vec<JournalEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
}

/// Terminal failure of a run, with the audit trail collected so far.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub run_id: Uuid,
    pub stage: String,
    pub message: String,
    pub journal: Vec<JournalEntry>,
}
