use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Registered applicant, keyed by its normalized document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub document_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub monthly_income: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

/// Loan written when an analysis ends in an approval state.
///
/// A loan counts as active while it still carries an outstanding balance;
/// new loans start with the full amount outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: Uuid,
    pub document_id: String,
    #[serde(default)]
    pub analysis_id: Option<Uuid>,
    pub amount: f64,
    pub outstanding_balance: f64,
    pub term_months: u32,
    pub purpose: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl LoanRecord {
    pub fn is_active(&self) -> bool {
        self.outstanding_balance > 0.0
    }
}
