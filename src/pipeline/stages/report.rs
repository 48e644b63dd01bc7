use std::sync::Arc;

use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::journal::{Journal, Severity};
use crate::notify::{COMPLETED_SUBJECT, NotificationRecord, NotifierPort};
use crate::pipeline::error::{PipelineError, internal_error};
use crate::pipeline::types::{AnalysisContext, ClientProfile, Recommendation, RiskClass};
use crate::store::{LoanRecord, StorePort};

pub const STAGE: &str = "report";

/// What the report stage hands back to the orchestrator.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub analysis_id: Uuid,
    pub recommendation: Recommendation,
    pub decision_notes: Vec<String>,
    pub persisted: bool,
    pub loan_recorded: bool,
    pub notification: Option<NotificationRecord>,
    pub report_document: Value,
    pub finished_at: OffsetDateTime,
}

/// Stage 5: final recommendation, persisted report, notification.
pub struct ReportStage {
    store: Arc<dyn StorePort>,
    notifier: Arc<dyn NotifierPort>,
    recipient: String,
}

impl ReportStage {
    pub fn new(store: Arc<dyn StorePort>, notifier: Arc<dyn NotifierPort>, recipient: String) -> Self {
        Self {
            store,
            notifier,
            recipient,
        }
    }

    pub async fn run(
        &self,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) -> Result<ReportOutcome, PipelineError> {
        let client = context.require_client()?.clone();
        let debt_ratio = context.require_debt_ratio()?;
        let has_restriction = context.require_restriction_flag()?;
        let score = context.require_financial_score()?;
        let risk_class = context.require_risk_class()?;
        let probability = context.require_default_probability()?;
        let policy = context.require_policy()?.to_string();
        let regulations = context.require_regulations()?.to_vec();

        let (recommendation, decision_notes) = decide(has_restriction, risk_class, debt_ratio);
        context.final_recommendation = Some(recommendation);
        journal.info(STAGE, format!("Recomendação final: {recommendation}"));

        let analysis_id = Uuid::now_v7();
        context.analysis_id = Some(analysis_id);
        let finished_at = OffsetDateTime::now_utc();

        let mut report_document = build_report_document(
            analysis_id,
            finished_at,
            &client,
            score,
            debt_ratio,
            risk_class,
            probability,
            has_restriction,
            &policy,
            &regulations,
            recommendation,
        )?;

        let persisted = match self.store.save_analysis(&report_document).await {
            Ok(()) => {
                journal.push(Severity::Info, STAGE, Some("store"), "Análise persistida");
                true
            }
            Err(err) => {
                journal.push(
                    Severity::Error,
                    STAGE,
                    Some("store"),
                    format!("Falha ao persistir a análise, relatório marcado como não salvo: {err}"),
                );
                report_document["status_salvamento"] = Value::Bool(false);
                false
            }
        };

        let loan_recorded = if recommendation.is_approval() {
            let loan = LoanRecord {
                id: Uuid::now_v7(),
                document_id: client.document_id.clone(),
                analysis_id: Some(analysis_id),
                amount: client.requested_amount,
                outstanding_balance: client.requested_amount,
                term_months: client.term_months,
                purpose: client.purpose.clone(),
                status: recommendation.to_string(),
                created_at: finished_at,
            };
            match self.store.save_loan(loan).await {
                Ok(()) => {
                    journal.push(
                        Severity::Info,
                        STAGE,
                        Some("store"),
                        format!("Empréstimo de R$ {:.2} registrado", client.requested_amount),
                    );
                    true
                }
                Err(err) => {
                    journal.push(
                        Severity::Warn,
                        STAGE,
                        Some("store"),
                        format!("Falha ao registrar o empréstimo aprovado: {err}"),
                    );
                    false
                }
            }
        } else {
            false
        };

        let record = NotificationRecord {
            recipient: self.recipient.clone(),
            subject: COMPLETED_SUBJECT.to_string(),
            body: notification_body(&client.name, risk_class, recommendation),
            sent_at: OffsetDateTime::now_utc(),
        };
        let notification = match self.notifier.send(&record).await {
            Ok(()) => {
                journal.push(
                    Severity::Info,
                    STAGE,
                    Some("notify"),
                    format!("Notificação enviada para {}", record.recipient),
                );
                Some(record)
            }
            Err(err) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("notify"),
                    format!("Falha ao enviar a notificação: {err}"),
                );
                None
            }
        };

        Ok(ReportOutcome {
            analysis_id,
            recommendation,
            decision_notes,
            persisted,
            loan_recorded,
            notification,
            report_document,
            finished_at,
        })
    }
}

/// Fixed-priority decision table; the first matching row wins.
pub fn decide(
    has_restriction: bool,
    risk_class: RiskClass,
    debt_ratio: f64,
) -> (Recommendation, Vec<String>) {
    if has_restriction {
        return (
            Recommendation::Rejected,
            vec!["restrição cadastral ativa".to_string()],
        );
    }
    match risk_class {
        RiskClass::High => (
            Recommendation::ApprovedWithConditions,
            vec!["garantia real obrigatória".to_string()],
        ),
        RiskClass::Medium if debt_ratio > 40.0 => (
            Recommendation::ApprovedWithConditions,
            vec!["endividamento elevado, exigir garantia adicional".to_string()],
        ),
        RiskClass::Medium => (
            Recommendation::ApprovedWithCaveats,
            vec!["revisão manual sugerida".to_string()],
        ),
        RiskClass::Low => (Recommendation::Approved, Vec::new()),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_report_document(
    analysis_id: Uuid,
    finished_at: OffsetDateTime,
    client: &ClientProfile,
    score: i32,
    debt_ratio: f64,
    risk_class: RiskClass,
    probability: f64,
    has_restriction: bool,
    policy: &str,
    regulations: &[String],
    recommendation: Recommendation,
) -> Result<Value, PipelineError> {
    let data_analise = finished_at
        .format(&Rfc3339)
        .map_err(|err| internal_error(format!("failed to format analysis timestamp: {err}")))?;
    Ok(json!({
        "id_analise": analysis_id,
        "data_analise": data_analise,
        "cliente": {
            "nome": client.name,
            "cpf_cnpj": client.document_id,
            "renda_mensal": client.monthly_income,
        },
        "analise": {
            "score_financeiro": score,
            "nivel_endividamento": debt_ratio,
            "classe_risco": risk_class,
            "probabilidade_inadimplencia": probability,
            "restricoes": has_restriction,
        },
        "politica_aplicavel": policy,
        "regulamentacoes": regulations,
        "recomendacao": recommendation,
        "status_salvamento": true,
    }))
}

fn notification_body(
    client_name: &str,
    risk_class: RiskClass,
    recommendation: Recommendation,
) -> String {
    format!(
        "Análise de risco concluída para {client_name}: classe {}, recomendação {recommendation}.",
        risk_class.portuguese_label()
    )
}
