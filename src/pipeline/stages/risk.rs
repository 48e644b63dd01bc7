use std::sync::Arc;

use crate::bureau::{BureauPort, BureauReply};
use crate::journal::{Journal, Severity};
use crate::pipeline::error::PipelineError;
use crate::pipeline::types::{AnalysisContext, RiskClass};

pub const STAGE: &str = "risk_scoring";

/// Months assumed per installment when estimating the debt ratio. The
/// requested term is deliberately not used: the scoring deductions below
/// are calibrated against this fixed estimate.
const INSTALLMENT_ESTIMATE_MONTHS: f64 = 36.0;

const BASE_SCORE: i32 = 700;
const SCORE_FLOOR: i32 = 300;
const SCORE_CEILING: i32 = 850;

/// Stage 2: debt ratio, restriction lookup, financial score.
pub struct RiskStage {
    bureau: Arc<dyn BureauPort>,
}

impl RiskStage {
    pub fn new(bureau: Arc<dyn BureauPort>) -> Self {
        Self { bureau }
    }

    pub async fn run(
        &self,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) -> Result<(), PipelineError> {
        let client = context.require_client()?.clone();

        let debt_ratio = if client.monthly_income <= 0.0 {
            journal.error(
                STAGE,
                "Renda mensal ausente ou igual a zero, endividamento tratado como 100%",
            );
            100.0
        } else {
            estimated_debt_ratio(client.requested_amount, client.monthly_income)
        };
        context.debt_ratio = Some(debt_ratio);
        journal.info(
            STAGE,
            format!("Nível de endividamento estimado em {debt_ratio:.2}%"),
        );

        let (has_restriction, details) = match self
            .bureau
            .check_restrictions(&client.document_id)
            .await
        {
            Ok(BureauReply::Report(report)) => {
                if report.document_id.as_deref() != Some(client.document_id.as_str()) {
                    journal.push(
                        Severity::Warn,
                        STAGE,
                        Some("bureau"),
                        "Resposta do bureau ecoou documento divergente, assumindo restrição por segurança",
                    );
                    (true, Some(report.raw))
                } else if report.has_restriction {
                    journal.push(
                        Severity::Warn,
                        STAGE,
                        Some("bureau"),
                        "Restrição cadastral encontrada",
                    );
                    (true, Some(report.raw))
                } else {
                    journal.push(
                        Severity::Info,
                        STAGE,
                        Some("bureau"),
                        "Sem restrições cadastrais",
                    );
                    (false, Some(report.raw))
                }
            }
            Ok(BureauReply::NotFound) => {
                journal.push(
                    Severity::Info,
                    STAGE,
                    Some("bureau"),
                    "Documento sem registro no bureau, tratado como sem restrição",
                );
                (false, None)
            }
            Err(err) => {
                journal.push(
                    Severity::Error,
                    STAGE,
                    Some("bureau"),
                    format!("Consulta ao bureau falhou, assumindo sem restrição: {err}"),
                );
                (false, None)
            }
        };
        context.has_restriction = Some(has_restriction);
        context.restriction_details = details;

        let score = financial_score(debt_ratio, has_restriction, client.monthly_income);
        context.financial_score = Some(score);
        let preliminary = RiskClass::from_score(score);
        context.risk_class = Some(preliminary);
        journal.info(
            STAGE,
            format!(
                "Score financeiro {score}, classe de risco preliminar {}",
                preliminary.portuguese_label()
            ),
        );
        Ok(())
    }
}

/// Share of income one estimated installment takes, as a percentage capped
/// at 100. Callers must ensure the income is positive.
pub fn estimated_debt_ratio(requested_amount: f64, monthly_income: f64) -> f64 {
    let installment = requested_amount / INSTALLMENT_ESTIMATE_MONTHS;
    ((installment / monthly_income) * 100.0).min(100.0)
}

pub fn financial_score(debt_ratio: f64, has_restriction: bool, monthly_income: f64) -> i32 {
    let mut score = BASE_SCORE;
    if debt_ratio > 50.0 {
        score -= 250;
    } else if debt_ratio > 35.0 {
        score -= 120;
    }
    if has_restriction {
        score -= 300;
    }
    if monthly_income < 2000.0 {
        score -= 80;
    } else if monthly_income < 4000.0 {
        score -= 30;
    }
    score.clamp(SCORE_FLOOR, SCORE_CEILING)
}
