use std::sync::Arc;

use time::OffsetDateTime;

use crate::document;
use crate::journal::{Journal, Severity};
use crate::pipeline::error::{PipelineError, validation_error};
use crate::pipeline::types::{AnalysisContext, ClientInput, ClientProfile, CreditHistory};
use crate::store::{ClientRecord, StorePort};

pub const STAGE: &str = "intake";

/// Outcome of one intake pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Client resolved; the context carries profile and credit history.
    Complete,
    /// Unknown client; the run must pause until the onboarding fields arrive.
    AwaitOnboarding,
}

/// Stage 1: document validation, client resolution, credit history.
pub struct IntakeStage {
    store: Arc<dyn StorePort>,
}

impl IntakeStage {
    pub fn new(store: Arc<dyn StorePort>) -> Self {
        Self { store }
    }

    pub async fn run(
        &self,
        input: &ClientInput,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) -> Result<IntakeOutcome, PipelineError> {
        let check = document::check_document(&input.document_id);
        let Some(kind) = check.kind.filter(|_| check.valid) else {
            journal.error(
                STAGE,
                format!(
                    "Documento '{}' inválido: informe um CPF (11 dígitos) ou CNPJ (14 dígitos) \
                     com verificadores corretos",
                    input.document_id
                ),
            );
            return Err(validation_error(format!(
                "document id '{}' is not a valid CPF or CNPJ",
                input.document_id
            )));
        };
        context.document_kind = Some(kind);
        journal.info(STAGE, format!("Documento {kind} válido"));

        match self.store.find_client(&check.digits).await {
            Ok(Some(record)) => {
                if record.name != input.name || record.monthly_income != input.monthly_income {
                    let mut updated = record.clone();
                    updated.name = input.name.clone();
                    updated.monthly_income = input.monthly_income;
                    match self.store.update_client(updated).await {
                        Ok(()) => journal.info(
                            STAGE,
                            "Cadastro atualizado com os dados informados (nome/renda divergiam)",
                        ),
                        Err(err) => journal.push(
                            Severity::Warn,
                            STAGE,
                            Some("store"),
                            format!(
                                "Falha ao atualizar o cadastro, prosseguindo com os dados \
                                 informados: {err}"
                            ),
                        ),
                    }
                } else {
                    journal.info(STAGE, "Cliente encontrado na base de dados");
                }
                context.client = Some(profile_from(
                    input,
                    &check.digits,
                    record.email,
                    record.phone,
                ));
            }
            Ok(None) => {
                journal.info(STAGE, "Cliente não encontrado na base, cadastro necessário");
                return Ok(IntakeOutcome::AwaitOnboarding);
            }
            Err(err) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("store"),
                    format!("Base de clientes indisponível, usando dados simulados: {err}"),
                );
                context.client = Some(profile_from(input, &check.digits, None, None));
            }
        }

        self.attach_credit_history(&check.digits, context, journal)
            .await;
        Ok(IntakeOutcome::Complete)
    }

    /// Finishes a paused run once the operator supplied valid contact fields.
    ///
    /// Registers the client and populates the context directly from the
    /// submitted values; a store failure downgrades the registration to the
    /// in-memory profile instead of losing the run.
    pub async fn complete_onboarding(
        &self,
        input: &ClientInput,
        email: &str,
        phone: &str,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) {
        let digits = document::check_document(&input.document_id).digits;
        let record = ClientRecord {
            document_id: digits.clone(),
            name: input.name.clone(),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            monthly_income: input.monthly_income,
            registered_at: OffsetDateTime::now_utc(),
        };
        match self.store.insert_client(record).await {
            Ok(()) => journal.info(STAGE, "Cliente cadastrado com sucesso"),
            Err(err) => journal.push(
                Severity::Warn,
                STAGE,
                Some("store"),
                format!("Falha ao persistir o cadastro, prosseguindo com os dados informados: {err}"),
            ),
        }
        context.client = Some(profile_from(
            input,
            &digits,
            Some(email.to_string()),
            Some(phone.to_string()),
        ));
        self.attach_credit_history(&digits, context, journal).await;
    }

    /// Field checks applied to an onboarding reply. An empty list means the
    /// reply is acceptable.
    pub fn onboarding_rejections(email: &str, phone: &str) -> Vec<String> {
        let mut rejections = Vec::new();
        if !(email.contains('@') && email.contains('.')) {
            rejections.push("email inválido: esperado um endereço com '@' e '.'".to_string());
        }
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 10 {
            rejections
                .push("telefone inválido: esperado ao menos 10 dígitos (DDD + número)".to_string());
        }
        rejections
    }

    async fn attach_credit_history(
        &self,
        digits: &str,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) {
        match self.store.list_active_loans(digits).await {
            Ok(loans) => {
                let history = CreditHistory::from_loans(loans);
                journal.info(
                    STAGE,
                    format!(
                        "Histórico de crédito: {} empréstimo(s) ativo(s), saldo devedor total \
                         R$ {:.2}",
                        history.active_loan_count, history.total_outstanding_balance
                    ),
                );
                context.credit_history = Some(history);
            }
            Err(err) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("store"),
                    format!("Histórico de crédito indisponível, assumindo sem empréstimos ativos: {err}"),
                );
                context.credit_history = Some(CreditHistory::from_loans(Vec::new()));
            }
        }
    }
}

fn profile_from(
    input: &ClientInput,
    digits: &str,
    email: Option<String>,
    phone: Option<String>,
) -> ClientProfile {
    ClientProfile {
        name: input.name.clone(),
        document_id: digits.to_string(),
        monthly_income: input.monthly_income,
        requested_amount: input.requested_amount,
        term_months: input.term_months,
        purpose: input.purpose.clone(),
        email,
        phone,
    }
}
