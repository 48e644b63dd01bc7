use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::document::DocumentKind;
use crate::journal::{Journal, Severity};
use crate::pipeline::error::PipelineError;
use crate::pipeline::types::{AnalysisContext, RiskClass};
use crate::retrieval::RetrievalPort;

pub const STAGE: &str = "policy_lookup";

/// Stage 4: applicable policy text and regulatory citations.
pub struct PolicyStage {
    retrieval: Arc<dyn RetrievalPort>,
    policy_dataset_id: String,
    regulation_dataset_id: String,
    min_confidence: f64,
}

impl PolicyStage {
    pub fn new(
        retrieval: Arc<dyn RetrievalPort>,
        policy_dataset_id: String,
        regulation_dataset_id: String,
        min_confidence: f64,
    ) -> Self {
        Self {
            retrieval,
            policy_dataset_id,
            regulation_dataset_id,
            min_confidence,
        }
    }

    pub async fn run(
        &self,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) -> Result<(), PipelineError> {
        let requested_amount = context.require_client()?.requested_amount;
        let risk_class = context.require_risk_class()?;
        let document_kind = context.document_kind;

        context.applicable_policy =
            Some(self.lookup_policy(risk_class, requested_amount, journal).await);
        context.applicable_regulations =
            Some(self.lookup_regulations(document_kind, journal).await);
        Ok(())
    }

    async fn lookup_policy(
        &self,
        risk_class: RiskClass,
        requested_amount: f64,
        journal: &mut Journal,
    ) -> String {
        let question = policy_question(risk_class, requested_amount);
        match self.retrieval.query(&question, &self.policy_dataset_id).await {
            Ok(reply) if reply.success => match reply.top_chunk() {
                Some(top) => {
                    if top.similarity < self.min_confidence {
                        journal.push(
                            Severity::Warn,
                            STAGE,
                            Some("retrieval"),
                            format!(
                                "Política recuperada com similaridade baixa ({:.2}), revisar manualmente",
                                top.similarity
                            ),
                        );
                    } else {
                        journal.push(
                            Severity::Info,
                            STAGE,
                            Some("retrieval"),
                            format!("Política recuperada (similaridade {:.2})", top.similarity),
                        );
                    }
                    top.content.clone()
                }
                None => {
                    journal.push(
                        Severity::Warn,
                        STAGE,
                        Some("retrieval"),
                        "Nenhuma política encontrada na base, usando política padrão",
                    );
                    fallback_policy(risk_class).to_string()
                }
            },
            Ok(_) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("retrieval"),
                    "Serviço de busca reportou falha na consulta de políticas, usando política padrão",
                );
                fallback_policy(risk_class).to_string()
            }
            Err(err) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("retrieval"),
                    format!("Consulta de políticas falhou, usando política padrão: {err}"),
                );
                fallback_policy(risk_class).to_string()
            }
        }
    }

    async fn lookup_regulations(
        &self,
        document_kind: Option<DocumentKind>,
        journal: &mut Journal,
    ) -> Vec<String> {
        let question = regulation_question(document_kind);
        match self
            .retrieval
            .query(&question, &self.regulation_dataset_id)
            .await
        {
            Ok(reply) if reply.success => match reply.top_chunk() {
                Some(top) => {
                    let citations = citation_lines(&top.content);
                    if !citations.is_empty() {
                        journal.push(
                            Severity::Info,
                            STAGE,
                            Some("retrieval"),
                            format!("{} citação(ões) normativa(s) identificada(s)", citations.len()),
                        );
                        citations
                    } else if !top.content.trim().is_empty() {
                        journal.push(
                            Severity::Info,
                            STAGE,
                            Some("retrieval"),
                            "Trecho recuperado sem citações normativas, mantendo o texto integral",
                        );
                        vec![top.content.trim().to_string()]
                    } else {
                        journal.push(
                            Severity::Warn,
                            STAGE,
                            Some("retrieval"),
                            "Trecho de regulamentação vazio, usando lista padrão",
                        );
                        fallback_regulations()
                    }
                }
                None => {
                    journal.push(
                        Severity::Warn,
                        STAGE,
                        Some("retrieval"),
                        "Nenhuma regulamentação encontrada na base, usando lista padrão",
                    );
                    fallback_regulations()
                }
            },
            Ok(_) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("retrieval"),
                    "Serviço de busca reportou falha na consulta de regulamentações, usando lista padrão",
                );
                fallback_regulations()
            }
            Err(err) => {
                journal.push(
                    Severity::Warn,
                    STAGE,
                    Some("retrieval"),
                    format!("Consulta de regulamentações falhou, usando lista padrão: {err}"),
                );
                fallback_regulations()
            }
        }
    }
}

fn policy_question(risk_class: RiskClass, requested_amount: f64) -> String {
    format!(
        "Quais são as políticas de crédito aplicáveis para um cliente com perfil de risco {}? \
         Valor solicitado: R$ {:.2}. Incluir limites de crédito, taxas de juros, garantias \
         exigidas e prazo máximo de financiamento.",
        risk_class.portuguese_label(),
        requested_amount
    )
}

fn regulation_question(document_kind: Option<DocumentKind>) -> String {
    let profile = match document_kind {
        Some(DocumentKind::Cnpj) => "PJ",
        _ => "PF",
    };
    format!(
        "Quais são as regulamentações do Banco Central aplicáveis a operações de crédito pessoal \
         para clientes {profile}? Incluir a resolução CMN aplicável, limites de taxas e \
         requisitos de transparência."
    )
}

/// Lines of a snippet that look like normative citations.
pub fn citation_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && citation_pattern().is_match(line))
        .map(str::to_string)
        .collect()
}

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)resolu[cç][aã]o|circular|regulament|normativ|instru[cç][aã]o|\blei\b")
            .expect("citation pattern must compile")
    })
}

fn fallback_policy(risk_class: RiskClass) -> &'static str {
    match risk_class {
        RiskClass::Low => {
            "Limite máximo de R$ 100.000,00, taxa de juros anual de 12% a 18%, garantia não \
             obrigatória, prazo máximo de 60 meses, aprovação automática."
        }
        RiskClass::Medium => {
            "Limite máximo de R$ 50.000,00, taxa de juros anual de 18% a 24%, avalista ou \
             garantia real para valores acima de R$ 20.000,00, prazo máximo de 48 meses, \
             aprovação manual."
        }
        RiskClass::High => {
            "Limite máximo de R$ 10.000,00, taxa de juros anual de 24% a 36%, garantia real \
             obrigatória, prazo máximo de 24 meses, aprovação manual."
        }
    }
}

fn fallback_regulations() -> Vec<String> {
    vec![
        "Resolução CMN nº 4.893/2021 (crédito pessoal)".to_string(),
        "CET (Custo Efetivo Total) obrigatório no contrato".to_string(),
        "Prazo de reflexão de 7 dias para desistência".to_string(),
        "Informações obrigatórias: taxa de juros nominal e efetiva, valor total financiado, \
         número e valor das parcelas"
            .to_string(),
    ]
}
