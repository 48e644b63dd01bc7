use crivo::journal::Severity;
use crivo::pipeline::{Recommendation, RiskClass};

use crate::support::{
    ANA_CPF, BureauScript, HarnessBuilder, POLICY_CHUNK, active_loan, ana_input, ana_record,
};

#[tokio::test]
async fn ana_silva_application_is_approved_end_to_end() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(ana_record()).await;
    harness.store.seed_loan(active_loan(ANA_CPF, 4000.0)).await;

    let report = harness.run_to_report(ana_input()).await;

    // Scoring: ~8.17% debt ratio leaves the base score untouched.
    assert_eq!(report.context.financial_score, Some(700));
    assert_eq!(report.context.risk_class, Some(RiskClass::Low));
    let probability = report
        .context
        .default_probability
        .expect("probability must be set");
    assert!((0.01..0.10).contains(&probability));

    // The existing loan shows up in the history without changing the score.
    let history = report
        .context
        .credit_history
        .as_ref()
        .expect("history must be set");
    assert_eq!(history.active_loan_count, 1);
    assert_eq!(history.total_outstanding_balance, 4000.0);

    assert_eq!(report.recommendation, Recommendation::Approved);
    assert!(report.decision_notes.is_empty());
    assert!(report.persisted);
    assert!(report.loan_recorded);
    assert!(
        report
            .journal
            .iter()
            .all(|entry| entry.severity != Severity::Error),
        "the happy path must not journal errors"
    );

    // Persisted document under the stable keys.
    let document = &report.report_document;
    assert_eq!(document["id_analise"], report.analysis_id.to_string());
    assert!(document["data_analise"].as_str().unwrap().contains('T'));
    assert_eq!(document["cliente"]["nome"], "Ana Silva");
    assert_eq!(document["cliente"]["cpf_cnpj"], ANA_CPF);
    assert_eq!(document["cliente"]["renda_mensal"], 8500.0);
    assert_eq!(document["analise"]["score_financeiro"], 700);
    assert_eq!(document["analise"]["classe_risco"], "LOW");
    assert_eq!(document["analise"]["restricoes"], false);
    assert_eq!(document["politica_aplicavel"], POLICY_CHUNK);
    assert_eq!(document["recomendacao"], "APPROVED");
    assert_eq!(document["status_salvamento"], true);

    let regulations = document["regulamentacoes"]
        .as_array()
        .expect("regulations must be a list");
    assert_eq!(regulations.len(), 2);
    assert!(regulations[0].as_str().unwrap().starts_with("Resolução CMN nº 4.893/2021"));
    assert!(regulations[1].as_str().unwrap().starts_with("Circular BCB nº 3.978/2020"));

    // One analysis stored, one new loan opened and linked to it.
    let analyses = harness.store.inner().analyses().await;
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0]["id_analise"], report.analysis_id.to_string());

    let loans = harness.store.inner().loans().await;
    assert_eq!(loans.len(), 2, "seeded loan plus the approved one");
    let opened = loans
        .iter()
        .find(|loan| loan.analysis_id == Some(report.analysis_id))
        .expect("approved loan must link the analysis");
    assert_eq!(opened.amount, 25_000.0);
    assert_eq!(opened.outstanding_balance, 25_000.0);
    assert_eq!(opened.term_months, 24);
    assert_eq!(opened.status, "APPROVED");

    // Operator notification.
    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "analista@empresa.com");
    assert_eq!(sent[0].subject, "Análise de Risco Concluída");
    assert_eq!(
        sent[0].body,
        "Análise de risco concluída para Ana Silva: classe Baixo, recomendação APPROVED."
    );
    assert_eq!(report.notification.as_ref().map(|n| n.recipient.as_str()),
        Some("analista@empresa.com"));
}

#[tokio::test]
async fn restricted_client_is_rejected_but_fully_reported() {
    let harness = HarnessBuilder::default()
        .bureau(BureauScript::Restricted)
        .build();
    harness.store.seed_client(ana_record()).await;

    let report = harness.run_to_report(ana_input()).await;

    assert_eq!(report.recommendation, Recommendation::Rejected);
    assert!(!report.loan_recorded);
    assert!(harness.store.inner().loans().await.is_empty());

    // Rejections still persist the report and notify the analyst.
    assert!(report.persisted);
    assert_eq!(harness.store.inner().analyses().await.len(), 1);
    assert_eq!(report.report_document["analise"]["restricoes"], true);
    assert_eq!(report.report_document["recomendacao"], "REJECTED");
    assert_eq!(harness.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn invalid_document_never_reaches_the_store_or_bureau() {
    let harness = HarnessBuilder::default().build();

    let mut input = ana_input();
    input.document_id = "52998224724".to_string();
    let err = harness
        .orchestrator
        .start(input)
        .await
        .expect_err("a corrupted check digit must be rejected");
    assert_eq!(err.kind, crivo::pipeline::PipelineErrorKind::Validation);

    assert_eq!(
        harness.store.find_calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert_eq!(
        harness.bureau_calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert_eq!(harness.retrieval_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
