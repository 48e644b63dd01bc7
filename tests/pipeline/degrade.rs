use std::sync::atomic::Ordering;

use crivo::journal::Severity;
use crivo::pipeline::Recommendation;

use crate::support::{
    ANA_CPF, BureauScript, HarnessBuilder, POLICY_CHUNK, RetrievalScript, active_loan, ana_input,
    ana_record,
};

#[tokio::test]
async fn client_base_outage_falls_back_to_a_simulated_profile() {
    let harness = HarnessBuilder::default().build();
    harness.store.fail_find.store(true, Ordering::SeqCst);

    let report = harness.run_to_report(ana_input()).await;

    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Warn
                && entry.message.contains("dados simulados"))
    );
    let profile = report.context.client.expect("profile must be simulated");
    assert_eq!(profile.document_id, ANA_CPF);
    assert!(profile.email.is_none());
    assert!(report.persisted, "the report save path is unaffected");
}

#[tokio::test]
async fn loan_lookup_outage_empties_the_credit_history() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(ana_record()).await;
    harness.store.seed_loan(active_loan(ANA_CPF, 4000.0)).await;
    harness.store.fail_loans.store(true, Ordering::SeqCst);

    let report = harness.run_to_report(ana_input()).await;

    let history = report.context.credit_history.expect("history must be set");
    assert_eq!(history.active_loan_count, 0);
    assert_eq!(history.total_outstanding_balance, 0.0);
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Warn
                && entry.message.contains("Histórico de crédito indisponível"))
    );
}

#[tokio::test]
async fn bureau_outage_assumes_no_restriction_with_an_error_entry() {
    let harness = HarnessBuilder::default()
        .bureau(BureauScript::Unreachable)
        .build();
    harness.store.seed_client(ana_record()).await;

    let report = harness.run_to_report(ana_input()).await;

    assert_eq!(report.context.has_restriction, Some(false));
    assert_eq!(report.recommendation, Recommendation::Approved);
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Error
                && entry.message.contains("Consulta ao bureau falhou"))
    );
}

#[tokio::test]
async fn retrieval_outage_falls_back_to_the_canned_policy_and_citations() {
    let harness = HarnessBuilder::default()
        .policy(RetrievalScript::Unreachable)
        .regulation(RetrievalScript::Unreachable)
        .build();
    harness.store.seed_client(ana_record()).await;

    let report = harness.run_to_report(ana_input()).await;

    // Ana scores 700 (low risk), so the low-risk canned policy applies.
    let policy = report.context.applicable_policy.expect("policy must be set");
    assert!(policy.contains("R$ 100.000,00"));

    let regulations = report
        .context
        .applicable_regulations
        .expect("regulations must be set");
    assert!(regulations[0].contains("Resolução CMN nº 4.893/2021"));

    let warn_count = report
        .journal
        .iter()
        .filter(|entry| entry.severity == Severity::Warn && entry.message.contains("falhou"))
        .count();
    assert_eq!(warn_count, 2, "both lookups must log their fallback");
    assert!(report.persisted);
}

#[tokio::test]
async fn unsuccessful_retrieval_reply_uses_the_fallback_too() {
    let harness = HarnessBuilder::default()
        .policy(RetrievalScript::Unsuccessful)
        .regulation(RetrievalScript::Empty)
        .build();
    harness.store.seed_client(ana_record()).await;

    let report = harness.run_to_report(ana_input()).await;

    let policy = report.context.applicable_policy.expect("policy must be set");
    assert!(policy.contains("R$ 100.000,00"));
    let regulations = report
        .context
        .applicable_regulations
        .expect("regulations must be set");
    assert_eq!(regulations.len(), 4);
}

#[tokio::test]
async fn low_confidence_chunk_is_kept_but_flagged() {
    let harness = HarnessBuilder::default()
        .policy(RetrievalScript::Chunk {
            content: POLICY_CHUNK,
            similarity: 0.42,
        })
        .build();
    harness.store.seed_client(ana_record()).await;

    let report = harness.run_to_report(ana_input()).await;

    assert_eq!(report.context.applicable_policy.as_deref(), Some(POLICY_CHUNK));
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Warn
                && entry.message.contains("similaridade baixa"))
    );
}

#[tokio::test]
async fn analysis_save_failure_patches_the_report_and_continues() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(ana_record()).await;
    harness
        .store
        .fail_save_analysis
        .store(true, Ordering::SeqCst);

    let report = harness.run_to_report(ana_input()).await;

    assert!(!report.persisted);
    assert_eq!(report.report_document["status_salvamento"], false);
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Error
                && entry.message.contains("Falha ao persistir a análise"))
    );
    // The rest of the stage still runs.
    assert!(report.loan_recorded);
    assert_eq!(harness.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn loan_save_failure_downgrades_to_a_warning() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(ana_record()).await;
    harness.store.fail_save_loan.store(true, Ordering::SeqCst);

    let report = harness.run_to_report(ana_input()).await;

    assert_eq!(report.recommendation, Recommendation::Approved);
    assert!(!report.loan_recorded);
    assert!(report.persisted);
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Warn
                && entry.message.contains("Falha ao registrar o empréstimo"))
    );
}

#[tokio::test]
async fn notifier_failure_leaves_the_notification_unset() {
    let harness = HarnessBuilder::default().failing_notifier().build();
    harness.store.seed_client(ana_record()).await;

    let report = harness.run_to_report(ana_input()).await;

    assert!(report.notification.is_none());
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Warn
                && entry.message.contains("Falha ao enviar a notificação"))
    );
    assert!(report.persisted);
}

#[tokio::test]
async fn update_failure_keeps_the_submitted_values() {
    let harness = HarnessBuilder::default().build();
    let mut record = ana_record();
    record.monthly_income = 8000.0;
    harness.store.seed_client(record).await;
    harness.store.fail_update.store(true, Ordering::SeqCst);

    let report = harness.run_to_report(ana_input()).await;

    assert_eq!(harness.store.update_calls.load(Ordering::SeqCst), 1);
    assert!(
        report
            .journal
            .iter()
            .any(|entry| entry.severity == Severity::Warn
                && entry.message.contains("Falha ao atualizar o cadastro"))
    );
    // The run itself uses the submitted income, not the stale record.
    let profile = report.context.client.expect("profile must be set");
    assert_eq!(profile.monthly_income, 8500.0);
    assert_eq!(report.context.financial_score, Some(700));
}
