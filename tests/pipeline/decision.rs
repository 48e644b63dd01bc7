use crivo::pipeline::{ClientInput, Recommendation, RiskClass};
use crivo::store::ClientRecord;

use crate::support::{BureauScript, HarnessBuilder, ana_input, ana_record};

fn scenario_input(monthly_income: f64, requested_amount: f64) -> ClientInput {
    ClientInput {
        monthly_income,
        requested_amount,
        ..ana_input()
    }
}

fn scenario_record(monthly_income: f64) -> ClientRecord {
    ClientRecord {
        monthly_income,
        ..ana_record()
    }
}

#[tokio::test]
async fn medium_risk_with_moderate_debt_gets_caveats() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(scenario_record(3000.0)).await;

    // 36000 / 36 = 1000 per month, a third of the income: score 670.
    let report = harness.run_to_report(scenario_input(3000.0, 36_000.0)).await;

    assert_eq!(report.context.financial_score, Some(670));
    assert_eq!(report.context.risk_class, Some(RiskClass::Medium));
    assert_eq!(report.recommendation, Recommendation::ApprovedWithCaveats);
    assert!(report.decision_notes[0].contains("revisão manual"));
    assert!(report.loan_recorded);
}

#[tokio::test]
async fn medium_risk_with_heavy_debt_needs_extra_collateral() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(scenario_record(3000.0)).await;

    // 54000 / 36 = 1500 per month, half of the income: score 550, ratio 50%.
    let report = harness.run_to_report(scenario_input(3000.0, 54_000.0)).await;

    assert_eq!(report.context.financial_score, Some(550));
    assert_eq!(report.context.risk_class, Some(RiskClass::Medium));
    assert_eq!(
        report.recommendation,
        Recommendation::ApprovedWithConditions
    );
    assert!(report.decision_notes[0].contains("garantia adicional"));
}

#[tokio::test]
async fn high_risk_is_approved_only_with_collateral() {
    let harness = HarnessBuilder::default().build();
    harness.store.seed_client(scenario_record(1500.0)).await;

    // 30000 / 36 = 833 per month against a 1500 income: score 370.
    let report = harness.run_to_report(scenario_input(1500.0, 30_000.0)).await;

    assert_eq!(report.context.financial_score, Some(370));
    assert_eq!(report.context.risk_class, Some(RiskClass::High));
    assert_eq!(
        report.recommendation,
        Recommendation::ApprovedWithConditions
    );
    assert!(report.decision_notes[0].contains("garantia real"));

    // Conditional approvals still open a loan record.
    let loans = harness.store.inner().loans().await;
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].status, "APPROVED_WITH_CONDITIONS");
    assert_eq!(report.report_document["recomendacao"], "APPROVED_WITH_CONDITIONS");
}

#[tokio::test]
async fn restriction_overrides_any_class() {
    let harness = HarnessBuilder::default()
        .bureau(BureauScript::Restricted)
        .build();
    harness.store.seed_client(scenario_record(3000.0)).await;

    let report = harness.run_to_report(scenario_input(3000.0, 36_000.0)).await;

    assert_eq!(report.recommendation, Recommendation::Rejected);
    assert_eq!(report.decision_notes, vec!["restrição cadastral ativa"]);
    assert!(!report.loan_recorded);
    assert!(harness.store.inner().loans().await.is_empty());
    assert!(!report.recommendation.is_approval());
}
