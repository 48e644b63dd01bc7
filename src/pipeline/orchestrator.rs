use std::sync::Arc;

use uuid::Uuid;

use crate::bureau::BureauPort;
use crate::classifier::RiskClassifierPort;
use crate::journal::Journal;
use crate::notify::NotifierPort;
use crate::pipeline::error::{PipelineError, onboarding_cancelled, unknown_session};
use crate::pipeline::session::{OnboardingReply, PausedRun, SessionHandle, SessionStore};
use crate::pipeline::stages::{
    ClassifyStage, IntakeOutcome, IntakeStage, PolicyStage, ReportStage, RiskStage, classify,
    intake, policy, report, risk,
};
use crate::pipeline::types::{AnalysisContext, ClientInput, FailureReport, FinalReport};
use crate::retrieval::RetrievalPort;
use crate::store::StorePort;

/// Knobs the orchestrator forwards into the stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub policy_dataset_id: String,
    pub regulation_dataset_id: String,
    pub min_confidence: f64,
    pub notify_recipient: String,
}

/// What `start` hands back: either a runnable session or a pause.
pub enum StartOutcome {
    Ready(SessionHandle),
    /// Intake is waiting for the onboarding fields; resume or cancel through
    /// the session id.
    AwaitingOnboarding { session_id: Uuid, message: String },
}

/// Terminal result of one driven run.
pub enum RunOutcome {
    Completed(FinalReport),
    Failed(FailureReport),
}

/// Drives one analysis through the five stages in order.
///
/// The orchestrator owns no run state beyond parked onboarding sessions;
/// everything else lives in the handle the caller threads through, so
/// concurrent runs never share mutable context.
pub struct Orchestrator {
    intake: IntakeStage,
    risk: RiskStage,
    classify: ClassifyStage,
    policy: PolicyStage,
    report: ReportStage,
    sessions: SessionStore,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn StorePort>,
        bureau: Arc<dyn BureauPort>,
        retrieval: Arc<dyn RetrievalPort>,
        classifier: Arc<dyn RiskClassifierPort>,
        notifier: Arc<dyn NotifierPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            intake: IntakeStage::new(store.clone()),
            risk: RiskStage::new(bureau),
            classify: ClassifyStage::new(classifier),
            policy: PolicyStage::new(
                retrieval,
                settings.policy_dataset_id,
                settings.regulation_dataset_id,
                settings.min_confidence,
            ),
            report: ReportStage::new(store, notifier, settings.notify_recipient),
            sessions: SessionStore::default(),
        }
    }

    /// Validates the application and resolves the client.
    ///
    /// Unknown clients pause here: the run is parked and the caller must come
    /// back through `resume_onboarding` with the operator's reply.
    pub async fn start(&self, input: ClientInput) -> Result<StartOutcome, PipelineError> {
        let mut context = AnalysisContext::new();
        let mut journal = Journal::new();
        tracing::info!(
            target: "pipeline",
            run_id = %context.run_id,
            document_id = %input.document_id,
            "analysis_started"
        );

        match self.intake.run(&input, &mut context, &mut journal).await {
            Ok(IntakeOutcome::Complete) => Ok(StartOutcome::Ready(SessionHandle { context, journal })),
            Ok(IntakeOutcome::AwaitOnboarding) => {
                let session_id = Uuid::now_v7();
                journal.info(
                    intake::STAGE,
                    "Cadastro incompleto, aguardando email e telefone do operador",
                );
                self.sessions
                    .park(session_id, PausedRun { input, context, journal })
                    .await;
                tracing::info!(target: "pipeline", session_id = %session_id, "onboarding_pause");
                Ok(StartOutcome::AwaitingOnboarding {
                    session_id,
                    message: "Cliente não cadastrado. Informe email e telefone para concluir o cadastro."
                        .to_string(),
                })
            }
            Err(err) => {
                tracing::warn!(target: "pipeline", error = %err, "intake_rejected");
                Err(err)
            }
        }
    }

    /// Feeds the operator's reply into a paused run.
    ///
    /// Invalid fields re-park the run under the same session id; a cancel
    /// clears the session and voids the run with no partial report.
    pub async fn resume_onboarding(
        &self,
        session_id: Uuid,
        reply: OnboardingReply,
    ) -> Result<StartOutcome, PipelineError> {
        let Some(mut paused) = self.sessions.take(&session_id).await else {
            return Err(unknown_session(format!(
                "no paused run under session '{session_id}'"
            )));
        };

        match reply {
            OnboardingReply::Cancel => {
                paused.journal.warn(
                    intake::STAGE,
                    "Cadastro cancelado pelo operador, análise encerrada sem relatório",
                );
                tracing::info!(target: "pipeline", session_id = %session_id, "onboarding_cancelled");
                Err(onboarding_cancelled("onboarding cancelled by the operator"))
            }
            OnboardingReply::Submit { email, phone } => {
                let rejections = IntakeStage::onboarding_rejections(&email, &phone);
                if !rejections.is_empty() {
                    let message = rejections.join("; ");
                    paused
                        .journal
                        .warn(intake::STAGE, format!("Dados de cadastro recusados: {message}"));
                    self.sessions.park(session_id, paused).await;
                    return Ok(StartOutcome::AwaitingOnboarding { session_id, message });
                }

                let PausedRun {
                    input,
                    mut context,
                    mut journal,
                } = paused;
                self.intake
                    .complete_onboarding(&input, &email, &phone, &mut context, &mut journal)
                    .await;
                tracing::info!(
                    target: "pipeline",
                    session_id = %session_id,
                    run_id = %context.run_id,
                    "onboarding_completed"
                );
                Ok(StartOutcome::Ready(SessionHandle { context, journal }))
            }
        }
    }

    /// Runs stages 2 through 5 and always produces a terminal outcome.
    ///
    /// Stage failures never escape as errors; they are folded into a
    /// `FailureReport` together with the journal collected so far.
    pub async fn run_to_completion(&self, handle: SessionHandle) -> RunOutcome {
        let SessionHandle {
            mut context,
            mut journal,
        } = handle;
        let run_id = context.run_id;

        if let Err(err) = self.risk.run(&mut context, &mut journal).await {
            return fail(run_id, risk::STAGE, err, journal);
        }
        if let Err(err) = self.classify.run(&mut context, &mut journal).await {
            return fail(run_id, classify::STAGE, err, journal);
        }
        if let Err(err) = self.policy.run(&mut context, &mut journal).await {
            return fail(run_id, policy::STAGE, err, journal);
        }
        match self.report.run(&mut context, &mut journal).await {
            Ok(outcome) => {
                tracing::info!(
                    target: "pipeline",
                    run_id = %run_id,
                    analysis_id = %outcome.analysis_id,
                    recommendation = %outcome.recommendation,
                    persisted = outcome.persisted,
                    "analysis_completed"
                );
                RunOutcome::Completed(FinalReport {
                    analysis_id: outcome.analysis_id,
                    recommendation: outcome.recommendation,
                    decision_notes: outcome.decision_notes,
                    persisted: outcome.persisted,
                    loan_recorded: outcome.loan_recorded,
                    notification: outcome.notification,
                    report_document: outcome.report_document,
                    context,
                    journal: journal.into_entries(),
                    finished_at: outcome.finished_at,
                })
            }
            Err(err) => fail(run_id, report::STAGE, err, journal),
        }
    }

    /// Paused runs currently waiting on an operator reply.
    pub async fn pending_onboardings(&self) -> usize {
        self.sessions.pending().await
    }
}

fn fail(run_id: Uuid, stage: &str, err: PipelineError, mut journal: Journal) -> RunOutcome {
    journal.error(stage, format!("Falha interna encerrou a análise: {err}"));
    tracing::error!(
        target: "pipeline",
        run_id = %run_id,
        stage = stage,
        error = %err,
        "analysis_failed"
    );
    RunOutcome::Failed(FailureReport {
        run_id,
        stage: stage.to_string(),
        message: err.message,
        journal: journal.into_entries(),
    })
}
