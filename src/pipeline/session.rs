use std::collections::BTreeMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::journal::Journal;
use crate::pipeline::types::{AnalysisContext, ClientInput};

/// Run that cleared intake and is ready for the remaining stages.
///
/// The handle owns the run's context and journal; handing it to
/// `run_to_completion` consumes it, so a finished run can never be driven
/// twice.
pub struct SessionHandle {
    pub(crate) context: AnalysisContext,
    pub(crate) journal: Journal,
}

impl SessionHandle {
    pub fn run_id(&self) -> Uuid {
        self.context.run_id
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

/// Operator's answer to a pending onboarding interrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingReply {
    Submit { email: String, phone: String },
    Cancel,
}

/// Run parked while intake waits for the onboarding fields.
#[derive(Debug)]
pub(crate) struct PausedRun {
    pub input: ClientInput,
    pub context: AnalysisContext,
    pub journal: Journal,
}

/// Paused runs keyed by session id.
///
/// Entries only exist between an onboarding pause and its resume or cancel;
/// completed and cancelled runs leave nothing behind.
#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    sessions: Mutex<BTreeMap<Uuid, PausedRun>>,
}

impl SessionStore {
    pub async fn park(&self, session_id: Uuid, run: PausedRun) {
        self.sessions.lock().await.insert(session_id, run);
    }

    pub async fn take(&self, session_id: &Uuid) -> Option<PausedRun> {
        self.sessions.lock().await.remove(session_id)
    }

    pub async fn pending(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
