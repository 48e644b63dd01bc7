#![allow(dead_code)]

pub mod error;
pub mod orchestrator;
pub mod session;
pub mod stages;
pub mod types;

pub use error::{PipelineError, PipelineErrorKind};
pub use orchestrator::{Orchestrator, PipelineSettings, RunOutcome, StartOutcome};
pub use session::{OnboardingReply, SessionHandle};
pub use types::{
    AnalysisContext, ClientInput, ClientProfile, CreditHistory, FailureReport, FinalReport,
    Recommendation, RiskClass,
};
