use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// The submitted input can never produce an analysis.
    Validation,
    /// The operator abandoned onboarding; the whole run is void.
    OnboardingCancelled,
    /// No paused run exists under the given session id.
    UnknownSession,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
    pub kind: PipelineErrorKind,
    pub message: String,
}

impl PipelineError {
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PipelineError {}

pub fn validation_error(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::Validation, message)
}

pub fn onboarding_cancelled(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::OnboardingCancelled, message)
}

pub fn unknown_session(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::UnknownSession, message)
}

pub fn internal_error(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::Internal, message)
}
