#![allow(dead_code)]

pub mod classify;
pub mod intake;
pub mod policy;
pub mod report;
pub mod risk;

pub use classify::ClassifyStage;
pub use intake::{IntakeOutcome, IntakeStage};
pub use policy::PolicyStage;
pub use report::{ReportOutcome, ReportStage};
pub use risk::RiskStage;
