use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::sync::Mutex;

use crate::pipeline::types::RiskClass;

/// Outcome of one classification call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub risk_class: RiskClass,
    pub default_probability: f64,
}

/// Replaceable risk model consumed by the classification stage.
///
/// The orchestrator only ever sees this trait, so a trained model can take
/// the place of the builtin threshold strategy without touching stage code.
#[async_trait]
pub trait RiskClassifierPort: Send + Sync {
    async fn classify(&self, financial_score: i32) -> RiskAssessment;
}

/// Builtin stand-in for a trained model.
///
/// Derives the class from the score bands and draws the default probability
/// from a class-conditioned range: [0.01, 0.10) for low risk, [0.05, 0.35)
/// otherwise.
pub struct ThresholdClassifier {
    rng: Mutex<StdRng>,
}

impl ThresholdClassifier {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic draws for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskClassifierPort for ThresholdClassifier {
    async fn classify(&self, financial_score: i32) -> RiskAssessment {
        let risk_class = RiskClass::from_score(financial_score);
        let default_probability = {
            let mut rng = self.rng.lock().await;
            match risk_class {
                RiskClass::Low => rng.gen_range(0.01..0.10),
                RiskClass::Medium | RiskClass::High => rng.gen_range(0.05..0.35),
            }
        };
        RiskAssessment {
            risk_class,
            default_probability,
        }
    }
}
