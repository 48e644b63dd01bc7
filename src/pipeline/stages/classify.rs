use std::sync::Arc;

use crate::classifier::RiskClassifierPort;
use crate::journal::Journal;
use crate::pipeline::error::PipelineError;
use crate::pipeline::types::AnalysisContext;

pub const STAGE: &str = "classification";

/// Stage 3: authoritative risk class and default probability.
///
/// Whatever the model answers replaces the preliminary class written by the
/// scoring stage; downstream stages only ever read the value set here.
pub struct ClassifyStage {
    classifier: Arc<dyn RiskClassifierPort>,
}

impl ClassifyStage {
    pub fn new(classifier: Arc<dyn RiskClassifierPort>) -> Self {
        Self { classifier }
    }

    pub async fn run(
        &self,
        context: &mut AnalysisContext,
        journal: &mut Journal,
    ) -> Result<(), PipelineError> {
        let score = context.require_financial_score()?;
        let assessment = self.classifier.classify(score).await;
        context.risk_class = Some(assessment.risk_class);
        context.default_probability = Some(assessment.default_probability);
        journal.info(
            STAGE,
            format!(
                "Classe de risco {} com probabilidade de inadimplência de {:.1}%",
                assessment.risk_class.portuguese_label(),
                assessment.default_probability * 100.0
            ),
        );
        Ok(())
    }
}
