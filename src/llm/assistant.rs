use chrono::NaiveDate;
use log::{info, warn};

use crate::error::{InsightsError, Result};
use crate::llm::client::TextGenerator;
use crate::llm::prompts::PromptTemplates;
use crate::llm::types::GenerationRequest;

pub const CHAT_FALLBACK: &str =
    "I apologize, but I couldn’t generate a response. Please try again.";
pub const REPORT_FALLBACK: &str = "Unable to generate report.";

const CHAT_ERROR_PREFIX: &str = "Error: ";
const REPORT_ERROR_PREFIX: &str = "Error generating report: ";

/// Chat and report entry points over a [`TextGenerator`].
///
/// Only a missing credential comes back as `Err`. Transport and API failures
/// are turned into a prefixed message returned as the reply, and an empty
/// answer becomes a fixed fallback string.
pub struct InsightsAssistant<G> {
    generator: G,
    templates: PromptTemplates,
}

impl<G: TextGenerator> InsightsAssistant<G> {
    pub fn new(generator: G, templates: PromptTemplates) -> Self {
        Self {
            generator,
            templates,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Answers one question grounded in `knowledge_base` and the trailing history.
    pub async fn chat(&self, question: &str, knowledge_base: &str, history: &[&str]) -> Result<String> {
        let prompt = self
            .templates
            .build_chat_prompt(question, knowledge_base, history);
        self.run(GenerationRequest::chat(prompt), CHAT_FALLBACK, CHAT_ERROR_PREFIX)
            .await
    }

    /// Produces the long-form churn report dated `date`.
    pub async fn report(&self, knowledge_base: &str, date: NaiveDate) -> Result<String> {
        let prompt = self.templates.build_report_prompt(knowledge_base, date);
        info!("Generating comprehensive report ({} character prompt)", prompt.len());
        self.run(GenerationRequest::report(prompt), REPORT_FALLBACK, REPORT_ERROR_PREFIX)
            .await
    }

    async fn run(
        &self,
        request: GenerationRequest,
        fallback: &str,
        error_prefix: &str,
    ) -> Result<String> {
        if !self.generator.is_configured() {
            return Err(InsightsError::Configuration(
                "no API key configured for the generation client".to_string(),
            ));
        }

        match self.generator.generate_text(&request).await {
            Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                warn!("Model returned no text for {:?} request", request.variant);
                Ok(fallback.to_string())
            }
            Err(e) if e.is_configuration() => Err(e),
            Err(e) => {
                warn!("Generation failed for {:?} request: {}", request.variant, e);
                Ok(format!("{}{}", error_prefix, e))
            }
        }
    }
}
