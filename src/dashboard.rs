use chrono::NaiveDate;
use log::info;
use std::fmt::Write;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::knowledge::{FileKnowledgeSource, KnowledgeBase, KnowledgeBaseCache, KnowledgeSource};
use crate::llm::{InsightsAssistant, TextGenerator};
use crate::session::{ChatSession, Role};

pub const SAMPLE_QUESTIONS: &[&str] = &[
    "What is the current churn rate at {org}?",
    "Which country has the highest churn rate?",
    "How does credit score affect churn likelihood?",
    "What is the average balance of churned customers?",
    "Are inactive members more likely to churn?",
    "Which customer age group has the highest attrition?",
    "What are the top retention recommendations?",
    "Show me the churn distribution by engagement level.",
];

/// Drives one dashboard: the shared knowledge base plus the chat and report
/// actions. Session state is passed in by the caller.
pub struct Dashboard<G, S> {
    config: DashboardConfig,
    assistant: InsightsAssistant<G>,
    source: S,
    cache: KnowledgeBaseCache,
}

impl<G: TextGenerator, S: KnowledgeSource> Dashboard<G, S> {
    pub fn new(config: DashboardConfig, assistant: InsightsAssistant<G>, source: S) -> Self {
        Self {
            config,
            assistant,
            source,
            cache: KnowledgeBaseCache::new(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn knowledge(&self) -> Arc<KnowledgeBase> {
        self.cache.get_or_build(&self.source)
    }

    /// Drops the cached knowledge base; the next action rebuilds it.
    pub fn reload(&self) {
        info!("Knowledge base cache invalidated");
        self.cache.invalidate();
    }

    fn chat_key_notice(&self) -> String {
        format!(
            "⚠️ Please set your {} to use the chatbot.",
            self.config.api_key_env
        )
    }

    fn report_key_notice(&self) -> String {
        format!(
            "⚠️ {} not set. Please add API key in your .env file.",
            self.config.api_key_env
        )
    }

    /// Runs one chat turn and records it in `session`.
    ///
    /// Without a credential the notice is shown in the transcript but kept
    /// out of the history fed to later prompts.
    pub async fn ask(&self, session: &mut ChatSession, question: &str) -> String {
        let knowledge = self.knowledge();

        let result = {
            let history = session.recent_history(self.config.history_window);
            self.assistant
                .chat(question, &knowledge.text, &history)
                .await
        };

        match result {
            Ok(answer) => {
                session.append_turn(Role::User, question);
                session.append_turn(Role::Assistant, answer.as_str());
                answer
            }
            Err(e) => {
                info!("Chat unavailable: {}", e);
                let notice = self.chat_key_notice();
                session.append_display_only(Role::User, question);
                session.append_display_only(Role::Assistant, notice.as_str());
                notice
            }
        }
    }

    pub async fn report(&self, date: NaiveDate) -> String {
        let knowledge = self.knowledge();
        match self.assistant.report(&knowledge.text, date).await {
            Ok(report) => report,
            Err(e) => {
                info!("Report unavailable: {}", e);
                self.report_key_notice()
            }
        }
    }

    pub fn header(&self) -> String {
        let organization = &self.config.brand.organization;
        format!(
            "🏦 {}\nCustomer Churn Analysis Dashboard & AI Assistant\n{}",
            organization,
            "─".repeat(60)
        )
    }

    /// Load warnings, the viewer link and the portfolio figures.
    pub fn overview(&self) -> String {
        let knowledge = self.knowledge();
        let mut out = String::new();

        for issue in &knowledge.issues {
            let _ = writeln!(out, "⚠️ {}", issue);
        }

        let _ = writeln!(out, "📊 Interactive dashboard: {}", self.config.viewer_url);
        if !self.assistant.is_configured() {
            let _ = writeln!(out, "{}", self.report_key_notice());
        }
        out.push('\n');

        if knowledge.summary.is_empty() {
            out.push_str("Portfolio summary unavailable.\n");
        } else {
            out.push_str(&knowledge.summary);
        }
        out
    }

    pub fn sample_questions(&self) -> Vec<String> {
        SAMPLE_QUESTIONS
            .iter()
            .map(|q| q.replace("{org}", &self.config.brand.organization))
            .collect()
    }
}

impl<G: TextGenerator> Dashboard<G, FileKnowledgeSource> {
    /// Portfolio aggregates as JSON, read fresh from the configured tables.
    pub fn summary_json(&self) -> Result<String> {
        self.source.portfolio()?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InsightsError, Result};
    use crate::knowledge::SourceFingerprint;
    use crate::llm::{GenerationRequest, PromptTemplates};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct EchoGenerator {
        configured: bool,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate_text(&self, request: &GenerationRequest) -> Result<Option<String>> {
            let count = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(request.prompt.clone());
                prompts.len()
            };
            Ok(Some(format!("answer {}", count)))
        }
    }

    struct StaticSource {
        builds: AtomicUsize,
    }

    impl KnowledgeSource for StaticSource {
        fn fingerprint(&self) -> SourceFingerprint {
            SourceFingerprint::of_paths(std::iter::empty())
        }

        fn narrative(&self) -> Result<String> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok("Veritas Bank serves customers in France, Germany and Spain.".to_string())
        }

        fn portfolio_summary(&self) -> Result<String> {
            Err(InsightsError::EmptyDataset)
        }
    }

    fn dashboard(configured: bool) -> Dashboard<EchoGenerator, StaticSource> {
        let config = DashboardConfig::default();
        let templates = PromptTemplates::new(&config.brand).unwrap();
        let generator = EchoGenerator {
            configured,
            prompts: Mutex::new(Vec::new()),
        };
        Dashboard::new(
            config,
            InsightsAssistant::new(generator, templates),
            StaticSource {
                builds: AtomicUsize::new(0),
            },
        )
    }

    #[tokio::test]
    async fn test_ask_records_exchange_and_feeds_history_back() {
        let dashboard = dashboard(true);
        let mut session = ChatSession::new();

        let first = dashboard.ask(&mut session, "What is the churn rate?").await;
        assert_eq!(first, "answer 1");
        dashboard.ask(&mut session, "And by country?").await;

        assert_eq!(
            session.recent_history(10),
            vec![
                "User: What is the churn rate?",
                "Assistant: answer 1",
                "User: And by country?",
                "Assistant: answer 2",
            ]
        );

        let prompts = dashboard.assistant.generator().prompts.lock().unwrap().clone();
        assert!(prompts[1].contains("User: What is the churn rate?\n\nAssistant: answer 1\n\nUser Question: And by country?"));
        assert_eq!(dashboard.source.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ask_without_key_shows_notice_only() {
        let dashboard = dashboard(false);
        let mut session = ChatSession::new();

        let reply = dashboard.ask(&mut session, "hello").await;

        assert_eq!(reply, "⚠️ Please set your GEMINI_API_KEY to use the chatbot.");
        assert_eq!(session.transcript().len(), 2);
        assert!(session.recent_history(10).is_empty());
    }

    #[tokio::test]
    async fn test_report_without_key() {
        let dashboard = dashboard(false);
        let report = dashboard
            .report(NaiveDate::from_ymd_opt(2025, 11, 11).unwrap())
            .await;
        assert!(report.contains("GEMINI_API_KEY not set"));
    }

    #[test]
    fn test_overview_surfaces_issues() {
        let dashboard = dashboard(true);
        let overview = dashboard.overview();

        assert!(overview.contains("⚠️ Error loading portfolio dataset"));
        assert!(overview.contains("https://app.powerbi.com/view"));
        assert!(overview.contains("Portfolio summary unavailable."));
    }

    #[test]
    fn test_reload_rebuilds() {
        let dashboard = dashboard(true);
        dashboard.knowledge();
        dashboard.reload();
        dashboard.knowledge();
        assert_eq!(dashboard.source.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sample_questions_name_the_organization() {
        let questions = dashboard(true).sample_questions();
        assert_eq!(questions[0], "What is the current churn rate at Veritas Bank?");
        assert_eq!(questions.len(), 8);
    }
}
