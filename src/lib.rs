//! # Churn Insights
//!
//! A churn analytics assistant for a retail bank. It joins a customer table and
//! an account table, summarizes the portfolio, and combines that summary with a
//! narrative knowledge-base document. The result grounds two Gemini-backed
//! features: a question-answering chat and a long-form churn report.
//!
//! ## Core Concepts
//!
//! - **Portfolio summary**: descriptive statistics over the inner join of both tables
//!   (churn rate, averages, demographic and credit-tier distributions)
//! - **Knowledge base**: narrative text followed by the rendered summary, built once
//!   per process and rebuilt only when the inputs change or the cache is invalidated
//! - **History window**: the last ten `User:` / `Assistant:` lines replayed into each chat prompt
//! - **Degrade, don't abort**: unreadable inputs shrink the knowledge base; generation
//!   failures come back as readable text
//!
//! ## Example
//!
//! ```rust,ignore
//! use churn_insights::*;
//! use std::time::Duration;
//!
//! let config = DashboardConfig::default();
//! let templates = PromptTemplates::new(&config.brand)?;
//! let client = GeminiClient::from_env(&config.api_key_env, Duration::from_secs(120))?;
//! let dashboard = Dashboard::new(
//!     config.clone(),
//!     InsightsAssistant::new(client, templates),
//!     FileKnowledgeSource::from_config(&config),
//! );
//!
//! let mut session = ChatSession::new();
//! let answer = dashboard.ask(&mut session, "Which country has the highest churn?").await;
//! ```

pub mod config;
pub mod error;
pub mod ingestion;
pub mod knowledge;
pub mod schema;
pub mod session;
pub mod summary;

#[cfg(feature = "gemini")]
pub mod dashboard;
#[cfg(feature = "gemini")]
pub mod llm;

pub use config::{BrandProfile, DashboardConfig, ReportSection};
pub use error::{InsightsError, Result};
pub use ingestion::{load_narrative, read_accounts, read_customers};
pub use knowledge::{
    build_knowledge_base, FileKnowledgeSource, KnowledgeBase, KnowledgeBaseCache, KnowledgeSource,
};
pub use schema::*;
pub use session::{ChatSession, ChatTurn, Role};
pub use summary::{inner_join, summarize, PortfolioSummary};

#[cfg(feature = "gemini")]
pub use dashboard::Dashboard;
#[cfg(feature = "gemini")]
pub use llm::{
    GeminiClient, GenerationParams, GenerationRequest, InsightsAssistant, ModelVariant,
    PromptTemplates, TextGenerator,
};
