use crate::config::{BrandProfile, DashboardConfig};
use crate::error::Result;
use crate::ingestion::{load_narrative, read_accounts, read_customers};
use crate::summary::{inner_join, PortfolioSummary};
use chrono::{DateTime, Utc};
use log::{error, info};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// The grounding text handed to every prompt: narrative followed by the
/// rendered portfolio summary.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    pub text: String,
    /// The rendered portfolio block alone, empty when unavailable.
    pub summary: String,
    /// Load failures that degraded the text, for display to the user.
    pub issues: Vec<String>,
    pub built_at: DateTime<Utc>,
}

impl KnowledgeBase {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Identity of the inputs a knowledge base was built from. A changed
/// fingerprint forces a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint(Vec<(PathBuf, Option<SystemTime>, Option<u64>)>);

impl SourceFingerprint {
    pub fn of_paths<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        Self(
            paths
                .into_iter()
                .map(|path| {
                    let meta = std::fs::metadata(path).ok();
                    let modified = meta.as_ref().and_then(|m| m.modified().ok());
                    let len = meta.as_ref().map(|m| m.len());
                    (path.clone(), modified, len)
                })
                .collect(),
        )
    }
}

pub trait KnowledgeSource {
    fn fingerprint(&self) -> SourceFingerprint;
    fn narrative(&self) -> Result<String>;
    fn portfolio_summary(&self) -> Result<String>;
}

/// Reads the narrative document and the two CSV tables from disk.
#[derive(Debug, Clone)]
pub struct FileKnowledgeSource {
    pub narrative_path: PathBuf,
    pub customers_path: PathBuf,
    pub accounts_path: PathBuf,
    pub brand: BrandProfile,
}

impl FileKnowledgeSource {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            narrative_path: config.narrative_path.clone(),
            customers_path: config.customers_path.clone(),
            accounts_path: config.accounts_path.clone(),
            brand: config.brand.clone(),
        }
    }

    /// Reads both tables and aggregates their inner join.
    pub fn portfolio(&self) -> Result<PortfolioSummary> {
        let customers = read_customers(&self.customers_path)?;
        let accounts = read_accounts(&self.accounts_path)?;
        PortfolioSummary::from_records(&inner_join(&customers, &accounts))
    }
}

impl KnowledgeSource for FileKnowledgeSource {
    fn fingerprint(&self) -> SourceFingerprint {
        SourceFingerprint::of_paths([
            &self.narrative_path,
            &self.customers_path,
            &self.accounts_path,
        ])
    }

    fn narrative(&self) -> Result<String> {
        load_narrative(&self.narrative_path)
    }

    fn portfolio_summary(&self) -> Result<String> {
        Ok(self.portfolio()?.render(&self.brand))
    }
}

/// Builds a knowledge base without caching. A failing part is logged,
/// recorded as an issue and replaced by nothing.
pub fn build_knowledge_base(source: &impl KnowledgeSource) -> KnowledgeBase {
    let mut issues = Vec::new();

    let narrative = source.narrative().unwrap_or_else(|e| {
        error!("Error loading knowledge base narrative: {}", e);
        issues.push(format!("Error loading knowledge base narrative: {}", e));
        String::new()
    });

    let summary = source.portfolio_summary().unwrap_or_else(|e| {
        error!("Error loading portfolio dataset: {}", e);
        issues.push(format!("Error loading portfolio dataset: {}", e));
        String::new()
    });

    let text = match (narrative.is_empty(), summary.is_empty()) {
        (false, false) => format!("{}\n{}", narrative, summary),
        (false, true) => narrative,
        (true, false) => summary.clone(),
        (true, true) => String::new(),
    };

    info!(
        "Built knowledge base ({} characters, {} issues)",
        text.len(),
        issues.len()
    );

    KnowledgeBase {
        text,
        summary,
        issues,
        built_at: Utc::now(),
    }
}

struct CachedKnowledge {
    fingerprint: SourceFingerprint,
    value: Arc<KnowledgeBase>,
}

/// Process-wide memo for the knowledge base.
///
/// The first caller builds the value while holding the lock, so concurrent
/// callers all receive the same `Arc`. The value is rebuilt only after
/// [`invalidate`](Self::invalidate) or when the source fingerprint changes.
#[derive(Default)]
pub struct KnowledgeBaseCache {
    slot: Mutex<Option<CachedKnowledge>>,
}

impl KnowledgeBaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, source: &impl KnowledgeSource) -> Arc<KnowledgeBase> {
        let fingerprint = source.fingerprint();
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = slot.as_ref() {
            if cached.fingerprint == fingerprint {
                return Arc::clone(&cached.value);
            }
            info!("Knowledge base inputs changed; rebuilding");
        }

        let value = Arc::new(build_knowledge_base(source));
        *slot = Some(CachedKnowledge {
            fingerprint,
            value: Arc::clone(&value),
        });
        value
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }

    pub fn is_cached(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}
