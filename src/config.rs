use crate::error::{InsightsError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that points at an optional JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "CHURN_DASHBOARD_CONFIG";

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_HISTORY_WINDOW: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Placeholder in report outline points, replaced by the brand's regions.
pub const REGIONS_PLACEHOLDER: &str = "{regions}";

const DEFAULT_VIEWER_URL: &str = "https://app.powerbi.com/view?r=eyJrIjoiMjc3ZGMwZTUtYzZlMy00NzA4LWFhNDItYzdmMDI4MjIyNDUwIiwidCI6IjhkMWE2OWVjLTAzYjUtNDM0NS1hZTIxLWRhZDExMmY1ZmI0ZiIsImMiOjN9";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub narrative_path: PathBuf,
    pub customers_path: PathBuf,
    pub accounts_path: PathBuf,
    /// Embedded external report viewer; displayed, never fetched.
    pub viewer_url: String,
    /// Name of the environment variable holding the Gemini API key.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub history_window: usize,
    pub brand: BrandProfile,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            narrative_path: PathBuf::from("attached_assets/VeritasBank_Churn_Knowledge_Base.md"),
            customers_path: PathBuf::from("attached_assets/CustomerInfo.csv"),
            accounts_path: PathBuf::from("attached_assets/AccountInfo.csv"),
            viewer_url: DEFAULT_VIEWER_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            history_window: DEFAULT_HISTORY_WINDOW,
            brand: BrandProfile::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| InsightsError::data_load(path, e))?;
        let config: DashboardConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        info!("Loaded dashboard configuration from {}", path.display());
        Ok(config)
    }

    /// Reads the file named by `CHURN_DASHBOARD_CONFIG`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key_env.trim().is_empty() {
            return Err(InsightsError::Configuration(
                "api_key_env must name an environment variable".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(InsightsError::Configuration(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.history_window == 0 {
            return Err(InsightsError::Configuration(
                "history_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything the prompts and summary need to speak for one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandProfile {
    pub organization: String,
    pub analyst_name: String,
    pub analyst_title: String,
    pub currency_symbol: String,
    /// Countries the bank operates in; substituted for `{regions}` in outline points.
    pub regions: Vec<String>,
    pub report_sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub heading: String,
    pub points: Vec<String>,
}

impl ReportSection {
    fn new(heading: &str, points: &[&str]) -> Self {
        Self {
            heading: heading.to_string(),
            points: points.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl BrandProfile {
    pub fn report_title(&self) -> String {
        format!(
            "{} – CUSTOMER CHURN ANALYSIS REPORT",
            self.organization.to_uppercase()
        )
    }

    /// Report sections with `{regions}` filled in from `regions`.
    pub fn expanded_sections(&self) -> Vec<ReportSection> {
        let regions = self.regions.join(", ");
        self.report_sections
            .iter()
            .map(|section| ReportSection {
                heading: section.heading.clone(),
                points: section
                    .points
                    .iter()
                    .map(|point| point.replace(REGIONS_PLACEHOLDER, &regions))
                    .collect(),
            })
            .collect()
    }
}

impl Default for BrandProfile {
    fn default() -> Self {
        let country_breakdown = format!("Country breakdown ({})", REGIONS_PLACEHOLDER);

        Self {
            organization: "Veritas Bank".to_string(),
            analyst_name: "Francis Afful Gyan".to_string(),
            analyst_title: "Business Intelligence Specialist".to_string(),
            currency_symbol: "£".to_string(),
            report_sections: vec![
                ReportSection::new(
                    "Executive Summary",
                    &[
                        "Summarize overall churn, retention, and customer health",
                        "Identify major churn drivers",
                    ],
                ),
                ReportSection::new(
                    "Customer Demographics Overview",
                    &[
                        country_breakdown.as_str(),
                        "Gender, age, tenure, and balance patterns",
                    ],
                ),
                ReportSection::new(
                    "Churn and Retention Insights",
                    &[
                        "Overall churn rate and country comparison",
                        "Relationship with tenure and credit score",
                    ],
                ),
                ReportSection::new(
                    "Account Behavior and Financial Profile",
                    &[
                        "Average balances, products per customer, and credit card ownership",
                        "Differences between active and exited customers",
                    ],
                ),
                ReportSection::new(
                    "Predictive Insights and Risk Factors",
                    &[
                        "Variables most correlated with churn",
                        "Profiles of high-risk segments",
                    ],
                ),
                ReportSection::new(
                    "Strategic Business Implications",
                    &[
                        "Impact on profitability",
                        "Opportunities for cross-sell and upsell",
                    ],
                ),
                ReportSection::new(
                    "Recommendations for Retention",
                    &["5–7 actionable strategies with measurable goals"],
                ),
                ReportSection::new(
                    "Conclusion",
                    &[
                        "Overall customer health summary",
                        "Next steps for churn mitigation",
                    ],
                ),
            ],
            regions: vec![
                "France".to_string(),
                "Germany".to_string(),
                "UK".to_string(),
            ],
        }
    }
}
