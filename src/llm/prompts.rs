// Prompt templates for the chat assistant and the long-form report.

use crate::config::{BrandProfile, ReportSection, DEFAULT_HISTORY_WINDOW};
use crate::error::{InsightsError, Result};
use chrono::NaiveDate;

const SEGMENT_SEPARATOR: &str = "\n\n";

/// A worked question/answer pair shown to the model as a style reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleExchange {
    pub question: String,
    pub answer: String,
}

/// Named slots for the chat system block. Knowledge base, history and the
/// question are supplied per call.
#[derive(Debug, Clone)]
pub struct ChatTemplate {
    pub persona: String,
    pub role_rules: Vec<String>,
    pub response_guidelines: Vec<String>,
    pub examples: Vec<ExampleExchange>,
    pub reminder: String,
    pub history_window: usize,
}

#[derive(Debug, Clone)]
pub struct ReportTemplate {
    pub persona: String,
    pub mission: String,
    pub title: String,
    pub prepared_by: String,
    pub outline: Vec<ReportSection>,
    pub formatting_rules: Vec<String>,
}

/// The single parametrized template set, validated when built.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub chat: ChatTemplate,
    pub report: ReportTemplate,
}

impl PromptTemplates {
    pub fn new(brand: &BrandProfile) -> Result<Self> {
        validate_brand(brand)?;
        let templates = Self {
            chat: ChatTemplate::for_brand(brand),
            report: ReportTemplate::for_brand(brand),
        };
        templates.chat.validate()?;
        templates.report.validate(&brand.organization)?;
        Ok(templates)
    }

    pub fn with_history_window(mut self, window: usize) -> Result<Self> {
        if window == 0 {
            return Err(InsightsError::InvalidTemplate(
                "history window must hold at least one line".to_string(),
            ));
        }
        self.chat.history_window = window;
        Ok(self)
    }

    pub fn build_chat_prompt(&self, question: &str, knowledge_base: &str, history: &[&str]) -> String {
        self.chat.render(question, knowledge_base, history)
    }

    pub fn build_report_prompt(&self, knowledge_base: &str, date: NaiveDate) -> String {
        self.report.render(knowledge_base, date)
    }
}

fn validate_brand(brand: &BrandProfile) -> Result<()> {
    let required = [
        ("organization", &brand.organization),
        ("analyst_name", &brand.analyst_name),
        ("analyst_title", &brand.analyst_title),
        ("currency_symbol", &brand.currency_symbol),
    ];
    for (slot, value) in required {
        if value.trim().is_empty() {
            return Err(InsightsError::InvalidTemplate(format!(
                "brand slot '{}' must not be empty",
                slot
            )));
        }
    }
    if brand.regions.iter().all(|region| region.trim().is_empty()) {
        return Err(InsightsError::InvalidTemplate(
            "brand must name at least one region".to_string(),
        ));
    }
    Ok(())
}

fn non_empty(slot: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InsightsError::InvalidTemplate(format!(
            "slot '{}' must not be empty",
            slot
        )));
    }
    Ok(())
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ChatTemplate {
    pub fn for_brand(brand: &BrandProfile) -> Self {
        let org = &brand.organization;
        let cur = &brand.currency_symbol;

        Self {
            persona: format!(
                "You are an expert AI assistant for {org}. \n\
                 You specialize in analyzing customer churn, creditworthiness, and retention strategies using customer and account data."
            ),
            role_rules: vec![
                "Answer questions using ONLY the knowledge base and dataset provided below".to_string(),
                "Provide clear, specific, and data-driven responses".to_string(),
                "Use exact numbers and metrics from the data".to_string(),
                "Format your answers professionally and clearly".to_string(),
                format!(
                    "If a question is outside the scope, politely explain you can only answer based on {org}’s data"
                ),
            ],
            response_guidelines: vec![
                "Start with a direct, factual answer".to_string(),
                "Support with precise numbers and statistics from the knowledge base".to_string(),
                "Use bullet points (-) for multiple items".to_string(),
                "Keep your tone formal and business-oriented".to_string(),
                "Avoid asterisks (*) or markdown bold formatting".to_string(),
                "Separate numbers from words with spaces (e.g., 6,512 customers)".to_string(),
                format!("Format currency values with {cur} and commas (e.g., {cur}27,150.00)"),
                "Keep sentences short, clear, and professional".to_string(),
            ],
            examples: vec![
                ExampleExchange {
                    question: "What percentage of customers have exited the bank?".to_string(),
                    answer: "The bank’s churn rate is 13.9 percent, meaning approximately 1,390 out of 10,000 customers have left the bank. This indicates moderate attrition risk.".to_string(),
                },
                ExampleExchange {
                    question: "Which countries have the highest churn?".to_string(),
                    answer: "Germany records the highest churn rate at 20 percent, followed by France at 12 percent, and the United Kingdom at 8 percent. This suggests higher dissatisfaction among German customers.".to_string(),
                },
                ExampleExchange {
                    question: "How can the bank reduce churn?".to_string(),
                    answer: format!(
                        "To reduce churn, {org} should:\n\
                         - Target high-risk customers in Germany with retention incentives\n\
                         - Introduce loyalty programs for long-tenure clients\n\
                         - Review credit scoring criteria for fairness and transparency\n\
                         - Improve digital service experience for middle-income customers"
                    ),
                },
            ],
            reminder: format!(
                "Remember: Use specific metrics, write professionally, and focus on {org}’s churn and customer retention insights."
            ),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn validate(&self) -> Result<()> {
        non_empty("persona", &self.persona)?;
        non_empty("reminder", &self.reminder)?;
        if self.role_rules.is_empty() || self.response_guidelines.is_empty() {
            return Err(InsightsError::InvalidTemplate(
                "chat template needs role rules and response guidelines".to_string(),
            ));
        }
        Ok(())
    }

    fn system_block(&self, knowledge_base: &str) -> String {
        let examples = self
            .examples
            .iter()
            .map(|ex| format!("User: \"{}\"\nResponse: \"{}\"", ex.question, ex.answer))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"{persona}

YOUR ROLE:
{rules}

RESPONSE GUIDELINES:
{guidelines}

EXAMPLE INTERACTIONS:

{examples}

KNOWLEDGE BASE:
{knowledge_base}

{reminder}
"#,
            persona = self.persona,
            rules = bullet_list(&self.role_rules),
            guidelines = numbered_list(&self.response_guidelines),
            examples = examples,
            knowledge_base = knowledge_base,
            reminder = self.reminder,
        )
    }

    /// System block, then the trailing history window in original order,
    /// then the question; segments separated by a blank line.
    pub fn render(&self, question: &str, knowledge_base: &str, history: &[&str]) -> String {
        let start = history.len().saturating_sub(self.history_window);

        let mut segments: Vec<String> = Vec::with_capacity(history.len() - start + 2);
        segments.push(self.system_block(knowledge_base));
        segments.extend(history[start..].iter().map(|line| line.to_string()));
        segments.push(format!("User Question: {}", question));

        segments.join(SEGMENT_SEPARATOR)
    }
}

impl ReportTemplate {
    pub fn for_brand(brand: &BrandProfile) -> Self {
        let org = &brand.organization;
        let cur = &brand.currency_symbol;

        Self {
            persona: format!(
                "You are {}, a {} for {org}.",
                brand.analyst_name, brand.analyst_title
            ),
            mission: format!(
                "Your task is to generate a professional, data-driven report strictly about {org}’s Customer Churn Analysis.\n\
                 Do NOT include any other companies, gyms, fitness businesses, or unrelated content."
            ),
            title: brand.report_title(),
            prepared_by: format!("{}, {}", brand.analyst_name, brand.analyst_title),
            outline: brand.expanded_sections(),
            formatting_rules: vec![
                format!("Mention \"{org}\" in the title and introduction"),
                format!("Use {cur} for currency and commas (e.g., {cur}1,250,000.00)"),
                "Use clear markdown headings (#, ##)".to_string(),
                "Use bullet points (-) for lists".to_string(),
                "Do not use bold formatting or asterisks (*)".to_string(),
                "Maintain a formal, analytical tone".to_string(),
            ],
        }
    }

    pub fn validate(&self, organization: &str) -> Result<()> {
        non_empty("persona", &self.persona)?;
        non_empty("title", &self.title)?;
        if !self
            .title
            .to_lowercase()
            .contains(&organization.to_lowercase())
        {
            return Err(InsightsError::InvalidTemplate(format!(
                "report title '{}' must name {}",
                self.title, organization
            )));
        }
        if self.outline.is_empty() {
            return Err(InsightsError::InvalidTemplate(
                "report outline has no sections".to_string(),
            ));
        }
        for section in &self.outline {
            non_empty("outline heading", &section.heading)?;
        }
        Ok(())
    }

    fn outline_block(&self) -> String {
        self.outline
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let mut block = format!("## {}. {}", i + 1, section.heading);
                for point in &section.points {
                    block.push_str("\n- ");
                    block.push_str(point);
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn render(&self, knowledge_base: &str, date: NaiveDate) -> String {
        format!(
            r#"
{persona}

{mission}

The report MUST begin with this title:
{title}

KNOWLEDGE BASE:
{knowledge_base}

Use this structure:

# {title}
Date: {date}
Prepared by: {prepared_by}

{outline}

RESPONSE RULES:
{rules}
"#,
            persona = self.persona,
            mission = self.mission,
            title = self.title,
            knowledge_base = knowledge_base,
            date = date.format("%-d %B %Y"),
            prepared_by = self.prepared_by,
            outline = self.outline_block(),
            rules = bullet_list(&self.formatting_rules),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> PromptTemplates {
        PromptTemplates::new(&BrandProfile::default()).unwrap()
    }

    #[test]
    fn test_chat_prompt_layout() {
        let prompt = templates().build_chat_prompt(
            "Which country churns most?",
            "KB-TEXT",
            &["User: hi", "Assistant: hello"],
        );

        assert!(prompt.starts_with("You are an expert AI assistant for Veritas Bank."));
        assert!(prompt.contains("KNOWLEDGE BASE:\nKB-TEXT\n"));
        assert!(prompt.contains("7. Format currency values with £ and commas (e.g., £27,150.00)"));
        assert!(prompt.ends_with("\n\nUser: hi\n\nAssistant: hello\n\nUser Question: Which country churns most?"));
    }

    #[test]
    fn test_chat_prompt_keeps_only_last_ten_history_lines() {
        let lines: Vec<String> = (0..14).map(|i| format!("User: q{}", i)).collect();
        let history: Vec<&str> = lines.iter().map(String::as_str).collect();

        let prompt = templates().build_chat_prompt("next", "KB", &history);

        assert!(!prompt.contains("User: q3\n"));
        assert!(prompt.contains("\n\nUser: q4\n\n"));
        let q4 = prompt.find("User: q4").unwrap();
        let q13 = prompt.find("User: q13").unwrap();
        assert!(q4 < q13);
    }

    #[test]
    fn test_empty_knowledge_base_still_renders() {
        let prompt = templates().build_chat_prompt("anything", "", &[]);
        assert!(prompt.contains("KNOWLEDGE BASE:\n\n"));
        assert!(prompt.ends_with("User Question: anything"));
    }

    #[test]
    fn test_report_prompt_structure() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 11).unwrap();
        let prompt = templates().build_report_prompt("KB-TEXT", date);

        assert!(prompt.contains("You are Francis Afful Gyan, a Business Intelligence Specialist for Veritas Bank."));
        assert!(prompt.contains("# VERITAS BANK – CUSTOMER CHURN ANALYSIS REPORT\nDate: 11 November 2025"));
        assert!(prompt.contains("KNOWLEDGE BASE:\nKB-TEXT\n"));
        assert!(prompt.contains("## 1. Executive Summary"));
        assert!(prompt.contains("## 8. Conclusion"));
        assert!(prompt.contains("- Country breakdown (France, Germany, UK)"));
        assert!(prompt.contains("- Use £ for currency and commas (e.g., £1,250,000.00)"));
        assert!(prompt.contains("- Do not use bold formatting or asterisks (*)"));
    }

    #[test]
    fn test_templates_follow_brand() {
        let brand = BrandProfile {
            organization: "Northwind Credit Union".to_string(),
            currency_symbol: "$".to_string(),
            ..BrandProfile::default()
        };
        let templates = PromptTemplates::new(&brand).unwrap();

        let chat = templates.build_chat_prompt("q", "kb", &[]);
        assert!(chat.contains("Northwind Credit Union’s data"));
        assert!(chat.contains("$27,150.00"));

        let report = templates.build_report_prompt("kb", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!(report.contains("NORTHWIND CREDIT UNION – CUSTOMER CHURN ANALYSIS REPORT"));
        assert!(report.contains("Date: 5 January 2026"));
    }

    #[test]
    fn test_report_outline_uses_brand_regions() {
        let brand = BrandProfile {
            regions: vec!["Spain".to_string()],
            ..BrandProfile::default()
        };
        let report = PromptTemplates::new(&brand)
            .unwrap()
            .build_report_prompt("kb", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());

        assert!(report.contains("- Country breakdown (Spain)\n"));
        assert!(!report.contains("France, Germany, UK"));
        assert!(!report.contains("{regions}"));

        let no_regions = BrandProfile {
            regions: vec![],
            ..BrandProfile::default()
        };
        assert!(matches!(
            PromptTemplates::new(&no_regions),
            Err(InsightsError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_invalid_templates_are_rejected() {
        let blank = BrandProfile {
            organization: "  ".to_string(),
            ..BrandProfile::default()
        };
        assert!(matches!(
            PromptTemplates::new(&blank),
            Err(InsightsError::InvalidTemplate(_))
        ));

        let no_outline = BrandProfile {
            report_sections: vec![],
            ..BrandProfile::default()
        };
        assert!(matches!(
            PromptTemplates::new(&no_outline),
            Err(InsightsError::InvalidTemplate(_))
        ));

        assert!(templates().with_history_window(0).is_err());
    }

    #[test]
    fn test_custom_history_window() {
        let templates = templates().with_history_window(2).unwrap();
        let prompt = templates.build_chat_prompt("q", "kb", &["User: a", "Assistant: b", "User: c"]);
        assert!(!prompt.contains("User: a"));
        assert!(prompt.contains("Assistant: b\n\nUser: c\n\nUser Question: q"));
    }
}
