use serde::{Deserialize, Deserializer, Serialize};

/// One row of the customer spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "CustomerId")]
    pub customer_id: u64,

    #[serde(rename = "Surname", default)]
    pub surname: Option<String>,

    #[serde(rename = "CreditScore")]
    pub credit_score: u32,

    #[serde(rename = "Country")]
    pub country: String,

    #[serde(rename = "Gender")]
    pub gender: String,

    #[serde(rename = "Age")]
    pub age: u32,

    #[serde(rename = "Tenure", default)]
    pub tenure: Option<u32>,

    #[serde(rename = "EstimatedSalary", default)]
    pub estimated_salary: Option<f64>,

    /// Stored as a 0/1 column in the source sheet.
    #[serde(rename = "ActiveMember", deserialize_with = "deserialize_flag")]
    pub active_member: bool,
}

/// One row of the account spreadsheet, keyed by the same `CustomerId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(rename = "CustomerId")]
    pub customer_id: u64,

    /// Always finite; `NaN` and `inf` cells are rejected at load.
    #[serde(rename = "Balance", deserialize_with = "deserialize_finite")]
    pub balance: f64,

    #[serde(rename = "Products")]
    pub products: u32,

    #[serde(
        rename = "HasCrCard",
        default,
        deserialize_with = "deserialize_optional_flag"
    )]
    pub has_credit_card: Option<bool>,

    /// Churn indicator: the customer has left the bank.
    #[serde(rename = "Exited", deserialize_with = "deserialize_flag")]
    pub exited: bool,
}

/// A customer paired with exactly one of their account rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub customer: CustomerRecord,
    pub account: AccountRecord,
}

impl MergedRecord {
    pub fn customer_id(&self) -> u64 {
        self.customer.customer_id
    }

    pub fn credit_tier(&self) -> CreditTier {
        CreditTier::from_score(self.customer.credit_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditTier {
    Low,
    Moderate,
    High,
}

impl CreditTier {
    pub const MODERATE_FLOOR: u32 = 580;
    pub const HIGH_FLOOR: u32 = 700;

    pub fn from_score(score: u32) -> Self {
        if score < Self::MODERATE_FLOOR {
            CreditTier::Low
        } else if score < Self::HIGH_FLOOR {
            CreditTier::Moderate
        } else {
            CreditTier::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CreditTier::Low => "Low",
            CreditTier::Moderate => "Moderate",
            CreditTier::High => "High",
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" => Some(true),
        "0" | "0.0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a 0/1 flag, got '{}'", raw)))
}

fn deserialize_finite<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a finite amount, got '{}'",
            value
        )))
    }
}

fn deserialize_optional_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse_flag(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a 0/1 flag, got '{}'", value))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_tier_boundaries() {
        assert_eq!(CreditTier::from_score(579), CreditTier::Low);
        assert_eq!(CreditTier::from_score(580), CreditTier::Moderate);
        assert_eq!(CreditTier::from_score(699), CreditTier::Moderate);
        assert_eq!(CreditTier::from_score(700), CreditTier::High);
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" 0.0 "), Some(false));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
