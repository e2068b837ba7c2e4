use crate::config::BrandProfile;
use crate::error::{InsightsError, Result};
use crate::schema::{AccountRecord, CreditTier, CustomerRecord, MergedRecord};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRate {
    pub label: String,
    pub customers: usize,
    pub churn_rate: f64,
}

/// Descriptive statistics over the joined customer/account portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_customers: usize,
    pub active_customers: usize,
    pub inactive_customers: usize,
    pub churned_customers: usize,
    /// Percentage of merged records with the exited flag set.
    pub churn_rate: f64,
    pub average_credit_score: f64,
    pub average_balance: f64,
    pub average_age: f64,
    pub average_products: f64,
    pub active_member_rate: f64,
    pub gender_distribution: Vec<CategoryCount>,
    pub country_distribution: Vec<CategoryCount>,
    pub credit_tiers: Vec<CategoryCount>,
    pub churn_by_country: Vec<SegmentRate>,
    pub churn_by_activity: Vec<SegmentRate>,
}

/// Inner join on `CustomerId`, preserving the customer file's order.
///
/// Rows whose id appears on only one side are dropped without error. A
/// customer with several account rows yields one merged record per pair.
pub fn inner_join(customers: &[CustomerRecord], accounts: &[AccountRecord]) -> Vec<MergedRecord> {
    let mut accounts_by_id: HashMap<u64, Vec<&AccountRecord>> = HashMap::new();
    for account in accounts {
        accounts_by_id
            .entry(account.customer_id)
            .or_default()
            .push(account);
    }

    let mut merged = Vec::new();
    let mut unmatched_customers = 0usize;
    for customer in customers {
        match accounts_by_id.get(&customer.customer_id) {
            Some(matches) => {
                for account in matches {
                    merged.push(MergedRecord {
                        customer: customer.clone(),
                        account: (*account).clone(),
                    });
                }
            }
            None => unmatched_customers += 1,
        }
    }

    debug!(
        "Joined {} customers with {} accounts into {} records ({} customers without an account)",
        customers.len(),
        accounts.len(),
        merged.len(),
        unmatched_customers
    );

    merged
}

impl PortfolioSummary {
    pub fn from_records(records: &[MergedRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(InsightsError::EmptyDataset);
        }

        let total = records.len();
        let active = records.iter().filter(|r| r.customer.active_member).count();
        let churned = records.iter().filter(|r| r.account.exited).count();

        let mean = |value: fn(&MergedRecord) -> f64| -> f64 {
            records.iter().map(value).sum::<f64>() / total as f64
        };

        Ok(Self {
            total_customers: total,
            active_customers: active,
            inactive_customers: total - active,
            churned_customers: churned,
            churn_rate: percentage(churned, total),
            average_credit_score: mean(|r| r.customer.credit_score as f64),
            average_balance: mean(|r| r.account.balance),
            average_age: mean(|r| r.customer.age as f64),
            average_products: mean(|r| r.account.products as f64),
            active_member_rate: percentage(active, total),
            gender_distribution: value_counts(records.iter().map(|r| r.customer.gender.clone())),
            country_distribution: value_counts(records.iter().map(|r| r.customer.country.clone())),
            credit_tiers: value_counts(records.iter().map(|r| r.credit_tier().label().to_string())),
            churn_by_country: churn_by(records, |r| r.customer.country.clone()),
            churn_by_activity: churn_by(records, |r| {
                if r.customer.active_member {
                    "Active Members".to_string()
                } else {
                    "Inactive Members".to_string()
                }
            }),
        })
    }

    /// Pretty-printed JSON form of the aggregates.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn credit_tier_count(&self, tier: CreditTier) -> usize {
        self.credit_tiers
            .iter()
            .find(|c| c.label == tier.label())
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Renders the fixed-format block appended to the knowledge base.
    pub fn render(&self, brand: &BrandProfile) -> String {
        let currency = &brand.currency_symbol;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "ADDITIONAL DATASET SUMMARY – {} CUSTOMER PORTFOLIO:",
            brand.organization.to_uppercase()
        );
        out.push('\n');

        out.push_str("CUSTOMER OVERVIEW:\n");
        let _ = writeln!(out, "- Total Customers: {}", self.total_customers);
        let _ = writeln!(out, "- Active Customers: {}", self.active_customers);
        let _ = writeln!(out, "- Inactive Customers: {}", self.inactive_customers);
        let _ = writeln!(out, "- Average Age: {:.1} years", self.average_age);
        out.push_str("- Gender Distribution:\n");
        write_counts(&mut out, &self.gender_distribution);
        out.push_str("- Country Distribution:\n");
        write_counts(&mut out, &self.country_distribution);
        out.push('\n');

        out.push_str("ACCOUNT INFORMATION:\n");
        let _ = writeln!(
            out,
            "- Average Credit Score: {:.1}",
            self.average_credit_score
        );
        let _ = writeln!(
            out,
            "- Average Balance: {}",
            format_currency(self.average_balance, currency)
        );
        let _ = writeln!(out, "- Churn Rate: {:.2}%", self.churn_rate);
        out.push('\n');

        out.push_str("PRODUCT & ENGAGEMENT:\n");
        let _ = writeln!(out, "- Average Products Held: {:.2}", self.average_products);
        let _ = writeln!(out, "- Active Members (%): {:.2}%", self.active_member_rate);
        out.push('\n');

        out.push_str("CREDIT TIER DISTRIBUTION:\n");
        write_counts(&mut out, &self.credit_tiers);
        out.push('\n');

        out.push_str("CHURN BY SEGMENT:\n");
        for segment in self.churn_by_country.iter().chain(&self.churn_by_activity) {
            let _ = writeln!(out, "  {}: {:.2}%", segment.label, segment.churn_rate);
        }

        out
    }
}

/// Joins both record sets and renders the aggregate block.
///
/// Returns `EmptyDataset` when no identifier is shared, so callers never see
/// a zero-count summary.
pub fn summarize(
    customers: &[CustomerRecord],
    accounts: &[AccountRecord],
    brand: &BrandProfile,
) -> Result<String> {
    let merged = inner_join(customers, accounts);
    let summary = PortfolioSummary::from_records(&merged)?;
    Ok(summary.render(brand))
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Frequency table ordered by descending count, ties by label.
fn value_counts(values: impl Iterator<Item = String>) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

fn churn_by(records: &[MergedRecord], key: impl Fn(&MergedRecord) -> String) -> Vec<SegmentRate> {
    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(key(record)).or_insert((0, 0));
        entry.0 += 1;
        if record.account.exited {
            entry.1 += 1;
        }
    }

    let mut out: Vec<SegmentRate> = groups
        .into_iter()
        .map(|(label, (customers, churned))| SegmentRate {
            label,
            customers,
            churn_rate: percentage(churned, customers),
        })
        .collect();
    out.sort_by(|a, b| {
        b.churn_rate
            .total_cmp(&a.churn_rate)
            .then_with(|| a.label.cmp(&b.label))
    });
    out
}

fn write_counts(out: &mut String, counts: &[CategoryCount]) {
    for entry in counts {
        let _ = writeln!(out, "  {}: {}", entry.label, entry.count);
    }
}

/// Formats a currency amount with thousands separators and two decimals,
/// e.g. `£27,150.00` or `-£1,234.50`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

/// Inserts `,` every three digits from the right.
pub fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
