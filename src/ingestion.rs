use crate::error::{InsightsError, Result};
use crate::schema::{AccountRecord, CustomerRecord};
use log::debug;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::Path;

pub fn read_customers(path: &Path) -> Result<Vec<CustomerRecord>> {
    read_table(path)
}

pub fn read_accounts(path: &Path) -> Result<Vec<AccountRecord>> {
    read_table(path)
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = fs::File::open(path).map_err(|e| InsightsError::data_load(path, e))?;
    let rows = parse_table(file).map_err(|e| InsightsError::data_load(path, e))?;
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parses a header-first CSV table. Whitespace around cells is trimmed.
pub fn parse_table<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Reads a paragraph-structured document and flattens it to one paragraph per line.
pub fn load_narrative(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).map_err(|e| InsightsError::data_load(path, e))?;
    let text = flatten_paragraphs(&raw);
    debug!(
        "Loaded narrative from {} ({} paragraphs)",
        path.display(),
        text.lines().count()
    );
    Ok(text)
}

/// Paragraphs are separated by blank lines; wrapped lines inside one paragraph
/// are joined with a single space.
pub fn flatten_paragraphs(raw: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_customer_table() {
        let csv = "CustomerId,Surname,CreditScore,Country,Gender,Age,Tenure,EstimatedSalary,ActiveMember\n\
                   15634602,Hargrave,619,France,Female,42,2,101348.88,1\n\
                   15647311,Hill,608,Spain,Female,41,1,112542.58,0\n";
        let customers: Vec<CustomerRecord> = parse_table(csv.as_bytes()).unwrap();

        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].customer_id, 15634602);
        assert_eq!(customers[0].surname.as_deref(), Some("Hargrave"));
        assert!(customers[0].active_member);
        assert!(!customers[1].active_member);
        assert_eq!(customers[1].tenure, Some(1));
    }

    #[test]
    fn test_parse_account_table_without_optional_columns() {
        let csv = "CustomerId,Balance,Products,Exited\n1, 83807.86 ,1,0\n2,0,3,1\n";
        let accounts: Vec<AccountRecord> = parse_table(csv.as_bytes()).unwrap();

        assert_eq!(accounts.len(), 2);
        assert!((accounts[0].balance - 83807.86).abs() < 1e-9);
        assert_eq!(accounts[0].has_credit_card, None);
        assert!(accounts[1].exited);
    }

    #[test]
    fn test_malformed_flag_is_rejected() {
        let csv = "CustomerId,Balance,Products,Exited\n1,10.0,1,maybe\n";
        let result: Result<Vec<AccountRecord>> = parse_table(csv.as_bytes());
        assert!(matches!(result, Err(InsightsError::Csv(_))));
    }

    #[test]
    fn test_non_finite_balance_is_rejected() {
        for balance in ["NaN", "inf", "-inf"] {
            let csv = format!("CustomerId,Balance,Products,Exited\n1,{},1,0\n", balance);
            let result: Result<Vec<AccountRecord>> = parse_table(csv.as_bytes());
            assert!(matches!(result, Err(InsightsError::Csv(_))), "{}", balance);
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CustomerId,Balance,Products,Exited\n1,NaN,1,0\n").unwrap();
        match read_accounts(file.path()) {
            Err(InsightsError::DataLoad { details, .. }) => {
                assert!(details.contains("finite"))
            }
            other => panic!("expected data load error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_a_data_load_error() {
        let result = read_customers(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(InsightsError::DataLoad { .. })));
    }

    #[test]
    fn test_flatten_paragraphs() {
        let raw = "Veritas Bank overview.\nSecond line of intro.\n\n\n  Churn drivers:  \nAge and balance.\n";
        assert_eq!(
            flatten_paragraphs(raw),
            "Veritas Bank overview. Second line of intro.\nChurn drivers: Age and balance."
        );
    }

    #[test]
    fn test_load_narrative_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "First paragraph.\n\nSecond paragraph.").unwrap();

        let text = load_narrative(file.path()).unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }
}
