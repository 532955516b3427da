// Expense record model and input validation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date format used everywhere a date crosses a boundary (storage, CSV, CLI).
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Validation failures raised at the input boundary, before anything
/// reaches the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("amount must be non-negative, got {0}")]
    NegativeAmount(f64),

    #[error("amount is not a number: '{0}'")]
    NonNumericAmount(String),

    #[error("unknown category: '{0}'")]
    UnknownCategory(String),

    #[error("not a date: '{0}'")]
    UnparsableDate(String),

    #[error("budget split must total 100 percent, got {0}")]
    SplitNotHundred(u32),
}

/// Fixed set of spending categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Bills,
    Shopping,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Bills,
        Category::Shopping,
        Category::Other,
    ];

    /// Canonical display name, also the stored form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Shopping => "Shopping",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// Case-insensitive so imported files may say "food" or "FOOD".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .copied()
            .ok_or_else(|| ValidationError::UnknownCategory(s.trim().to_string()))
    }
}

/// One discretionary spending entry.
///
/// The full (date, amount, category, note) tuple is the natural key: no two
/// persisted records may share it. There is no surrogate identity in the
/// record itself; the store keeps a row id only to break ordering ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Category,
    pub note: String,
}

impl ExpenseRecord {
    /// Build a record, enforcing the non-negative amount constraint.
    pub fn new(
        date: NaiveDate,
        amount: f64,
        category: Category,
        note: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::NonNumericAmount(amount.to_string()));
        }
        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount(amount));
        }
        Ok(ExpenseRecord {
            date,
            amount,
            category,
            note: note.into(),
        })
    }

    /// ISO "YYYY-MM-DD" form of the date.
    pub fn date_string(&self) -> String {
        self.date.format(ISO_DATE).to_string()
    }

    /// Hash over the canonical tuple encoding. A UNIQUE index on this value
    /// is what enforces deduplication in the store.
    pub fn dedup_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}|{}|{}|{}",
                self.date_string(),
                self.amount,
                self.category.as_str(),
                self.note
            )
            .as_bytes(),
        );
        format!("{:x}", hasher.finalize())
    }
}

/// Parse a user-supplied date in the canonical ISO form.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE)
        .map_err(|_| ValidationError::UnparsableDate(value.trim().to_string()))
}

/// Parse an amount field from text, enforcing the numeric and
/// non-negative constraints.
pub fn parse_amount(value: &str) -> Result<f64, ValidationError> {
    let cleaned = value.trim().replace(',', "");
    let amount: f64 = cleaned
        .parse()
        .map_err(|_| ValidationError::NonNumericAmount(value.trim().to_string()))?;
    if !amount.is_finite() {
        return Err(ValidationError::NonNumericAmount(value.trim().to_string()));
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, amount: f64, category: Category, note: &str) -> ExpenseRecord {
        ExpenseRecord::new(parse_iso_date(date).unwrap(), amount, category, note).unwrap()
    }

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!("TRANSPORT".parse::<Category>().unwrap(), Category::Transport);
        assert_eq!(" Bills ".parse::<Category>().unwrap(), Category::Bills);
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        assert_eq!(
            "Groceries".parse::<Category>(),
            Err(ValidationError::UnknownCategory("Groceries".to_string()))
        );
    }

    #[test]
    fn test_new_rejects_negative_amount() {
        let date = parse_iso_date("2024-01-15").unwrap();
        assert_eq!(
            ExpenseRecord::new(date, -5.0, Category::Food, ""),
            Err(ValidationError::NegativeAmount(-5.0))
        );
    }

    #[test]
    fn test_new_rejects_non_finite_amount() {
        let date = parse_iso_date("2024-01-15").unwrap();
        assert!(ExpenseRecord::new(date, f64::NAN, Category::Food, "").is_err());
        assert!(ExpenseRecord::new(date, f64::INFINITY, Category::Food, "").is_err());
    }

    #[test]
    fn test_parse_iso_date_rejects_other_forms() {
        assert!(parse_iso_date("2024-01-15").is_ok());
        assert!(parse_iso_date("15/01/2024").is_err());
        assert!(parse_iso_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50").unwrap(), 12.50);
        assert_eq!(parse_amount("1,200.00").unwrap(), 1200.00);
        assert!(matches!(
            parse_amount("abc"),
            Err(ValidationError::NonNumericAmount(_))
        ));
        assert!(matches!(
            parse_amount("-3"),
            Err(ValidationError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_dedup_hash_is_stable() {
        let a = record("2024-01-15", 10.0, Category::Food, "lunch");
        let b = record("2024-01-15", 10.0, Category::Food, "lunch");
        assert_eq!(a.dedup_hash(), b.dedup_hash());
        assert_eq!(a.dedup_hash().len(), 64);
    }

    #[test]
    fn test_dedup_hash_varies_with_every_field() {
        let base = record("2024-01-15", 10.0, Category::Food, "lunch");
        let variants = [
            record("2024-01-16", 10.0, Category::Food, "lunch"),
            record("2024-01-15", 10.5, Category::Food, "lunch"),
            record("2024-01-15", 10.0, Category::Transport, "lunch"),
            record("2024-01-15", 10.0, Category::Food, "dinner"),
        ];
        for variant in variants {
            assert_ne!(base.dedup_hash(), variant.dedup_hash());
        }
    }

    #[test]
    fn test_date_string_round_trip() {
        let rec = record("2024-02-29", 1.0, Category::Other, "");
        assert_eq!(rec.date_string(), "2024-02-29");
        assert_eq!(parse_iso_date(&rec.date_string()).unwrap(), rec.date);
    }
}
