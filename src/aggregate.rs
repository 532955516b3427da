// Category aggregation for chart data

use crate::model::{Category, ExpenseRecord};
use std::collections::HashMap;

/// Sum amounts per category. Categories with no records are absent from the
/// result, not zero-filled.
pub fn by_category(records: &[ExpenseRecord]) -> HashMap<Category, f64> {
    let mut totals = HashMap::new();

    for record in records {
        *totals.entry(record.category).or_insert(0.0) += record.amount;
    }

    totals
}

/// Chart-ready (category, total) pairs, largest total first. Equal totals
/// fall back to category order so the output is deterministic.
pub fn category_pairs(totals: &HashMap<Category, f64>) -> Vec<(Category, f64)> {
    let mut pairs: Vec<(Category, f64)> = totals.iter().map(|(c, t)| (*c, *t)).collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    pairs
}

/// Overall spend across all records.
pub fn total(records: &[ExpenseRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_iso_date;

    fn record(amount: f64, category: Category) -> ExpenseRecord {
        ExpenseRecord::new(
            parse_iso_date("2024-01-15").unwrap(),
            amount,
            category,
            "",
        )
        .unwrap()
    }

    #[test]
    fn test_by_category_sums_per_category() {
        let records = vec![
            record(10.0, Category::Food),
            record(5.0, Category::Food),
            record(20.0, Category::Transport),
        ];

        let totals = by_category(&records);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&Category::Food], 15.0);
        assert_eq!(totals[&Category::Transport], 20.0);
    }

    #[test]
    fn test_by_category_empty_input_yields_empty_map() {
        assert!(by_category(&[]).is_empty());
    }

    #[test]
    fn test_by_category_omits_absent_categories() {
        let totals = by_category(&[record(3.0, Category::Bills)]);
        assert!(!totals.contains_key(&Category::Food));
    }

    #[test]
    fn test_category_pairs_sorted_by_total_descending() {
        let records = vec![
            record(5.0, Category::Food),
            record(20.0, Category::Transport),
            record(10.0, Category::Bills),
        ];

        let pairs = category_pairs(&by_category(&records));

        assert_eq!(
            pairs,
            vec![
                (Category::Transport, 20.0),
                (Category::Bills, 10.0),
                (Category::Food, 5.0),
            ]
        );
    }

    #[test]
    fn test_total_sums_all_records() {
        let records = vec![
            record(10.0, Category::Food),
            record(2.5, Category::Other),
        ];
        assert!((total(&records) - 12.5).abs() < 1e-9);
        assert_eq!(total(&[]), 0.0);
    }
}
