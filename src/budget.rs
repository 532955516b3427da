// Needs/wants/savings budget split

use crate::model::ValidationError;
use serde::{Deserialize, Serialize};

/// Percentage split of a monthly income. The classic default is 50/30/20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSplit {
    pub needs_pct: u32,
    pub wants_pct: u32,
    pub savings_pct: u32,
}

/// Monetary breakdown of one income under a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetBreakdown {
    pub needs: f64,
    pub wants: f64,
    pub savings: f64,
}

impl Default for BudgetSplit {
    fn default() -> Self {
        BudgetSplit {
            needs_pct: 50,
            wants_pct: 30,
            savings_pct: 20,
        }
    }
}

impl BudgetSplit {
    /// Build a split; the three percentages must total exactly 100.
    pub fn new(needs_pct: u32, wants_pct: u32, savings_pct: u32) -> Result<Self, ValidationError> {
        let total = needs_pct + wants_pct + savings_pct;
        if total != 100 {
            return Err(ValidationError::SplitNotHundred(total));
        }
        Ok(BudgetSplit {
            needs_pct,
            wants_pct,
            savings_pct,
        })
    }

    /// Apply the split to a monthly income.
    pub fn allocate(&self, income: f64) -> Result<BudgetBreakdown, ValidationError> {
        if !income.is_finite() {
            return Err(ValidationError::NonNumericAmount(income.to_string()));
        }
        if income < 0.0 {
            return Err(ValidationError::NegativeAmount(income));
        }
        Ok(BudgetBreakdown {
            needs: income * self.needs_pct as f64 / 100.0,
            wants: income * self.wants_pct as f64 / 100.0,
            savings: income * self.savings_pct as f64 / 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_split_allocation() {
        let breakdown = BudgetSplit::default().allocate(5000.0).unwrap();

        assert_eq!(breakdown.needs, 2500.0);
        assert_eq!(breakdown.wants, 1500.0);
        assert_eq!(breakdown.savings, 1000.0);
    }

    #[test]
    fn test_split_must_total_hundred() {
        assert!(BudgetSplit::new(60, 20, 20).is_ok());
        assert_eq!(
            BudgetSplit::new(50, 30, 30),
            Err(ValidationError::SplitNotHundred(110))
        );
    }

    #[test]
    fn test_allocate_rejects_negative_income() {
        assert_eq!(
            BudgetSplit::default().allocate(-1.0),
            Err(ValidationError::NegativeAmount(-1.0))
        );
    }

    #[test]
    fn test_allocate_zero_income() {
        let breakdown = BudgetSplit::default().allocate(0.0).unwrap();
        assert_eq!(breakdown.needs, 0.0);
        assert_eq!(breakdown.wants, 0.0);
        assert_eq!(breakdown.savings, 0.0);
    }
}
