//! Cost share assignments.

use serde::{Deserialize, Serialize};

/// A budget coordinate in the finance system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetKey {
    /// Work breakdown structure element.
    pub wbs: String,
    /// Grant.
    pub grant: String,
    /// Fund.
    pub fund: String,
}

impl BudgetKey {
    /// Creates a budget key.
    pub fn new(wbs: impl Into<String>, grant: impl Into<String>, fund: impl Into<String>) -> Self {
        Self {
            wbs: wbs.into(),
            grant: grant.into(),
            fund: fund.into(),
        }
    }
}

/// A percentage share of the trip cost charged to a budget coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostShare {
    /// Work breakdown structure element.
    pub wbs: String,
    /// Grant.
    pub grant: String,
    /// Fund.
    pub fund: String,
    /// Integer percentage, 0 to 100.
    pub share: u32,
}

impl CostShare {
    /// Returns the budget coordinate of this share.
    pub fn key(&self) -> BudgetKey {
        BudgetKey::new(self.wbs.as_str(), self.grant.as_str(), self.fund.as_str())
    }
}

/// Sums the shares of a set of cost assignments.
///
/// Summed wide so out-of-range shares show up in the total instead of
/// overflowing it.
pub fn total_share(cost_shares: &[CostShare]) -> u64 {
    cost_shares.iter().map(|cs| u64::from(cs.share)).sum()
}
