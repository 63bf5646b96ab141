//! Financial report generation.
//!
//! - Trial balance over the account hierarchy
//! - Balance verification of reports and stored entries

pub mod error;
pub mod trial_balance;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use trial_balance::{DEFAULT_BALANCE_TOLERANCE, TrialBalanceAggregator};
pub use types::{HierarchicalBalance, TrialBalance, TrialBalanceQuery, TrialBalanceTotals};
pub use verifier::{BalanceCheck, BalanceVerifier};
