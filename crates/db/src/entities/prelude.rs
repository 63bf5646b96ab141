//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::fiscal_years::Entity as FiscalYears;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_entry_items::Entity as JournalEntryItems;
pub use super::monthly_periods::Entity as MonthlyPeriods;
pub use super::period_audit_log::Entity as PeriodAuditLog;
