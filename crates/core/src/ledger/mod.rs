//! Double-entry journal: entry types and the posting guard.

pub mod error;
pub mod posting;
pub mod types;

#[cfg(test)]
mod posting_props;

pub use error::LedgerError;
pub use posting::{PostingGuard, check_posting_account, check_posting_period, validate_lines};
pub use types::{
    AMOUNT_CEILING, AMOUNT_SCALE, EntryStatus, EntryTotals, JournalEntry, JournalItem, LedgerItem, NewJournalEntry,
    PostingLine, PreparedEntry,
};
