//! Journal entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use fiscus_shared::types::{
    AccountId, JournalEntryId, JournalItemId, MonthlyPeriodId, OrganizationId, UserId,
};

/// Fractional digits the ledger stores for an amount.
pub const AMOUNT_SCALE: u32 = 6;

/// Exclusive upper bound of a stored amount (`10^18`, the integer part of
/// `NUMERIC(24, 6)`).
pub const AMOUNT_CEILING: Decimal = Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

/// Status of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Awaiting approval; excluded from reports.
    Pending,
    /// Approved; participates in reports.
    Approved,
    /// Cancelled; excluded from reports.
    Voided,
}

impl EntryStatus {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Voided => "voided",
        }
    }
}

/// One line of a journal entry to be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Account receiving the line.
    pub account_id: AccountId,
    /// Debit amount, zero when the line is a credit.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount, zero when the line is a debit.
    #[serde(default)]
    pub credit: Decimal,
    /// Optional line memo.
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for posting a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJournalEntry {
    /// Accounting date; selects the monthly period.
    pub entry_date: NaiveDate,
    /// Optional memo.
    #[serde(default)]
    pub description: Option<String>,
    /// Lines, at least two.
    pub lines: Vec<PostingLine>,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
    /// Whether debits equal credits exactly.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Sums debit and credit amounts independently.
    ///
    /// Returns `None` if either sum overflows.
    #[must_use]
    pub fn from_amounts(amounts: impl IntoIterator<Item = (Decimal, Decimal)>) -> Option<Self> {
        let (total_debit, total_credit) = amounts.into_iter().try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(d, c), (debit, credit)| Some((d.checked_add(debit)?, c.checked_add(credit)?)),
        )?;
        Some(Self {
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        })
    }
}

/// A stored journal entry header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Monthly period containing `entry_date`.
    pub monthly_period_id: MonthlyPeriodId,
    /// Optional memo.
    pub description: Option<String>,
    /// Current status.
    pub status: EntryStatus,
    /// Whether the items balanced when stored.
    pub is_balanced: bool,
    /// Sum of item debits.
    pub total_debit: Decimal,
    /// Sum of item credits.
    pub total_credit: Decimal,
    /// Posting user.
    pub created_by: UserId,
    /// Posting time.
    pub created_at: DateTime<Utc>,
    /// Voiding user.
    pub voided_by: Option<UserId>,
    /// Voiding time.
    pub voided_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Returns true if the entry is approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == EntryStatus::Approved
    }

    /// Returns true if the entry's items count in reports.
    #[must_use]
    pub fn participates(&self) -> bool {
        self.is_approved() && self.is_balanced
    }
}

/// A stored journal entry line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalItem {
    /// Unique identifier.
    pub id: JournalItemId,
    /// Parent entry.
    pub entry_id: JournalEntryId,
    /// Account receiving the line.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

/// A journal item joined with its entry's date and participation flag,
/// the input row of the trial balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerItem {
    /// Parent entry.
    pub entry_id: JournalEntryId,
    /// Account receiving the line.
    pub account_id: AccountId,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Approved, balanced and not voided.
    pub participates: bool,
}

impl LedgerItem {
    /// Joins an item with its entry.
    #[must_use]
    pub fn from_parts(entry: &JournalEntry, item: &JournalItem) -> Self {
        Self {
            entry_id: entry.id,
            account_id: item.account_id,
            entry_date: entry.entry_date,
            debit: item.debit,
            credit: item.credit,
            participates: entry.participates(),
        }
    }
}

/// A validated entry ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEntry {
    /// Header, approved and balanced.
    pub entry: JournalEntry,
    /// Lines.
    pub items: Vec<JournalItem>,
}
