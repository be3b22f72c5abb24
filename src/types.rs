//! Core types and data structures for the daily cash ledger

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of cash movement. The kind decides the sign applied to an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Money received from a customer
    Sale,
    /// Cash taken out of the register (sangria)
    Withdrawal,
    /// Cash put into the register (suprimento, change fund)
    Deposit,
    /// Business expense paid from the register
    Expense,
}

impl EntryKind {
    /// All kinds, in a stable order
    pub const ALL: [EntryKind; 4] = [
        EntryKind::Sale,
        EntryKind::Withdrawal,
        EntryKind::Deposit,
        EntryKind::Expense,
    ];

    /// Whether this kind adds cash to the register
    pub fn is_inflow(&self) -> bool {
        matches!(self, EntryKind::Sale | EntryKind::Deposit)
    }

    /// Apply the sign of this kind to a magnitude
    pub fn signed(&self, amount: i64) -> i64 {
        if self.is_inflow() {
            amount
        } else {
            -amount
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Sale => "sale",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::Deposit => "deposit",
            EntryKind::Expense => "expense",
        };
        f.write_str(label)
    }
}

/// Category label taken from the configured taxonomy.
///
/// A `Category` carries no validity guarantee on its own: entries loaded from
/// storage are checked against the taxonomy by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// One recorded cash movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashEntry {
    /// Unique identifier for the entry
    pub id: Uuid,
    /// When the movement happened; must fall inside the ledger's business day
    pub timestamp: NaiveDateTime,
    /// Direction of the movement
    pub kind: EntryKind,
    /// Magnitude in minor currency units (centavos), strictly positive
    pub amount: i64,
    /// Grouping label from the category taxonomy
    pub category: Category,
    /// Free text, not used in computation
    pub note: Option<String>,
    /// Cashier or user who recorded the entry
    pub created_by: String,
}

impl CashEntry {
    /// Create a new entry with a fresh identifier
    pub fn new(
        timestamp: NaiveDateTime,
        kind: EntryKind,
        amount: i64,
        category: Category,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            kind,
            amount,
            category,
            note: None,
            created_by,
        }
    }

    /// Amount with the sign of the entry kind applied
    pub fn signed_amount(&self) -> i64 {
        self.kind.signed(self.amount)
    }
}

/// Reconciliation state of a daily ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Accepting entries
    Open,
    /// Day closed, waiting for the physical cash count
    PendingCount,
    /// Counted cash matched the expected balance within tolerance
    Reconciled,
    /// Counted cash differed from the expected balance beyond tolerance
    Discrepant,
}

impl LedgerStatus {
    /// Whether entries may still be appended
    pub fn accepts_entries(&self) -> bool {
        matches!(self, LedgerStatus::Open)
    }

    /// Reconciled and discrepant ledgers are final
    pub fn is_terminal(&self) -> bool {
        matches!(self, LedgerStatus::Reconciled | LedgerStatus::Discrepant)
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LedgerStatus::Open => "open",
            LedgerStatus::PendingCount => "pending count",
            LedgerStatus::Reconciled => "reconciled",
            LedgerStatus::Discrepant => "discrepant",
        };
        f.write_str(label)
    }
}

/// Time window covered by the ledger of one calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDay {
    pub date: NaiveDate,
    /// Inclusive start
    pub start: NaiveDateTime,
    /// Exclusive end
    pub end: NaiveDateTime,
}

impl BusinessDay {
    /// Business day keyed by `date` that starts at `day_start` and lasts 24 hours
    pub fn new(date: NaiveDate, day_start: NaiveTime) -> Self {
        let start = date.and_time(day_start);
        Self {
            date,
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Whether the business day is over at `now`
    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        now >= self.end
    }
}

/// The cash entries and reconciliation state for one business day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLedger {
    /// Calendar day key, unique per ledger
    pub date: NaiveDate,
    /// Entries in insertion order
    pub entries: Vec<CashEntry>,
    /// Counted closing balance of the previous day, 0 if none
    pub opening_balance: i64,
    /// Physically counted cash, set once at reconciliation
    pub closing_balance_counted: Option<i64>,
    pub status: LedgerStatus,
    /// Optimistic concurrency token, bumped by storage on every save
    pub version: u64,
    pub opened_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub reconciled_at: Option<NaiveDateTime>,
}

impl DailyLedger {
    /// Create an open, empty ledger
    pub fn new(date: NaiveDate, opening_balance: i64, opened_at: NaiveDateTime) -> Self {
        Self {
            date,
            entries: Vec::new(),
            opening_balance,
            closing_balance_counted: None,
            status: LedgerStatus::Open,
            version: 0,
            opened_at,
            closed_at: None,
            reconciled_at: None,
        }
    }

    /// Append an entry; only open ledgers accept entries
    pub fn add_entry(&mut self, entry: CashEntry) -> LedgerResult<()> {
        self.ensure_accepts_entries()?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn ensure_accepts_entries(&self) -> LedgerResult<()> {
        if self.status.accepts_entries() {
            Ok(())
        } else {
            Err(LedgerError::LedgerClosed {
                date: self.date,
                status: self.status,
            })
        }
    }

    /// `opening_balance + Σ signed(entries)`, always derived from the entries.
    ///
    /// This does not validate the entries; use
    /// [`LedgerAggregator`](crate::ledger::LedgerAggregator) for that.
    pub fn expected_closing_balance(&self) -> LedgerResult<i64> {
        self.entries
            .iter()
            .try_fold(self.opening_balance, |balance, entry| {
                balance.checked_add(entry.signed_amount())
            })
            .ok_or_else(|| {
                LedgerError::InvalidEntry(format!("Cash total overflows for {}", self.date))
            })
    }

    /// Signed difference between counted and expected cash, once counted
    pub fn discrepancy(&self) -> LedgerResult<Option<i64>> {
        Ok(self.reconciliation()?.map(|result| result.discrepancy))
    }

    /// Reconciliation result for a counted ledger
    pub fn reconciliation(&self) -> LedgerResult<Option<Reconciliation>> {
        let Some(counted) = self.closing_balance_counted else {
            return Ok(None);
        };
        Reconciliation::new(
            self.date,
            self.expected_closing_balance()?,
            counted,
            self.status,
        )
        .map(Some)
    }
}

/// Outcome of comparing expected cash with counted cash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub date: NaiveDate,
    pub expected: i64,
    pub counted: i64,
    /// `counted - expected`: positive means cash over, negative means short
    pub discrepancy: i64,
    pub status: LedgerStatus,
}

impl Reconciliation {
    /// Fails when `counted - expected` does not fit in an `i64`
    pub fn new(
        date: NaiveDate,
        expected: i64,
        counted: i64,
        status: LedgerStatus,
    ) -> LedgerResult<Self> {
        let discrepancy = counted.checked_sub(expected).ok_or_else(|| {
            LedgerError::InvalidEntry(format!(
                "Discrepancy overflows for {}: counted {} against expected {}",
                date, counted, expected
            ))
        })?;
        Ok(Self {
            date,
            expected,
            counted,
            discrepancy,
            status,
        })
    }

    pub fn is_over(&self) -> bool {
        self.discrepancy > 0
    }

    pub fn is_short(&self) -> bool {
        self.discrepancy < 0
    }
}

/// Errors that can occur in the cash ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
    #[error("Ledger for {date} is closed ({status})")]
    LedgerClosed { date: NaiveDate, status: LedgerStatus },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Ledger not found: {0}")]
    LedgerNotFound(NaiveDate),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
