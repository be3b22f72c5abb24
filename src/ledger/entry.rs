//! Cash entry construction

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::config::CategoryTaxonomy;
use crate::types::*;
use crate::utils::validation::validate_positive_amount;

/// Builder for entries coming from a cashier form.
///
/// `build` resolves the raw category label against the taxonomy, so unknown
/// labels are rejected at the boundary instead of being stored.
#[derive(Debug)]
pub struct EntryBuilder {
    id: Uuid,
    timestamp: NaiveDateTime,
    kind: EntryKind,
    amount: i64,
    category: String,
    note: Option<String>,
    created_by: String,
}

impl EntryBuilder {
    /// Create a new entry builder
    pub fn new(
        kind: EntryKind,
        amount: i64,
        category: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            kind,
            amount,
            category: category.into(),
            note: None,
            created_by: String::new(),
        }
    }

    /// Use a caller-supplied identifier (e.g. one assigned by the client)
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Build the entry
    pub fn build(self, taxonomy: &CategoryTaxonomy) -> LedgerResult<CashEntry> {
        validate_positive_amount(self.amount)?;
        let category = taxonomy.resolve(&self.category)?;

        Ok(CashEntry {
            id: self.id,
            timestamp: self.timestamp,
            kind: self.kind,
            amount: self.amount,
            category,
            note: self.note,
            created_by: self.created_by,
        })
    }
}

/// Common entry shapes. These skip taxonomy resolution; the aggregator still
/// validates every entry before it counts.
pub mod patterns {
    use super::*;

    fn entry(
        kind: EntryKind,
        timestamp: NaiveDateTime,
        amount: i64,
        category: &str,
        created_by: &str,
    ) -> CashEntry {
        CashEntry::new(
            timestamp,
            kind,
            amount,
            Category::new(category),
            created_by.to_string(),
        )
    }

    /// Money received for an order
    pub fn sale(timestamp: NaiveDateTime, amount: i64, category: &str, created_by: &str) -> CashEntry {
        entry(EntryKind::Sale, timestamp, amount, category, created_by)
    }

    /// Expense paid out of the register
    pub fn expense(
        timestamp: NaiveDateTime,
        amount: i64,
        category: &str,
        created_by: &str,
    ) -> CashEntry {
        entry(EntryKind::Expense, timestamp, amount, category, created_by)
    }

    /// Cash taken out of the register
    pub fn withdrawal(
        timestamp: NaiveDateTime,
        amount: i64,
        category: &str,
        created_by: &str,
    ) -> CashEntry {
        entry(EntryKind::Withdrawal, timestamp, amount, category, created_by)
    }

    /// Cash put into the register
    pub fn deposit(
        timestamp: NaiveDateTime,
        amount: i64,
        category: &str,
        created_by: &str,
    ) -> CashEntry {
        entry(EntryKind::Deposit, timestamp, amount, category, created_by)
    }
}
