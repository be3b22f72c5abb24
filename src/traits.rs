//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::CategoryTaxonomy;
use crate::types::*;

/// Storage abstraction for daily ledgers
///
/// The cash core never performs I/O itself; a backend (PostgreSQL, a REST
/// persistence client, in-memory, etc.) implements these methods. Backends
/// serialise concurrent writers per date through [`DailyLedger::version`].
#[async_trait]
pub trait CashLedgerStore: Send + Sync {
    /// Get the ledger for a date
    async fn get_ledger(&self, date: NaiveDate) -> LedgerResult<Option<DailyLedger>>;

    /// Persist a ledger.
    ///
    /// Succeeds only if `ledger.version` equals the stored version (0 when the
    /// date has no ledger yet) and returns the stored copy with the version
    /// bumped. A stale version fails with [`LedgerError::Conflict`].
    async fn save_ledger(&mut self, ledger: &DailyLedger) -> LedgerResult<DailyLedger>;

    /// List ledgers whose date falls within the inclusive range, ordered by date
    async fn get_ledgers(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<Vec<DailyLedger>>;

    /// Most recent ledger strictly before `date` that has a counted closing balance
    async fn latest_counted_before(&self, date: NaiveDate) -> LedgerResult<Option<DailyLedger>>;

    /// Ledgers still in the given status, ordered by date
    async fn get_ledgers_by_status(&self, status: LedgerStatus) -> LedgerResult<Vec<DailyLedger>>;
}

/// Trait for implementing custom cash entry validation rules
pub trait EntryValidator: Send + Sync {
    /// Validate one entry against the ledger's business day and the taxonomy
    fn validate_entry(
        &self,
        entry: &CashEntry,
        business_day: &BusinessDay,
        taxonomy: &CategoryTaxonomy,
    ) -> LedgerResult<()>;
}

/// Default entry validator enforcing the computational rules
pub struct DefaultEntryValidator;

impl EntryValidator for DefaultEntryValidator {
    fn validate_entry(
        &self,
        entry: &CashEntry,
        business_day: &BusinessDay,
        taxonomy: &CategoryTaxonomy,
    ) -> LedgerResult<()> {
        if entry.amount <= 0 {
            return Err(LedgerError::InvalidEntry(format!(
                "Entry {} has non-positive amount {}",
                entry.id, entry.amount
            )));
        }

        if !taxonomy.contains(&entry.category) {
            return Err(LedgerError::InvalidEntry(format!(
                "Entry {} has unknown category '{}'",
                entry.id, entry.category
            )));
        }

        if !business_day.contains(entry.timestamp) {
            return Err(LedgerError::InvalidEntry(format!(
                "Entry {} at {} is outside the business day {} ({} to {})",
                entry.id, entry.timestamp, business_day.date, business_day.start, business_day.end
            )));
        }

        Ok(())
    }
}
