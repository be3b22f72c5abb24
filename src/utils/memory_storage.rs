//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

type LedgerMap = BTreeMap<NaiveDate, DailyLedger>;

/// In-memory storage implementation for testing and development.
///
/// Clones share the same underlying map, which makes it easy to simulate
/// several cashier sessions writing to the same day.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    ledgers: Arc<RwLock<LedgerMap>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            ledgers: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Number of stored ledgers
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerMap>> {
        self.ledgers
            .read()
            .map_err(|_| LedgerError::Storage("ledger store lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerMap>> {
        self.ledgers
            .write()
            .map_err(|_| LedgerError::Storage("ledger store lock poisoned".to_string()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CashLedgerStore for MemoryStorage {
    async fn get_ledger(&self, date: NaiveDate) -> LedgerResult<Option<DailyLedger>> {
        Ok(self.read()?.get(&date).cloned())
    }

    async fn save_ledger(&mut self, ledger: &DailyLedger) -> LedgerResult<DailyLedger> {
        let mut ledgers = self.write()?;

        let stored_version = ledgers.get(&ledger.date).map_or(0, |stored| stored.version);
        if stored_version != ledger.version {
            return Err(LedgerError::Conflict(format!(
                "Ledger for {} was modified concurrently (expected version {}, found {})",
                ledger.date, ledger.version, stored_version
            )));
        }

        let mut saved = ledger.clone();
        saved.version += 1;
        ledgers.insert(saved.date, saved.clone());
        Ok(saved)
    }

    async fn get_ledgers(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<Vec<DailyLedger>> {
        if start_date > end_date {
            return Ok(Vec::new());
        }
        Ok(self
            .read()?
            .range(start_date..=end_date)
            .map(|(_, ledger)| ledger.clone())
            .collect())
    }

    async fn latest_counted_before(&self, date: NaiveDate) -> LedgerResult<Option<DailyLedger>> {
        Ok(self
            .read()?
            .range(..date)
            .rev()
            .map(|(_, ledger)| ledger)
            .find(|ledger| ledger.closing_balance_counted.is_some())
            .cloned())
    }

    async fn get_ledgers_by_status(&self, status: LedgerStatus) -> LedgerResult<Vec<DailyLedger>> {
        Ok(self
            .read()?
            .values()
            .filter(|ledger| ledger.status == status)
            .cloned()
            .collect())
    }
}
