//! Turns the entries of one business day into totals and a running balance

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{CashConfig, CategoryTaxonomy};
use crate::traits::*;
use crate::types::*;

/// Balance of the register right after an entry was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub entry_id: Uuid,
    pub balance_after: i64,
}

/// Aggregated view of one day's entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub date: NaiveDate,
    pub opening_balance: i64,
    /// Signed sum per category
    pub totals_by_category: BTreeMap<Category, i64>,
    /// Unsigned sum per kind
    pub totals_by_kind: BTreeMap<EntryKind, i64>,
    /// One point per entry, in entry order
    pub running_balance: Vec<BalancePoint>,
    pub closing_balance_expected: i64,
    /// Sum of sales and deposits
    pub total_inflow: i64,
    /// Sum of withdrawals and expenses, as a magnitude
    pub total_outflow: i64,
    /// Net cash movement of the day
    pub net: i64,
}

impl LedgerTotals {
    pub fn kind_total(&self, kind: EntryKind) -> i64 {
        kind_total(&self.totals_by_kind, kind)
    }
}

/// Pure aggregation of cash entries.
///
/// Holds only configuration; the same entry sequence always produces the
/// same [`LedgerTotals`]. Clones share the entry validator.
#[derive(Clone)]
pub struct LedgerAggregator {
    taxonomy: CategoryTaxonomy,
    day_start: NaiveTime,
    validator: Arc<dyn EntryValidator>,
}

impl LedgerAggregator {
    /// Create an aggregator with the default entry validator
    pub fn new(taxonomy: CategoryTaxonomy, day_start: NaiveTime) -> Self {
        Self {
            taxonomy,
            day_start,
            validator: Arc::new(DefaultEntryValidator),
        }
    }

    /// Create an aggregator with a custom entry validator
    pub fn with_validator(
        taxonomy: CategoryTaxonomy,
        day_start: NaiveTime,
        validator: Box<dyn EntryValidator>,
    ) -> Self {
        Self {
            taxonomy,
            day_start,
            validator: Arc::from(validator),
        }
    }

    pub fn from_config(config: &CashConfig) -> Self {
        Self::new(config.categories.clone(), config.business_day_start)
    }

    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    /// Business-day window for a ledger date
    pub fn business_day(&self, date: NaiveDate) -> BusinessDay {
        BusinessDay::new(date, self.day_start)
    }

    /// Validate every entry without computing totals
    pub fn validate(&self, date: NaiveDate, entries: &[CashEntry]) -> LedgerResult<()> {
        let business_day = self.business_day(date);
        let mut seen = HashSet::with_capacity(entries.len());

        for entry in entries {
            self.validator
                .validate_entry(entry, &business_day, &self.taxonomy)?;

            if !seen.insert(entry.id) {
                return Err(LedgerError::InvalidEntry(format!(
                    "Duplicate entry id {}",
                    entry.id
                )));
            }
        }

        Ok(())
    }

    /// Aggregate the entries of one business day.
    ///
    /// Fails with [`LedgerError::InvalidEntry`] if any entry is invalid, in
    /// which case no totals are produced at all.
    pub fn aggregate(
        &self,
        date: NaiveDate,
        opening_balance: i64,
        entries: &[CashEntry],
    ) -> LedgerResult<LedgerTotals> {
        self.validate(date, entries)?;

        let mut totals_by_category: BTreeMap<Category, i64> = BTreeMap::new();
        let mut totals_by_kind: BTreeMap<EntryKind, i64> = BTreeMap::new();
        let mut running_balance = Vec::with_capacity(entries.len());
        let mut balance = opening_balance;

        for entry in entries {
            let signed = entry.signed_amount();
            balance = checked(balance.checked_add(signed))?;

            let category_total = totals_by_category
                .entry(entry.category.clone())
                .or_insert(0);
            *category_total = checked(category_total.checked_add(signed))?;

            let kind_total = totals_by_kind.entry(entry.kind).or_insert(0);
            *kind_total = checked(kind_total.checked_add(entry.amount))?;

            running_balance.push(BalancePoint {
                entry_id: entry.id,
                balance_after: balance,
            });
        }

        let total_inflow = checked(
            kind_total(&totals_by_kind, EntryKind::Sale)
                .checked_add(kind_total(&totals_by_kind, EntryKind::Deposit)),
        )?;
        let total_outflow = checked(
            kind_total(&totals_by_kind, EntryKind::Withdrawal)
                .checked_add(kind_total(&totals_by_kind, EntryKind::Expense)),
        )?;
        let net = checked(balance.checked_sub(opening_balance))?;

        tracing::trace!(
            %date,
            entries = entries.len(),
            closing = balance,
            "aggregated ledger"
        );

        Ok(LedgerTotals {
            date,
            opening_balance,
            totals_by_category,
            totals_by_kind,
            running_balance,
            closing_balance_expected: balance,
            total_inflow,
            total_outflow,
            net,
        })
    }

    /// Aggregate a stored ledger
    pub fn aggregate_ledger(&self, ledger: &DailyLedger) -> LedgerResult<LedgerTotals> {
        self.aggregate(ledger.date, ledger.opening_balance, &ledger.entries)
    }
}

impl Default for LedgerAggregator {
    fn default() -> Self {
        Self::from_config(&CashConfig::default())
    }
}

fn kind_total(totals: &BTreeMap<EntryKind, i64>, kind: EntryKind) -> i64 {
    totals.get(&kind).copied().unwrap_or(0)
}

pub(crate) fn checked(value: Option<i64>) -> LedgerResult<i64> {
    value.ok_or_else(|| LedgerError::InvalidEntry("Cash total overflows".to_string()))
}
