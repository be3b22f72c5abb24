//! Cash book orchestrator that coordinates storage, aggregation,
//! reconciliation and summaries

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::config::CashConfig;
use crate::dashboard::{DashboardSummarizer, PeriodSummary};
use crate::ledger::{LedgerAggregator, LedgerTotals};
use crate::reconciliation::ReconciliationEngine;
use crate::traits::*;
use crate::types::*;

/// Daily cash book on top of a storage backend.
///
/// Every operation takes the ledger date explicitly; there is no notion of
/// a "current" ledger.
pub struct CashBook<S: CashLedgerStore> {
    storage: S,
    config: CashConfig,
    aggregator: LedgerAggregator,
    engine: ReconciliationEngine,
    summarizer: DashboardSummarizer,
}

impl<S: CashLedgerStore> CashBook<S> {
    /// Create a cash book with the default configuration
    pub fn new(storage: S) -> Self {
        let config = CashConfig::default();
        let aggregator = LedgerAggregator::from_config(&config);
        Self {
            storage,
            engine: ReconciliationEngine::from_config(&config),
            summarizer: DashboardSummarizer::new(aggregator.clone()),
            aggregator,
            config,
        }
    }

    /// Create a cash book with a validated configuration
    pub fn with_config(storage: S, config: CashConfig) -> LedgerResult<Self> {
        config.validate()?;
        let aggregator = LedgerAggregator::from_config(&config);
        Ok(Self {
            storage,
            engine: ReconciliationEngine::from_config(&config),
            summarizer: DashboardSummarizer::new(aggregator.clone()),
            aggregator,
            config,
        })
    }

    /// Replace the aggregator, e.g. to install a stricter entry validator.
    ///
    /// Summaries use the same aggregator as recording and reconciliation.
    pub fn with_aggregator(mut self, aggregator: LedgerAggregator) -> Self {
        self.summarizer = DashboardSummarizer::new(aggregator.clone());
        self.aggregator = aggregator;
        self
    }

    pub fn config(&self) -> &CashConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &LedgerAggregator {
        &self.aggregator
    }

    // Ledger lifecycle
    /// Open the ledger for a date.
    ///
    /// The opening balance is the counted closing balance of the most recent
    /// earlier ledger that has one, or 0. It follows later counts of earlier
    /// days until this ledger is counted itself.
    pub async fn open_ledger(
        &mut self,
        date: NaiveDate,
        opened_at: NaiveDateTime,
    ) -> LedgerResult<DailyLedger> {
        if self.storage.get_ledger(date).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Ledger for {} already exists",
                date
            )));
        }

        let ledger = self.new_ledger(date, opened_at).await?;
        let saved = self.storage.save_ledger(&ledger).await?;

        tracing::info!(%date, opening_balance = saved.opening_balance, "opened cash ledger");
        Ok(saved)
    }

    async fn new_ledger(
        &self,
        date: NaiveDate,
        opened_at: NaiveDateTime,
    ) -> LedgerResult<DailyLedger> {
        let opening_balance = self
            .storage
            .latest_counted_before(date)
            .await?
            .and_then(|previous| previous.closing_balance_counted)
            .unwrap_or(0);

        Ok(DailyLedger::new(date, opening_balance, opened_at))
    }

    /// Get the ledger for a date
    pub async fn fetch_ledger(&self, date: NaiveDate) -> LedgerResult<Option<DailyLedger>> {
        self.storage.get_ledger(date).await
    }

    /// Get the ledger for a date, returning an error if not found
    pub async fn fetch_ledger_required(&self, date: NaiveDate) -> LedgerResult<DailyLedger> {
        self.storage
            .get_ledger(date)
            .await?
            .ok_or(LedgerError::LedgerNotFound(date))
    }

    /// Entries of a date in insertion order; empty when nothing was recorded
    pub async fn fetch_entries(&self, date: NaiveDate) -> LedgerResult<Vec<CashEntry>> {
        Ok(self
            .storage
            .get_ledger(date)
            .await?
            .map(|ledger| ledger.entries)
            .unwrap_or_default())
    }

    // Entry operations
    /// Record a single entry
    pub async fn record_entry(
        &mut self,
        date: NaiveDate,
        entry: CashEntry,
    ) -> LedgerResult<DailyLedger> {
        self.record_entries(date, vec![entry]).await
    }

    /// Record a batch of entries atomically.
    ///
    /// Opens the ledger if the date has none, stamped with the earliest entry
    /// timestamp. If any entry is invalid, or the ledger no longer accepts
    /// entries, nothing is written.
    pub async fn record_entries(
        &mut self,
        date: NaiveDate,
        entries: Vec<CashEntry>,
    ) -> LedgerResult<DailyLedger> {
        let mut ledger = match self.storage.get_ledger(date).await? {
            Some(ledger) => ledger,
            None => {
                tracing::debug!(%date, "opening cash ledger with first entries");
                let opened_at = entries
                    .iter()
                    .map(|entry| entry.timestamp)
                    .min()
                    .unwrap_or(self.aggregator.business_day(date).start);
                self.new_ledger(date, opened_at).await?
            }
        };

        ledger.ensure_accepts_entries()?;

        let count = entries.len();
        for entry in entries {
            ledger.add_entry(entry)?;
        }

        // Validate the whole resulting day before writing anything
        let totals = self.aggregator.aggregate_ledger(&ledger)?;

        let saved = self.storage.save_ledger(&ledger).await?;
        tracing::info!(
            %date,
            recorded = count,
            expected = totals.closing_balance_expected,
            "recorded cash entries"
        );
        Ok(saved)
    }

    /// Totals and running balance for a recorded date
    pub async fn ledger_totals(&self, date: NaiveDate) -> LedgerResult<LedgerTotals> {
        let ledger = self.fetch_ledger_required(date).await?;
        self.aggregator.aggregate_ledger(&ledger)
    }

    // Reconciliation
    /// Close a ledger for counting; no further entries are accepted
    pub async fn close_for_counting(
        &mut self,
        date: NaiveDate,
        closed_at: NaiveDateTime,
    ) -> LedgerResult<DailyLedger> {
        let mut ledger = self.fetch_ledger_required(date).await?;
        self.engine.close_for_counting(&mut ledger, closed_at)?;

        let saved = self.storage.save_ledger(&ledger).await?;
        tracing::info!(%date, "closed cash ledger for counting");
        Ok(saved)
    }

    /// Close every open ledger whose business day has ended at `now`.
    ///
    /// Returns the dates that were closed.
    pub async fn close_elapsed(&mut self, now: NaiveDateTime) -> LedgerResult<Vec<NaiveDate>> {
        let mut closed = Vec::new();

        for mut ledger in self.storage.get_ledgers_by_status(LedgerStatus::Open).await? {
            let business_day = self.aggregator.business_day(ledger.date);
            if self.engine.close_if_elapsed(&mut ledger, &business_day, now)? {
                self.storage.save_ledger(&ledger).await?;
                closed.push(ledger.date);
            }
        }

        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "closed elapsed cash ledgers");
        }
        Ok(closed)
    }

    /// Submit the counted cash for a date and store the outcome.
    ///
    /// Later ledgers that are not counted yet take `counted` as their opening
    /// balance, up to the next counted ledger.
    pub async fn save_reconciliation(
        &mut self,
        date: NaiveDate,
        counted: i64,
        reconciled_at: NaiveDateTime,
    ) -> LedgerResult<DailyLedger> {
        let mut ledger = self.fetch_ledger_required(date).await?;
        let reconciliation =
            self.engine
                .reconcile(&mut ledger, counted, &self.aggregator, reconciled_at)?;
        let carried = self.carried_ledgers(date, counted).await?;

        let saved = self.storage.save_ledger(&ledger).await?;
        for later in &carried {
            self.storage.save_ledger(later).await?;
            tracing::debug!(
                date = %later.date,
                opening_balance = counted,
                "carried counted balance forward"
            );
        }

        match reconciliation.status {
            LedgerStatus::Discrepant => tracing::warn!(
                %date,
                expected = reconciliation.expected,
                counted,
                discrepancy = reconciliation.discrepancy,
                "cash count does not match"
            ),
            _ => tracing::info!(
                %date,
                expected = reconciliation.expected,
                counted,
                "cash ledger reconciled"
            ),
        }

        Ok(saved)
    }

    /// Later uncounted ledgers with their opening balance set to `counted`,
    /// each checked against the aggregator before anything is written
    async fn carried_ledgers(
        &self,
        date: NaiveDate,
        counted: i64,
    ) -> LedgerResult<Vec<DailyLedger>> {
        let Some(next) = date.succ_opt() else {
            return Ok(Vec::new());
        };

        let mut carried = Vec::new();
        for mut later in self.storage.get_ledgers(next, NaiveDate::MAX).await? {
            if later.closing_balance_counted.is_some() {
                break;
            }
            if later.opening_balance == counted {
                continue;
            }
            later.opening_balance = counted;
            self.aggregator.aggregate_ledger(&later)?;
            carried.push(later);
        }
        Ok(carried)
    }

    // Reporting
    /// One key per calendar day in the inclusive range, `None` where no
    /// ledger was recorded
    pub async fn fetch_ledger_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<BTreeMap<NaiveDate, Option<DailyLedger>>> {
        if start_date > end_date {
            return Err(LedgerError::Validation(format!(
                "Range starts after it ends: {} > {}",
                start_date, end_date
            )));
        }

        let mut range: BTreeMap<NaiveDate, Option<DailyLedger>> = start_date
            .iter_days()
            .take_while(|date| *date <= end_date)
            .map(|date| (date, None))
            .collect();

        for ledger in self.storage.get_ledgers(start_date, end_date).await? {
            range.insert(ledger.date, Some(ledger));
        }

        Ok(range)
    }

    /// Dashboard summary for an inclusive date range
    pub async fn summarize(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<PeriodSummary> {
        let range = self.fetch_ledger_range(start_date, end_date).await?;
        self.summarizer
            .summarize(start_date, end_date, range.values().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::patterns;
    use crate::utils::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn test_cash_book_basic_day() {
        let storage = MemoryStorage::new();
        let mut book = CashBook::new(storage);
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let at = |h| date.and_hms_opt(h, 0, 0).unwrap();

        book.record_entries(
            date,
            vec![
                patterns::sale(at(19), 5000, "counter_sales", "ana"),
                patterns::expense(at(20), 1200, "ingredients", "ana"),
                patterns::withdrawal(at(21), 800, "cash_drop", "ana"),
            ],
        )
        .await
        .unwrap();

        let totals = book.ledger_totals(date).await.unwrap();
        assert_eq!(totals.closing_balance_expected, 3000);

        book.close_for_counting(date, at(23)).await.unwrap();
        let ledger = book.save_reconciliation(date, 2950, at(23)).await.unwrap();

        assert_eq!(ledger.status, LedgerStatus::Discrepant);
        assert_eq!(ledger.discrepancy().unwrap(), Some(-50));
        assert_eq!(ledger.opened_at, at(19));
        assert_eq!(ledger.reconciled_at, Some(at(23)));
    }

    #[tokio::test]
    async fn test_late_count_updates_next_opening_balance() {
        let mut book = CashBook::new(MemoryStorage::new());
        let day1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let day2 = day1.succ_opt().unwrap();
        let day3 = day2.succ_opt().unwrap();
        let at = |date: NaiveDate, h| date.and_hms_opt(h, 0, 0).unwrap();

        book.record_entry(day1, patterns::sale(at(day1, 19), 5000, "counter_sales", "ana"))
            .await
            .unwrap();
        book.close_for_counting(day1, at(day1, 23)).await.unwrap();

        // Day 2 starts trading before day 1's drawer is counted
        let early = book
            .record_entry(day2, patterns::sale(at(day2, 12), 100, "counter_sales", "ana"))
            .await
            .unwrap();
        assert_eq!(early.opening_balance, 0);
        book.record_entry(day3, patterns::sale(at(day3, 12), 10, "counter_sales", "rui"))
            .await
            .unwrap();

        book.save_reconciliation(day1, 5000, at(day2, 9)).await.unwrap();

        let day2_ledger = book.fetch_ledger_required(day2).await.unwrap();
        assert_eq!(day2_ledger.opening_balance, 5000);
        assert_eq!(
            book.ledger_totals(day2).await.unwrap().closing_balance_expected,
            5100
        );
        assert_eq!(
            book.fetch_ledger_required(day3).await.unwrap().opening_balance,
            5000
        );

        // Once day 2 is counted, day 3 follows day 2 and day 2 stays as counted
        book.close_for_counting(day2, at(day2, 23)).await.unwrap();
        let counted = book.save_reconciliation(day2, 5100, at(day3, 9)).await.unwrap();
        assert_eq!(counted.status, LedgerStatus::Reconciled);
        assert_eq!(
            book.fetch_ledger_required(day3).await.unwrap().opening_balance,
            5100
        );
    }

    #[tokio::test]
    async fn test_custom_aggregator_drives_summaries() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let late_start = LedgerAggregator::new(
            crate::config::CategoryTaxonomy::default(),
            chrono::NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
        );
        let mut book = CashBook::new(MemoryStorage::new()).with_aggregator(late_start);

        // Only valid for a business day that runs past midnight
        let after_midnight = date.succ_opt().unwrap().and_hms_opt(0, 30, 0).unwrap();
        book.record_entry(
            date,
            patterns::sale(after_midnight, 4200, "delivery_sales", "rui"),
        )
        .await
        .unwrap();

        let summary = book.summarize(date, date).await.unwrap();
        assert_eq!(summary.total_inflow, 4200);
        assert_eq!(summary.recorded_days, 1);
    }
}
