//! End-of-day cash reconciliation
//!
//! Drives the ledger state machine:
//!
//! ```text
//! open ──close──▶ pending_count ──count──▶ reconciled | discrepant
//! ```
//!
//! Reconciled and discrepant are final. A discrepant day is a business
//! condition for manual review, not an error.

use chrono::NaiveDateTime;

use crate::config::CashConfig;
use crate::ledger::LedgerAggregator;
use crate::types::*;

/// Reconciliation state machine for daily ledgers
pub struct ReconciliationEngine {
    tolerance: i64,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ReconciliationEngine {
    /// Create an engine; negative tolerances are treated as zero
    pub fn new(tolerance: i64) -> Self {
        Self {
            tolerance: tolerance.max(0),
        }
    }

    pub fn from_config(config: &CashConfig) -> Self {
        Self::new(config.tolerance)
    }

    pub fn tolerance(&self) -> i64 {
        self.tolerance
    }

    /// Status a count would produce for the given expected balance
    pub fn classify(&self, expected: i64, counted: i64) -> LedgerStatus {
        let difference = counted.abs_diff(expected);
        if difference <= self.tolerance.unsigned_abs() {
            LedgerStatus::Reconciled
        } else {
            LedgerStatus::Discrepant
        }
    }

    /// `open → pending_count`. No entries are accepted afterwards.
    pub fn close_for_counting(
        &self,
        ledger: &mut DailyLedger,
        closed_at: NaiveDateTime,
    ) -> LedgerResult<()> {
        match ledger.status {
            LedgerStatus::Open => {
                ledger.status = LedgerStatus::PendingCount;
                ledger.closed_at = Some(closed_at);
                Ok(())
            }
            LedgerStatus::PendingCount => Err(LedgerError::InvalidTransition(format!(
                "Ledger for {} is already waiting for the cash count",
                ledger.date
            ))),
            status => Err(LedgerError::LedgerClosed {
                date: ledger.date,
                status,
            }),
        }
    }

    /// Close the ledger if its business day is over at `now`.
    ///
    /// Returns whether the ledger was closed.
    pub fn close_if_elapsed(
        &self,
        ledger: &mut DailyLedger,
        business_day: &BusinessDay,
        now: NaiveDateTime,
    ) -> LedgerResult<bool> {
        if ledger.status != LedgerStatus::Open || !business_day.has_ended(now) {
            return Ok(false);
        }
        self.close_for_counting(ledger, business_day.end)?;
        Ok(true)
    }

    /// `pending_count → reconciled | discrepant`.
    ///
    /// The expected balance comes from the aggregator, so a ledger holding
    /// invalid entries cannot be reconciled.
    pub fn reconcile(
        &self,
        ledger: &mut DailyLedger,
        counted: i64,
        aggregator: &LedgerAggregator,
        reconciled_at: NaiveDateTime,
    ) -> LedgerResult<Reconciliation> {
        match ledger.status {
            LedgerStatus::PendingCount => {}
            LedgerStatus::Open => {
                return Err(LedgerError::InvalidTransition(format!(
                    "Ledger for {} must be closed for counting before reconciliation",
                    ledger.date
                )))
            }
            status => {
                return Err(LedgerError::LedgerClosed {
                    date: ledger.date,
                    status,
                })
            }
        }

        if counted < 0 {
            return Err(LedgerError::Validation(
                "Counted cash cannot be negative".to_string(),
            ));
        }

        let expected = aggregator.aggregate_ledger(ledger)?.closing_balance_expected;
        let status = self.classify(expected, counted);
        let result = Reconciliation::new(ledger.date, expected, counted, status)?;

        ledger.closing_balance_counted = Some(counted);
        ledger.status = status;
        ledger.reconciled_at = Some(reconciled_at);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::patterns;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn now() -> NaiveDateTime {
        date().and_hms_opt(23, 30, 0).unwrap()
    }

    fn pending_ledger() -> DailyLedger {
        let at = |h| date().and_hms_opt(h, 0, 0).unwrap();
        let mut ledger = DailyLedger::new(date(), 0, date().and_hms_opt(9, 0, 0).unwrap());
        ledger
            .add_entry(patterns::sale(at(19), 5000, "counter_sales", "ana"))
            .unwrap();
        ledger
            .add_entry(patterns::expense(at(20), 1200, "ingredients", "ana"))
            .unwrap();
        ledger
            .add_entry(patterns::withdrawal(at(21), 800, "cash_drop", "ana"))
            .unwrap();
        ReconciliationEngine::default()
            .close_for_counting(&mut ledger, now())
            .unwrap();
        ledger
    }

    #[test]
    fn test_exact_count_reconciles() {
        let engine = ReconciliationEngine::default();
        let mut ledger = pending_ledger();

        let result = engine
            .reconcile(&mut ledger, 3000, &LedgerAggregator::default(), now())
            .unwrap();

        assert_eq!(result.expected, 3000);
        assert_eq!(result.discrepancy, 0);
        assert_eq!(result.status, LedgerStatus::Reconciled);
        assert_eq!(ledger.status, LedgerStatus::Reconciled);
        assert_eq!(ledger.closing_balance_counted, Some(3000));
        assert_eq!(ledger.reconciliation().unwrap(), Some(result));
        assert_eq!(ledger.reconciled_at, Some(now()));
    }

    #[test]
    fn test_short_count_is_discrepant() {
        let engine = ReconciliationEngine::default();
        let mut ledger = pending_ledger();

        let result = engine
            .reconcile(&mut ledger, 2950, &LedgerAggregator::default(), now())
            .unwrap();

        assert_eq!(result.discrepancy, -50);
        assert_eq!(result.status, LedgerStatus::Discrepant);
        assert!(result.is_short());
    }

    #[test]
    fn test_tolerance_boundary() {
        let engine = ReconciliationEngine::new(50);
        assert_eq!(engine.classify(3000, 2950), LedgerStatus::Reconciled);
        assert_eq!(engine.classify(3000, 3050), LedgerStatus::Reconciled);
        assert_eq!(engine.classify(3000, 3051), LedgerStatus::Discrepant);

        let mut ledger = pending_ledger();
        let result = engine
            .reconcile(&mut ledger, 3020, &LedgerAggregator::default(), now())
            .unwrap();
        assert_eq!(result.status, LedgerStatus::Reconciled);
        assert_eq!(result.discrepancy, 20);
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let engine = ReconciliationEngine::default();
        let aggregator = LedgerAggregator::default();
        let mut ledger = pending_ledger();
        engine.reconcile(&mut ledger, 2950, &aggregator, now()).unwrap();

        assert!(matches!(
            engine.reconcile(&mut ledger, 3000, &aggregator, now()),
            Err(LedgerError::LedgerClosed { .. })
        ));
        assert!(matches!(
            engine.close_for_counting(&mut ledger, now()),
            Err(LedgerError::LedgerClosed { .. })
        ));
        assert_eq!(ledger.closing_balance_counted, Some(2950));
        assert_eq!(ledger.status, LedgerStatus::Discrepant);
    }

    #[test]
    fn test_open_ledger_cannot_be_reconciled() {
        let engine = ReconciliationEngine::default();
        let mut ledger = DailyLedger::new(date(), 0, date().and_hms_opt(9, 0, 0).unwrap());
        assert!(matches!(
            engine.reconcile(&mut ledger, 0, &LedgerAggregator::default(), now()),
            Err(LedgerError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_pending_ledger_rejects_entries_and_second_close() {
        let engine = ReconciliationEngine::default();
        let mut ledger = pending_ledger();

        let late = patterns::sale(now(), 100, "counter_sales", "ana");
        assert!(matches!(
            ledger.add_entry(late),
            Err(LedgerError::LedgerClosed { .. })
        ));
        assert!(matches!(
            engine.close_for_counting(&mut ledger, now()),
            Err(LedgerError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_close_if_elapsed() {
        let engine = ReconciliationEngine::default();
        let aggregator = LedgerAggregator::default();
        let mut ledger = DailyLedger::new(date(), 0, date().and_hms_opt(9, 0, 0).unwrap());
        let day = aggregator.business_day(date());

        assert!(!engine.close_if_elapsed(&mut ledger, &day, now()).unwrap());
        assert_eq!(ledger.status, LedgerStatus::Open);

        let next_morning = date().succ_opt().unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert!(engine.close_if_elapsed(&mut ledger, &day, next_morning).unwrap());
        assert_eq!(ledger.status, LedgerStatus::PendingCount);
        assert_eq!(ledger.closed_at, Some(day.end));
    }

    #[test]
    fn test_negative_count_rejected() {
        let engine = ReconciliationEngine::default();
        let mut ledger = pending_ledger();
        assert!(matches!(
            engine.reconcile(&mut ledger, -1, &LedgerAggregator::default(), now()),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(ledger.status, LedgerStatus::PendingCount);
    }

    #[test]
    fn test_unrepresentable_discrepancy_leaves_ledger_pending() {
        let engine = ReconciliationEngine::default();
        let at = date().and_hms_opt(19, 0, 0).unwrap();
        let mut ledger = DailyLedger::new(date(), 0, at);
        ledger
            .add_entry(patterns::withdrawal(at, i64::MAX, "cash_drop", "ana"))
            .unwrap();
        engine.close_for_counting(&mut ledger, now()).unwrap();

        let aggregator = LedgerAggregator::default();
        assert_eq!(
            aggregator.aggregate_ledger(&ledger).unwrap().closing_balance_expected,
            -i64::MAX
        );
        assert!(matches!(
            engine.reconcile(&mut ledger, 10, &aggregator, now()),
            Err(LedgerError::InvalidEntry(_))
        ));
        assert_eq!(ledger.status, LedgerStatus::PendingCount);
        assert_eq!(ledger.closing_balance_counted, None);
        assert_eq!(ledger.reconciled_at, None);
    }
}
