//! Period roll-up of daily ledgers for the dashboard

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::aggregator::checked;
use crate::ledger::LedgerAggregator;
use crate::types::*;

/// One day of the dashboard trend line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTrend {
    pub date: NaiveDate,
    pub point: TrendPoint,
}

/// What is known about a day in the requested range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendPoint {
    /// No ledger was recorded for the day. Distinct from a day that closed at zero.
    NoData,
    Recorded {
        status: LedgerStatus,
        inflow: i64,
        outflow: i64,
        net: i64,
        closing_balance_expected: i64,
        closing_balance_counted: Option<i64>,
        discrepancy: Option<i64>,
    },
}

impl TrendPoint {
    pub fn is_no_data(&self) -> bool {
        matches!(self, TrendPoint::NoData)
    }
}

/// A discrepant day awaiting manual review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDiscrepancy {
    pub date: NaiveDate,
    pub discrepancy: i64,
}

/// Read-only roll-up of the ledgers in a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Sales and deposits per category
    pub inflow_by_category: BTreeMap<Category, i64>,
    /// Withdrawals and expenses per category, as magnitudes
    pub outflow_by_category: BTreeMap<Category, i64>,
    pub total_inflow: i64,
    pub total_outflow: i64,
    pub net: i64,
    pub recorded_days: usize,
    pub missing_days: Vec<NaiveDate>,
    /// Ledgers still open or waiting for the count
    pub pending_days: usize,
    pub discrepant_days: usize,
    /// Σ |discrepancy| over discrepant days
    pub discrepancy_magnitude: i64,
    pub discrepancies: Vec<DayDiscrepancy>,
    /// Mean net movement over recorded days only
    pub average_daily_net: Option<BigDecimal>,
    /// Mean inflow over recorded days only
    pub average_daily_inflow: Option<BigDecimal>,
    /// One point per calendar day in the range, ordered by date
    pub trend: Vec<DayTrend>,
}

/// Builds period summaries without touching the ledgers it reads
pub struct DashboardSummarizer {
    aggregator: LedgerAggregator,
}

impl DashboardSummarizer {
    pub fn new(aggregator: LedgerAggregator) -> Self {
        Self { aggregator }
    }

    /// Summarize the ledgers of an inclusive date range.
    ///
    /// Dates may be sparse; days without a ledger show up as
    /// [`TrendPoint::NoData`] and are left out of the averages. Ledgers
    /// outside the range are ignored.
    pub fn summarize<'a, I>(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        ledgers: I,
    ) -> LedgerResult<PeriodSummary>
    where
        I: IntoIterator<Item = &'a DailyLedger>,
    {
        if start_date > end_date {
            return Err(LedgerError::Validation(format!(
                "Summary range starts after it ends: {} > {}",
                start_date, end_date
            )));
        }

        let by_date: BTreeMap<NaiveDate, &DailyLedger> = ledgers
            .into_iter()
            .filter(|ledger| ledger.date >= start_date && ledger.date <= end_date)
            .map(|ledger| (ledger.date, ledger))
            .collect();

        let mut summary = PeriodSummary {
            start_date,
            end_date,
            inflow_by_category: BTreeMap::new(),
            outflow_by_category: BTreeMap::new(),
            total_inflow: 0,
            total_outflow: 0,
            net: 0,
            recorded_days: 0,
            missing_days: Vec::new(),
            pending_days: 0,
            discrepant_days: 0,
            discrepancy_magnitude: 0,
            discrepancies: Vec::new(),
            average_daily_net: None,
            average_daily_inflow: None,
            trend: Vec::new(),
        };

        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            let Some(ledger) = by_date.get(&date) else {
                summary.missing_days.push(date);
                summary.trend.push(DayTrend {
                    date,
                    point: TrendPoint::NoData,
                });
                continue;
            };

            let totals = self.aggregator.aggregate_ledger(ledger)?;

            for entry in &ledger.entries {
                let bucket = if entry.kind.is_inflow() {
                    &mut summary.inflow_by_category
                } else {
                    &mut summary.outflow_by_category
                };
                let category_total = bucket.entry(entry.category.clone()).or_insert(0);
                *category_total = checked(category_total.checked_add(entry.amount))?;
            }

            let inflow = totals.total_inflow;
            let outflow = totals.total_outflow;
            summary.total_inflow = checked(summary.total_inflow.checked_add(inflow))?;
            summary.total_outflow = checked(summary.total_outflow.checked_add(outflow))?;
            summary.recorded_days += 1;

            let discrepancy = ledger
                .closing_balance_counted
                .map(|counted| {
                    Reconciliation::new(
                        date,
                        totals.closing_balance_expected,
                        counted,
                        ledger.status,
                    )
                })
                .transpose()?
                .map(|result| result.discrepancy);

            match ledger.status {
                LedgerStatus::Open | LedgerStatus::PendingCount => summary.pending_days += 1,
                LedgerStatus::Discrepant => {
                    let discrepancy = discrepancy.unwrap_or(0);
                    summary.discrepant_days += 1;
                    let magnitude = checked(discrepancy.checked_abs())?;
                    summary.discrepancy_magnitude =
                        checked(summary.discrepancy_magnitude.checked_add(magnitude))?;
                    summary.discrepancies.push(DayDiscrepancy { date, discrepancy });
                }
                LedgerStatus::Reconciled => {}
            }

            summary.trend.push(DayTrend {
                date,
                point: TrendPoint::Recorded {
                    status: ledger.status,
                    inflow,
                    outflow,
                    net: totals.net,
                    closing_balance_expected: totals.closing_balance_expected,
                    closing_balance_counted: ledger.closing_balance_counted,
                    discrepancy,
                },
            });
        }

        summary.net = checked(summary.total_inflow.checked_sub(summary.total_outflow))?;
        summary.average_daily_net = average(summary.net, summary.recorded_days);
        summary.average_daily_inflow = average(summary.total_inflow, summary.recorded_days);

        tracing::debug!(
            %start_date,
            %end_date,
            recorded = summary.recorded_days,
            missing = summary.missing_days.len(),
            discrepant = summary.discrepant_days,
            "built period summary"
        );

        Ok(summary)
    }
}

impl Default for DashboardSummarizer {
    fn default() -> Self {
        Self::new(LedgerAggregator::default())
    }
}

fn average(total: i64, days: usize) -> Option<BigDecimal> {
    if days == 0 {
        return None;
    }
    Some((BigDecimal::from(total) / BigDecimal::from(days as u64)).round(2))
}
