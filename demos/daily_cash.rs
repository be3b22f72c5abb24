//! A day at the register: record entries, close, count and summarize

use chrono::NaiveDate;
use pizza_blu_cash::utils::{init_tracing, to_major_units, MemoryStorage};
use pizza_blu_cash::{patterns, CashBook, CashConfig, EntryBuilder, EntryKind, TrendPoint};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("🍕 Pizza Blu - Daily Cash Example\n");

    let config = CashConfig {
        tolerance: 100,
        ..CashConfig::default()
    };
    let mut book = CashBook::with_config(MemoryStorage::new(), config)?;

    let friday = NaiveDate::from_ymd_opt(2024, 3, 15).ok_or("invalid date")?;
    let sunday = NaiveDate::from_ymd_opt(2024, 3, 17).ok_or("invalid date")?;
    let at = |date: NaiveDate, hour: u32| date.and_hms_opt(hour, 0, 0).ok_or("invalid time");

    // 1. Friday: a normal service
    println!("💰 Recording Friday entries...");
    book.open_ledger(friday, at(friday, 17)?).await?;
    book.record_entries(
        friday,
        vec![
            patterns::deposit(at(friday, 17)?, 20_000, "change_fund", "ana"),
            patterns::sale(at(friday, 19)?, 18_500, "counter_sales", "ana"),
            EntryBuilder::new(EntryKind::Sale, 12_300, "delivery_sales", at(friday, 20)?)
                .note("iFood")
                .created_by("ana")
                .build(&book.config().categories)?,
            patterns::expense(at(friday, 21)?, 4_000, "couriers", "ana"),
            patterns::withdrawal(at(friday, 22)?, 25_000, "cash_drop", "ana"),
        ],
    )
    .await?;

    let totals = book.ledger_totals(friday).await?;
    for point in &totals.running_balance {
        println!("  ✓ {} → R$ {}", point.entry_id, to_major_units(point.balance_after));
    }
    println!(
        "  Expected in drawer: R$ {}\n",
        to_major_units(totals.closing_balance_expected)
    );

    // 2. Close and count
    println!("🧮 Counting the drawer...");
    book.close_for_counting(friday, at(friday, 23)?).await?;
    let ledger = book.save_reconciliation(friday, 21_750, at(friday, 23)?).await?;
    if let Some(result) = ledger.reconciliation()? {
        println!(
            "  Counted R$ {} vs expected R$ {} → {} (difference R$ {})\n",
            to_major_units(result.counted),
            to_major_units(result.expected),
            result.status,
            to_major_units(result.discrepancy)
        );
    }

    // 3. Sunday: Saturday was never recorded
    book.record_entry(sunday, patterns::sale(at(sunday, 20)?, 9_900, "counter_sales", "rui"))
        .await?;
    book.close_for_counting(sunday, at(sunday, 23)?).await?;
    book.save_reconciliation(sunday, 30_000, at(sunday, 23)?).await?;

    // 4. Dashboard
    println!("📊 Weekend summary");
    let summary = book.summarize(friday, sunday).await?;
    for day in &summary.trend {
        match &day.point {
            TrendPoint::NoData => println!("  {}: no data", day.date),
            TrendPoint::Recorded { status, net, .. } => {
                println!("  {}: net R$ {} ({})", day.date, to_major_units(*net), status)
            }
        }
    }
    println!("  Inflow:  R$ {}", to_major_units(summary.total_inflow));
    println!("  Outflow: R$ {}", to_major_units(summary.total_outflow));
    println!(
        "  Discrepant days: {} (R$ {})",
        summary.discrepant_days,
        to_major_units(summary.discrepancy_magnitude)
    );
    if let Some(average) = &summary.average_daily_net {
        println!("  Average net per recorded day: {} centavos", average);
    }

    Ok(())
}
