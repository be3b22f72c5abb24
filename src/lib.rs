//! # Pizza Blu Cash
//!
//! Daily cash ledger ("caixa diário") core for the Gestão Pizza Blu
//! dashboard: cash entry recording, running balances, end-of-day
//! reconciliation against the counted drawer and multi-day roll-ups.
//!
//! ## Features
//!
//! - **Ledger aggregation**: per-category and per-kind totals plus a running balance
//! - **Reconciliation**: `open → pending_count → reconciled | discrepant` state machine
//!   with a configurable tolerance
//! - **Dashboard summaries**: period totals, discrepant days and a gap-aware trend line
//! - **Storage abstraction**: backend-agnostic async store with optimistic versioning
//!
//! ## Quick Start
//!
//! ```rust
//! use pizza_blu_cash::{patterns, LedgerAggregator};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let at = date.and_hms_opt(19, 0, 0).unwrap();
//! let entries = vec![
//!     patterns::sale(at, 5000, "counter_sales", "ana"),
//!     patterns::expense(at, 1200, "ingredients", "ana"),
//!     patterns::withdrawal(at, 800, "cash_drop", "ana"),
//! ];
//!
//! let totals = LedgerAggregator::default().aggregate(date, 0, &entries).unwrap();
//! assert_eq!(totals.closing_balance_expected, 3000);
//! ```

pub mod config;
pub mod dashboard;
pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use dashboard::*;
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;

// Re-export entry patterns for convenience
pub use ledger::entry::patterns;
