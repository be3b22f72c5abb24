//! Ledger module containing entry construction, aggregation and the cash book

pub mod aggregator;
pub mod core;
pub mod entry;

pub use aggregator::*;
pub use self::core::*;
pub use entry::*;
