//! Utility modules

pub mod memory_storage;
pub mod money;
pub mod validation;

pub use memory_storage::*;
pub use money::*;
pub use validation::*;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the default `pizza_blu_cash=info` directive.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("pizza_blu_cash=info"));

        // Another subscriber may already be installed by the host application
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
