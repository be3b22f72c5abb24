//! Cash ledger configuration: reconciliation tolerance, category taxonomy
//! and business-day boundaries

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::types::*;

/// Categories available out of the box for a pizzeria register
pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "counter_sales",
    "delivery_sales",
    "change_fund",
    "cash_drop",
    "ingredients",
    "beverages",
    "packaging",
    "couriers",
    "utilities",
    "other",
];

/// The configured set of allowed category labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTaxonomy {
    categories: BTreeSet<Category>,
}

impl CategoryTaxonomy {
    pub fn new<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        Self {
            categories: labels
                .into_iter()
                .map(|label| Category::new(label.as_ref().trim()))
                .collect(),
        }
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    /// Turn a raw label into a known category, rejecting unknown labels
    pub fn resolve(&self, label: &str) -> LedgerResult<Category> {
        let category = Category::new(label.trim());
        if self.contains(&category) {
            Ok(category)
        } else {
            Err(LedgerError::InvalidEntry(format!(
                "Unknown category '{}'",
                label
            )))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

/// Configuration shared by the aggregator, the reconciliation engine and
/// the cash book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashConfig {
    /// Largest |counted - expected| still treated as reconciled, in minor units
    pub tolerance: i64,
    /// Allowed category labels
    pub categories: CategoryTaxonomy,
    /// Wall-clock time at which a business day starts
    pub business_day_start: NaiveTime,
}

impl Default for CashConfig {
    fn default() -> Self {
        Self {
            tolerance: 0,
            categories: CategoryTaxonomy::default(),
            business_day_start: NaiveTime::default(),
        }
    }
}

impl CashConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(data: &str) -> LedgerResult<Self> {
        let config: CashConfig = serde_json::from_str(data)
            .map_err(|err| LedgerError::Config(format!("Invalid configuration: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no cash config file, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|err| {
            LedgerError::Config(format!("Cannot read {}: {}", path.display(), err))
        })?;
        Self::from_json_str(&data)
    }

    pub fn to_json_string(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| LedgerError::Config(format!("Cannot serialize configuration: {}", err)))
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.tolerance < 0 {
            return Err(LedgerError::Config(
                "Tolerance cannot be negative".to_string(),
            ));
        }

        if self.categories.is_empty() {
            return Err(LedgerError::Config(
                "Category taxonomy cannot be empty".to_string(),
            ));
        }

        if self.categories.iter().any(|c| c.as_str().is_empty()) {
            return Err(LedgerError::Config(
                "Category labels cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
