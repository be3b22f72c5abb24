//! Validation utilities

use crate::config::CategoryTaxonomy;
use crate::traits::*;
use crate::types::*;

pub const MAX_NOTE_LENGTH: usize = 500;
pub const MAX_CREATED_BY_LENGTH: usize = 100;

/// Validate that an amount is strictly positive
pub fn validate_positive_amount(amount: i64) -> LedgerResult<()> {
    if amount <= 0 {
        Err(LedgerError::InvalidEntry(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate the free-text note of an entry
pub fn validate_note(note: Option<&str>) -> LedgerResult<()> {
    match note {
        Some(note) if note.chars().count() > MAX_NOTE_LENGTH => Err(LedgerError::InvalidEntry(
            format!("Entry note cannot exceed {} characters", MAX_NOTE_LENGTH),
        )),
        _ => Ok(()),
    }
}

/// Validate the cashier recorded on an entry
pub fn validate_created_by(created_by: &str) -> LedgerResult<()> {
    if created_by.trim().is_empty() {
        return Err(LedgerError::InvalidEntry(
            "Entry author cannot be empty".to_string(),
        ));
    }

    if created_by.chars().count() > MAX_CREATED_BY_LENGTH {
        return Err(LedgerError::InvalidEntry(format!(
            "Entry author cannot exceed {} characters",
            MAX_CREATED_BY_LENGTH
        )));
    }

    Ok(())
}

/// Entry validator that also checks descriptive metadata
pub struct EnhancedEntryValidator;

impl EntryValidator for EnhancedEntryValidator {
    fn validate_entry(
        &self,
        entry: &CashEntry,
        business_day: &BusinessDay,
        taxonomy: &CategoryTaxonomy,
    ) -> LedgerResult<()> {
        DefaultEntryValidator.validate_entry(entry, business_day, taxonomy)?;
        validate_note(entry.note.as_deref())?;
        validate_created_by(&entry.created_by)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::patterns;
    use crate::ledger::LedgerAggregator;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn strict_aggregator() -> LedgerAggregator {
        LedgerAggregator::with_validator(
            CategoryTaxonomy::default(),
            NaiveTime::default(),
            Box::new(EnhancedEntryValidator),
        )
    }

    #[test]
    fn test_field_validators() {
        assert!(validate_positive_amount(1).is_ok());
        assert!(validate_positive_amount(0).is_err());
        assert!(validate_note(None).is_ok());
        assert!(validate_note(Some("x".repeat(MAX_NOTE_LENGTH).as_str())).is_ok());
        assert!(validate_note(Some("x".repeat(MAX_NOTE_LENGTH + 1).as_str())).is_err());
        assert!(validate_created_by("ana").is_ok());
        assert!(validate_created_by("  ").is_err());
    }

    #[test]
    fn test_enhanced_validator_in_aggregator() {
        let at = date().and_hms_opt(19, 0, 0).unwrap();
        let aggregator = strict_aggregator();

        let valid = vec![patterns::sale(at, 100, "counter_sales", "ana")];
        assert!(aggregator.aggregate(date(), 0, &valid).is_ok());

        let anonymous = vec![patterns::sale(at, 100, "counter_sales", "")];
        assert!(matches!(
            aggregator.aggregate(date(), 0, &anonymous),
            Err(LedgerError::InvalidEntry(_))
        ));

        // The default validator does not care about the author
        assert!(LedgerAggregator::default()
            .aggregate(date(), 0, &anonymous)
            .is_ok());
    }

    #[test]
    fn test_enhanced_validator_reports_default_rule_first() {
        let at = date().and_hms_opt(19, 0, 0).unwrap();
        let mut zero = patterns::sale(at, 100, "counter_sales", "ana");
        zero.amount = 0;

        let day = BusinessDay::new(date(), NaiveTime::default());
        let taxonomy = CategoryTaxonomy::default();
        let strict = EnhancedEntryValidator
            .validate_entry(&zero, &day, &taxonomy)
            .unwrap_err();
        let basic = DefaultEntryValidator
            .validate_entry(&zero, &day, &taxonomy)
            .unwrap_err();
        assert_eq!(strict.to_string(), basic.to_string());
    }
}
