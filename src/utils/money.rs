//! Minor-unit money helpers for presentation

use bigdecimal::BigDecimal;

/// Minor units (centavos) per major unit (real)
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert centavos to reais with two decimal places
pub fn to_major_units(minor: i64) -> BigDecimal {
    (BigDecimal::from(minor) / BigDecimal::from(MINOR_UNITS_PER_MAJOR)).with_scale(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_to_major_units() {
        assert_eq!(to_major_units(3000), BigDecimal::from(30));
        assert_eq!(to_major_units(-50), BigDecimal::from_str("-0.50").unwrap());
        assert_eq!(to_major_units(1234), BigDecimal::from_str("12.34").unwrap());
        assert_eq!(to_major_units(0), BigDecimal::from(0));
    }
}
