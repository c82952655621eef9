// src/utils/precision.rs
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a price to the nearest multiple of `tick_size`.
/// Example: price=100.16, tick=0.1 -> 100.2
pub fn normalize_price(price: Decimal, tick_size: Decimal) -> Decimal {
    if tick_size.is_zero() {
        return price;
    }
    ((price / tick_size).round() * tick_size).normalize()
}

/// Two-decimal rendering for cash amounts on screen. Stored values keep
/// their full precision.
pub fn display_cash(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Quantities are shown without trailing zeros: 2.500 -> 2.5
pub fn display_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn price_snaps_to_tick() {
        assert_eq!(normalize_price(d("100.16"), d("0.1")), d("100.2"));
        assert_eq!(normalize_price(d("189.30000305"), d("0.0001")), d("189.3"));
        assert_eq!(normalize_price(d("42.5"), Decimal::ZERO), d("42.5"));
    }

    #[test]
    fn cash_has_two_places() {
        assert_eq!(display_cash(d("1000")), "1000.00");
        assert_eq!(display_cash(d("9.995")), "10.00");
    }

    #[test]
    fn quantity_drops_trailing_zeros() {
        assert_eq!(display_quantity(d("2.500")), "2.5");
        assert_eq!(display_quantity(d("3")), "3");
    }
}
