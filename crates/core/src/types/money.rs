//! Price arithmetic on decimal amounts.
//!
//! Amounts are `rust_decimal::Decimal` in the shop currency, two decimal
//! places, never floating point.

use rust_decimal::Decimal;

/// Price of one order line.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Total due for an order: every line plus the shipping fee.
#[must_use]
pub fn order_total<I>(shipping_price: Decimal, lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| line_total(price, quantity))
        .fold(shipping_price, |acc, line| acc + line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::new(4999, 2), 3), Decimal::new(14997, 2));
    }

    #[test]
    fn test_order_total_adds_shipping() {
        let lines = [(Decimal::new(3999, 2), 2), (Decimal::new(1250, 2), 1)];
        // 79.98 + 12.50 + 14.99
        assert_eq!(
            order_total(Decimal::new(1499, 2), lines),
            Decimal::new(10747, 2)
        );
    }

    #[test]
    fn test_order_total_without_lines_is_shipping() {
        assert_eq!(order_total(Decimal::new(999, 2), []), Decimal::new(999, 2));
    }
}
