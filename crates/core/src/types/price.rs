//! Checkout pricing using decimal arithmetic.
//!
//! Amounts are Malaysian ringgit with two decimal places. A fixed delivery
//! fee is added once per checkout, regardless of how many cars are bought.

use rust_decimal::{Decimal, RoundingStrategy};

/// Flat delivery surcharge added to every non-empty checkout (RM 200.00).
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(20_000, 0, 0, false, 2);

/// Total charged for a checkout: the sum of car prices plus [`DELIVERY_FEE`].
///
/// Returns `None` when there is nothing to buy, so callers cannot record a
/// purchase that consists of the delivery fee alone.
///
/// ```
/// use autoelite_core::checkout_total;
/// use rust_decimal::Decimal;
///
/// let total = checkout_total([Decimal::new(20_000, 0)]).unwrap();
/// assert_eq!(total.to_string(), "20200.00");
/// assert!(checkout_total(Vec::<Decimal>::new()).is_none());
/// ```
#[must_use]
pub fn checkout_total<I>(prices: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let mut prices = prices.into_iter().peekable();
    prices.peek()?;

    let subtotal: Decimal = prices.sum();
    Some(round_money(subtotal + DELIVERY_FEE))
}

/// Round half away from zero to cents and pin the scale to 2.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_fee_value() {
        assert_eq!(DELIVERY_FEE, Decimal::new(200, 0));
        assert_eq!(DELIVERY_FEE.to_string(), "200.00");
    }

    #[test]
    fn test_checkout_total_sums_prices_plus_fee_once() {
        let total = checkout_total([Decimal::new(4_599_950, 2), Decimal::new(3_000_000, 2)]);
        assert_eq!(total, Some(Decimal::new(7_619_950, 2)));
    }

    #[test]
    fn test_checkout_total_empty_is_none() {
        assert_eq!(checkout_total(std::iter::empty()), None);
    }

    #[test]
    fn test_round_money_pins_scale() {
        assert_eq!(round_money(Decimal::new(5, 0)).to_string(), "5.00");
        assert_eq!(round_money(Decimal::new(10_005, 3)).to_string(), "10.01");
    }
}
