//! Order totals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, halves away from zero, always carrying two places.
#[must_use]
pub fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// `quantity × unit_price`, in cents.
#[must_use]
pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    money(Decimal::from(quantity) * unit_price)
}

/// The four monetary figures stored on an order.
///
/// Always built through [`OrderTotals::calculate`], so
/// `total_amount == subtotal + tax_amount + shipping_amount` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
}

impl OrderTotals {
    #[must_use]
    pub fn calculate<I>(line_totals: I, tax_rate: Decimal, shipping: Decimal) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let subtotal = money(line_totals.into_iter().sum());
        let tax_amount = money(subtotal * tax_rate);
        let shipping_amount = money(shipping);

        Self {
            subtotal,
            tax_amount,
            shipping_amount,
            total_amount: subtotal + tax_amount + shipping_amount,
        }
    }
}
