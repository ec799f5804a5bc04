//! Checkout Models

use rust_decimal::Decimal;

use crate::{
    domain::{
        markets::models::MarketUuid, orders::models::ShippingAddress,
        products::models::ProductUuid, transactions::models::Currency,
    },
    validation::{
        FieldError, MAX_TEXT_CHARS, ValidationErrors, optional_text, positive_quantity,
        required_text,
    },
};

/// Longest notes a buyer may attach to a checkout.
pub const MAX_NOTES_CHARS: usize = 1000;

/// Raw shipping address as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingAddressInput {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Raw checkout request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutInput {
    pub shipping_address: ShippingAddressInput,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
}

/// Checkout request after validation; text is trimmed and blanks dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub shipping_address: ShippingAddress,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutInput {
    /// # Errors
    ///
    /// Returns every failing field, address fields prefixed with
    /// `shipping_address.`.
    pub fn validate(self) -> Result<ValidatedCheckout, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let address = &self.shipping_address;

        let shipping_address = ShippingAddress {
            street: errors.check(required_text(
                "shipping_address.street",
                &address.street,
                MAX_TEXT_CHARS,
            )),
            city: errors.check(required_text(
                "shipping_address.city",
                &address.city,
                MAX_TEXT_CHARS,
            )),
            postal_code: errors.check(required_text(
                "shipping_address.postal_code",
                &address.postal_code,
                MAX_TEXT_CHARS,
            )),
            country: errors.check(required_text(
                "shipping_address.country",
                &address.country,
                MAX_TEXT_CHARS,
            )),
        };

        let shipping_method = errors.check(optional_text(
            "shipping_method",
            self.shipping_method.as_deref(),
            MAX_TEXT_CHARS,
        ));
        let notes = errors.check(optional_text("notes", self.notes.as_deref(), MAX_NOTES_CHARS));

        errors.into_result()?;

        Ok(ValidatedCheckout {
            shipping_address,
            shipping_method,
            notes,
        })
    }
}

/// One requested line of a direct order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_uuid: ProductUuid,
    pub quantity: i64,
}

/// Raw request for a single-market order placed without going through the
/// cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderInput {
    pub market_uuid: MarketUuid,
    pub items: Vec<NewOrderLine>,
    pub delivery: CheckoutInput,
}

/// Direct order after validation. Repeated products are merged into one
/// line, first appearance first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub market_uuid: MarketUuid,
    pub lines: Vec<(ProductUuid, i32)>,
    pub delivery: ValidatedCheckout,
}

impl NewOrderInput {
    /// # Errors
    ///
    /// Returns every failing field. Line quantities are reported as
    /// `items.<index>.quantity`.
    pub fn validate(self) -> Result<ValidatedOrder, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.items.is_empty() {
            errors.push(FieldError::new("items", "must contain at least one item"));
        }

        let mut lines: Vec<(ProductUuid, i32)> = Vec::with_capacity(self.items.len());

        for (index, item) in self.items.iter().enumerate() {
            let quantity = match positive_quantity(&format!("items.{index}.quantity"), item.quantity)
            {
                Ok(quantity) => quantity,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };

            match lines
                .iter_mut()
                .find(|(product, _)| *product == item.product_uuid)
            {
                Some((_, merged)) => *merged = merged.saturating_add(quantity),
                None => lines.push((item.product_uuid, quantity)),
            }
        }

        let delivery = errors.absorb(self.delivery.validate());

        errors.into_result()?;

        Ok(ValidatedOrder {
            market_uuid: self.market_uuid,
            lines,
            delivery,
        })
    }
}

/// Pricing and booking rules applied to every checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPolicy {
    /// Fraction of the subtotal, e.g. `0.10`.
    pub tax_rate: Decimal,

    /// Added once per order.
    pub flat_shipping: Decimal,

    /// Currency of the purchase and sale ledger entries.
    pub currency: Currency,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            flat_shipping: Decimal::new(10_00, 2),
            currency: Currency::Sol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CheckoutInput {
        CheckoutInput {
            shipping_address: ShippingAddressInput {
                street: " 1 Market St ".to_string(),
                city: "Lisbon".to_string(),
                postal_code: "1000-001".to_string(),
                country: "PT".to_string(),
            },
            shipping_method: Some("  ".to_string()),
            notes: Some("Ring twice".to_string()),
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let validated = input().validate().expect("valid checkout");

        assert_eq!(validated.shipping_address.street, "1 Market St");
        assert_eq!(validated.shipping_method, None);
        assert_eq!(validated.notes.as_deref(), Some("Ring twice"));
    }

    #[test]
    fn every_missing_address_field_is_reported() {
        let errors = CheckoutInput::default()
            .validate()
            .expect_err("empty address");

        let fields: Vec<&str> = errors.iter().map(|error| error.field.as_str()).collect();

        assert_eq!(
            fields,
            [
                "shipping_address.street",
                "shipping_address.city",
                "shipping_address.postal_code",
                "shipping_address.country",
            ]
        );
    }

    #[test]
    fn long_notes_are_rejected() {
        let mut long = input();
        long.notes = Some("x".repeat(MAX_NOTES_CHARS + 1));

        let errors = long.validate().expect_err("notes too long");

        assert_eq!(errors.iter().next().map(|e| e.field.as_str()), Some("notes"));
    }

    fn order_input(items: Vec<NewOrderLine>) -> NewOrderInput {
        NewOrderInput {
            market_uuid: MarketUuid::new(),
            items,
            delivery: input(),
        }
    }

    #[test]
    fn repeated_products_merge_into_one_line() {
        let lamp = ProductUuid::new();
        let desk = ProductUuid::new();

        let validated = order_input(vec![
            NewOrderLine {
                product_uuid: lamp,
                quantity: 1,
            },
            NewOrderLine {
                product_uuid: desk,
                quantity: 1,
            },
            NewOrderLine {
                product_uuid: lamp,
                quantity: 2,
            },
        ])
        .validate()
        .expect("valid order");

        assert_eq!(validated.lines, vec![(lamp, 3), (desk, 1)]);
        assert_eq!(validated.delivery.shipping_address.city, "Lisbon");
    }

    #[test]
    fn order_without_items_is_rejected() {
        let errors = order_input(vec![]).validate().expect_err("no items");

        assert_eq!(errors.iter().next().map(|e| e.field.as_str()), Some("items"));
    }

    #[test]
    fn order_line_and_address_errors_are_reported_together() {
        let mut order = order_input(vec![NewOrderLine {
            product_uuid: ProductUuid::new(),
            quantity: 0,
        }]);
        order.delivery.shipping_address.country = String::new();

        let errors = order.validate().expect_err("invalid order");

        let fields: Vec<&str> = errors.iter().map(|error| error.field.as_str()).collect();

        assert_eq!(fields, ["items.0.quantity", "shipping_address.country"]);
    }

    #[test]
    fn default_policy_is_ten_percent_and_flat_ten() {
        let policy = CheckoutPolicy::default();

        assert_eq!(policy.tax_rate, Decimal::new(1, 1));
        assert_eq!(policy.flat_shipping, Decimal::from(10));
    }
}
