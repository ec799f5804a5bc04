//! Checkout Config

use bazaar_app::domain::{checkout::models::CheckoutPolicy, transactions::models::Currency};
use clap::Args;
use rust_decimal::Decimal;

/// Checkout pricing settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Tax as a fraction of the subtotal
    #[arg(long, env = "CHECKOUT_TAX_RATE", default_value = "0.10")]
    pub checkout_tax_rate: Decimal,

    /// Flat shipping charged once per order
    #[arg(long, env = "CHECKOUT_FLAT_SHIPPING", default_value = "10.00")]
    pub checkout_flat_shipping: Decimal,

    /// Currency of the purchase and sale ledger entries (SOL, USDC, TOKEN)
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "SOL")]
    pub checkout_currency: Currency,
}

impl CheckoutConfig {
    #[must_use]
    pub fn policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            tax_rate: self.checkout_tax_rate,
            flat_shipping: self.checkout_flat_shipping,
            currency: self.checkout_currency,
        }
    }
}
