//! Transaction Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::{
        markets::models::MarketUuid,
        orders::{
            models::{Metadata, OrderUuid},
            status::UnknownValue,
        },
        transactions::status::TransactionStatus,
        users::models::UserUuid,
    },
    uuids::TypedUuid,
};

/// Transaction UUID
pub type TransactionUuid = TypedUuid<Transaction>;

/// Kind of monetary movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Funding,
    Withdrawal,
    Purchase,
    Sale,
    Refund,
    Fee,
}

impl TransactionType {
    pub const ALL: [Self; 6] = [
        Self::Funding,
        Self::Withdrawal,
        Self::Purchase,
        Self::Sale,
        Self::Refund,
        Self::Fee,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Funding => "funding",
            Self::Withdrawal => "withdrawal",
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Refund => "refund",
            Self::Fee => "fee",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownValue(value.to_string()))
    }
}

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Currency {
    #[default]
    Sol,
    Usdc,
    Token,
}

impl Currency {
    pub const ALL: [Self; 3] = [Self::Sol, Self::Usdc, Self::Token];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sol => "SOL",
            Self::Usdc => "USDC",
            Self::Token => "TOKEN",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|currency| currency.as_str() == value)
            .ok_or_else(|| UnknownValue(value.to_string()))
    }
}

/// Ledger entry.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub uuid: TransactionUuid,
    pub user_uuid: UserUuid,
    pub market_uuid: Option<MarketUuid>,
    pub market_owner_uuid: Option<UserUuid>,
    pub order_uuid: Option<OrderUuid>,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub transaction_hash: Option<String>,
    pub blockchain_signature: Option<String>,
    pub from_wallet: Option<String>,
    pub to_wallet: Option<String>,
    pub gas_fee: Option<Decimal>,
    pub description: Option<String>,
    pub metadata: Metadata,
    pub processed_at: Option<Timestamp>,
    pub confirmed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Raw wallet funding request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFunding {
    pub amount: String,
    pub currency: String,
    pub transaction_hash: String,
    pub from_wallet: String,
    pub to_wallet: String,
    pub blockchain_signature: Option<String>,
    pub description: Option<String>,
}

/// Raw withdrawal request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub amount: String,
    pub currency: String,
    pub to_wallet: String,
    pub description: Option<String>,
}

/// Raw owner confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmTransaction {
    pub transaction_hash: Option<String>,
    pub blockchain_signature: Option<String>,
    pub gas_fee: Option<String>,
}

/// Raw settlement webhook body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookPayload {
    pub transaction_hash: String,
    pub status: String,
    pub gas_fee: Option<String>,
    pub block_number: Option<i64>,
    pub signature: String,
}

/// Result of a webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookReceipt {
    pub transaction: Transaction,

    /// False when the entry was already settled and nothing changed.
    pub applied: bool,
}

/// Raw listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionListQuery {
    pub transaction_type: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Confirmed totals for one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyTotals {
    pub currency: Currency,
    pub funding: Decimal,
    pub withdrawals: Decimal,
    pub purchases: Decimal,
    pub sales: Decimal,
    pub fees: Decimal,
}

impl CurrencyTotals {
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            currency,
            funding: Decimal::ZERO,
            withdrawals: Decimal::ZERO,
            purchases: Decimal::ZERO,
            sales: Decimal::ZERO,
            fees: Decimal::ZERO,
        }
    }
}

/// Ledger overview for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub pending_count: u64,
    pub totals: Vec<CurrencyTotals>,
}
