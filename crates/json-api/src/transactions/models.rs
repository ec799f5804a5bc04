//! Transaction response bodies.

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use bazaar_app::domain::{
    pagination::Page,
    transactions::models::{CurrencyTotals, Transaction, TransactionSummary},
};

use crate::pagination::PageMeta;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TransactionResponse {
    pub uuid: Uuid,

    /// `funding`, `withdrawal`, `purchase`, `sale`, `refund` or `fee`
    pub transaction_type: String,

    pub status: String,
    pub amount: String,
    pub currency: String,
    pub order_uuid: Option<Uuid>,
    pub market_uuid: Option<Uuid>,
    pub transaction_hash: Option<String>,
    pub blockchain_signature: Option<String>,
    pub from_wallet: Option<String>,
    pub to_wallet: Option<String>,
    pub gas_fee: Option<String>,
    pub description: Option<String>,
    pub metadata: Value,
    pub processed_at: Option<String>,
    pub confirmed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            uuid: transaction.uuid.into(),
            transaction_type: transaction.transaction_type.as_str().to_string(),
            status: transaction.status.as_str().to_string(),
            amount: transaction.amount.to_string(),
            currency: transaction.currency.as_str().to_string(),
            order_uuid: transaction.order_uuid.map(Into::into),
            market_uuid: transaction.market_uuid.map(Into::into),
            transaction_hash: transaction.transaction_hash,
            blockchain_signature: transaction.blockchain_signature,
            from_wallet: transaction.from_wallet,
            to_wallet: transaction.to_wallet,
            gas_fee: transaction.gas_fee.as_ref().map(ToString::to_string),
            description: transaction.description,
            metadata: Value::Object(transaction.metadata),
            processed_at: transaction.processed_at.as_ref().map(ToString::to_string),
            confirmed_at: transaction.confirmed_at.as_ref().map(ToString::to_string),
            created_at: transaction.created_at.to_string(),
            updated_at: transaction.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TransactionsPageResponse {
    pub transactions: Vec<TransactionResponse>,
    pub meta: PageMeta,
}

impl From<Page<Transaction>> for TransactionsPageResponse {
    fn from(page: Page<Transaction>) -> Self {
        let meta = PageMeta::from(&page);

        Self {
            transactions: page.items.into_iter().map(Into::into).collect(),
            meta,
        }
    }
}

/// Confirmed totals in one currency.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CurrencyTotalsResponse {
    pub currency: String,
    pub funding: String,
    pub withdrawals: String,
    pub purchases: String,
    pub sales: String,
    pub fees: String,
}

impl From<CurrencyTotals> for CurrencyTotalsResponse {
    fn from(totals: CurrencyTotals) -> Self {
        Self {
            currency: totals.currency.as_str().to_string(),
            funding: totals.funding.to_string(),
            withdrawals: totals.withdrawals.to_string(),
            purchases: totals.purchases.to_string(),
            sales: totals.sales.to_string(),
            fees: totals.fees.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TransactionSummaryResponse {
    /// Entries still waiting to settle
    pub pending_count: u64,

    pub totals: Vec<CurrencyTotalsResponse>,
}

impl From<TransactionSummary> for TransactionSummaryResponse {
    fn from(summary: TransactionSummary) -> Self {
        Self {
            pending_count: summary.pending_count,
            totals: summary.totals.into_iter().map(Into::into).collect(),
        }
    }
}
