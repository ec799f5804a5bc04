//! Transactions Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{
    FromRow, Postgres, Row, Transaction as DbTransaction, postgres::PgRow, query, query_as,
    query_scalar, types::Json,
};

use crate::{
    database::decode_column,
    domain::{
        markets::models::MarketUuid,
        orders::models::{Metadata, OrderUuid},
        pagination::Pagination,
        transactions::{
            models::{Currency, Transaction, TransactionType, TransactionUuid},
            status::TransactionStatus,
        },
        users::models::UserUuid,
    },
};

const GET_TRANSACTION_SQL: &str = include_str!("sql/get_transaction.sql");
const LOCK_TRANSACTION_SQL: &str = include_str!("sql/lock_transaction.sql");
const LOCK_TRANSACTION_BY_HASH_SQL: &str = include_str!("sql/lock_transaction_by_hash.sql");
const LIST_TRANSACTIONS_SQL: &str = include_str!("sql/list_transactions.sql");
const COUNT_TRANSACTIONS_SQL: &str = include_str!("sql/count_transactions.sql");
const INSERT_TRANSACTION_SQL: &str = include_str!("sql/insert_transaction.sql");
const SETTLE_TRANSACTION_SQL: &str = include_str!("sql/settle_transaction.sql");
const ENRICH_TRANSACTION_METADATA_SQL: &str =
    include_str!("sql/enrich_transaction_metadata.sql");
const COUNT_PENDING_TRANSACTIONS_SQL: &str = include_str!("sql/count_pending_transactions.sql");
const SUMMARIZE_TRANSACTIONS_SQL: &str = include_str!("sql/summarize_transactions.sql");

/// Columns written when a ledger entry is created. Entries always start
/// out pending.
#[derive(Debug)]
pub(crate) struct NewTransactionRow<'a> {
    pub uuid: TransactionUuid,
    pub user: UserUuid,
    pub market: Option<MarketUuid>,
    pub order: Option<OrderUuid>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub currency: Currency,
    pub transaction_hash: Option<&'a str>,
    pub blockchain_signature: Option<&'a str>,
    pub from_wallet: Option<&'a str>,
    pub to_wallet: Option<&'a str>,
    pub description: Option<&'a str>,
    pub processed_at: Option<Timestamp>,
}

/// Everything a settlement may write next to the new status. `None`
/// leaves the stored value alone.
#[derive(Debug, Default)]
pub(crate) struct SettlementChange {
    pub transaction_hash: Option<String>,
    pub blockchain_signature: Option<String>,
    pub gas_fee: Option<Decimal>,
    pub confirmed_at: Option<Timestamp>,

    /// Keys already present on the entry win.
    pub metadata: Metadata,
}

/// Listing filters, already parsed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub currency: Option<Currency>,
}

/// One `(currency, type, total)` row of the summary query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfirmedTotal {
    pub currency: Currency,
    pub transaction_type: TransactionType,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTransactionsRepository;

impl PgTransactionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_transaction(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        row: &NewTransactionRow<'_>,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(INSERT_TRANSACTION_SQL)
            .bind(row.uuid.into_uuid())
            .bind(row.user.into_uuid())
            .bind(row.market.map(MarketUuid::into_uuid))
            .bind(row.order.map(OrderUuid::into_uuid))
            .bind(row.transaction_type.as_str())
            .bind(row.amount)
            .bind(row.currency.as_str())
            .bind(row.transaction_hash)
            .bind(row.blockchain_signature)
            .bind(row.from_wallet)
            .bind(row.to_wallet)
            .bind(row.description)
            .bind(row.processed_at.map(SqlxTimestamp::from))
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn get_transaction(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        transaction: TransactionUuid,
    ) -> Result<Transaction, sqlx::Error> {
        query_as::<Postgres, Transaction>(GET_TRANSACTION_SQL)
            .bind(transaction.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_transaction(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        transaction: TransactionUuid,
    ) -> Result<Transaction, sqlx::Error> {
        query_as::<Postgres, Transaction>(LOCK_TRANSACTION_SQL)
            .bind(transaction.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_by_hash(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        transaction_hash: &str,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        query_as::<Postgres, Transaction>(LOCK_TRANSACTION_BY_HASH_SQL)
            .bind(transaction_hash)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_transactions(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        user: UserUuid,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        query_as::<Postgres, Transaction>(LIST_TRANSACTIONS_SQL)
            .bind(user.into_uuid())
            .bind(filter.transaction_type.map(TransactionType::as_str))
            .bind(filter.status.map(TransactionStatus::as_str))
            .bind(filter.currency.map(Currency::as_str))
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_transactions(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        user: UserUuid,
        filter: TransactionFilter,
    ) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_TRANSACTIONS_SQL)
            .bind(user.into_uuid())
            .bind(filter.transaction_type.map(TransactionType::as_str))
            .bind(filter.status.map(TransactionStatus::as_str))
            .bind(filter.currency.map(Currency::as_str))
            .fetch_one(&mut **tx)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Move the entry from `observed` to `status`. Zero rows affected means
    /// someone else settled it first.
    pub(crate) async fn settle(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        transaction: TransactionUuid,
        observed: TransactionStatus,
        status: TransactionStatus,
        change: SettlementChange,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SETTLE_TRANSACTION_SQL)
            .bind(transaction.into_uuid())
            .bind(observed.as_str())
            .bind(status.as_str())
            .bind(change.transaction_hash)
            .bind(change.blockchain_signature)
            .bind(change.gas_fee)
            .bind(change.confirmed_at.map(SqlxTimestamp::from))
            .bind(Json(change.metadata))
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Add metadata keys the entry does not have yet. Allowed in any status.
    pub(crate) async fn enrich_metadata(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        transaction: TransactionUuid,
        metadata: Metadata,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(ENRICH_TRANSACTION_METADATA_SQL)
            .bind(transaction.into_uuid())
            .bind(Json(metadata))
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn count_pending(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_PENDING_TRANSACTIONS_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Confirmed totals: the user's own funding, withdrawals and purchases,
    /// plus sales and fees booked against markets they own.
    pub(crate) async fn confirmed_totals(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<ConfirmedTotal>, sqlx::Error> {
        query_as::<Postgres, ConfirmedTotal>(SUMMARIZE_TRANSACTIONS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Transaction {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let transaction_type: TransactionType =
            decode_column("type", row.try_get::<String, _>("type")?.parse())?;
        let status: TransactionStatus =
            decode_column("status", row.try_get::<String, _>("status")?.parse())?;
        let currency: Currency =
            decode_column("currency", row.try_get::<String, _>("currency")?.parse())?;

        Ok(Self {
            uuid: TransactionUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            market_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("market_uuid")?
                .map(MarketUuid::from_uuid),
            market_owner_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("market_owner_uuid")?
                .map(UserUuid::from_uuid),
            order_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("order_uuid")?
                .map(OrderUuid::from_uuid),
            transaction_type,
            status,
            amount: row.try_get("amount")?,
            currency,
            transaction_hash: row.try_get("transaction_hash")?,
            blockchain_signature: row.try_get("blockchain_signature")?,
            from_wallet: row.try_get("from_wallet")?,
            to_wallet: row.try_get("to_wallet")?,
            gas_fee: row.try_get("gas_fee")?,
            description: row.try_get("description")?,
            metadata: row.try_get::<Json<Metadata>, _>("metadata")?.0,
            processed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("processed_at")?
                .map(SqlxTimestamp::to_jiff),
            confirmed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("confirmed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ConfirmedTotal {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            currency: decode_column("currency", row.try_get::<String, _>("currency")?.parse())?,
            transaction_type: decode_column("type", row.try_get::<String, _>("type")?.parse())?,
            total: row.try_get("total")?,
        })
    }
}
