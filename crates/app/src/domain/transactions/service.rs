//! Transactions Service

use std::{
    collections::BTreeMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Postgres, Transaction as DbTransaction};
use tracing::{Span, info, warn};

use crate::{
    chain::{ChainClient, SignatureStatus},
    clock::Clock,
    database::Db,
    domain::{
        orders::{models::Metadata, repositories::PgOrdersRepository, status::PaymentStatus},
        pagination::{Page, Pagination},
        transactions::{
            errors::TransactionsServiceError,
            models::{
                ConfirmTransaction, Currency, CurrencyTotals, NewFunding, NewWithdrawal,
                Transaction, TransactionListQuery, TransactionSummary, TransactionType,
                TransactionUuid, WebhookPayload, WebhookReceipt,
            },
            repository::{
                NewTransactionRow, PgTransactionsRepository, SettlementChange, TransactionFilter,
            },
            settlement::{Settlement, SettlementSource, Verdict, settle},
            signature::{WebhookSecret, canonical_message},
            status::TransactionStatus,
        },
        users::{models::UserUuid, repository::PgUsersRepository},
    },
    validation::{
        FieldError, MAX_TEXT_CHARS, ValidationErrors, decimal_amount, one_of, optional_text,
        required_text,
    },
};

/// Smallest amount a user may fund or withdraw.
const MIN_TRANSFER_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Ledger amounts carry eight fractional digits.
const AMOUNT_SCALE: u32 = 8;

const CURRENCIES: [&str; 3] = ["SOL", "USDC", "TOKEN"];
const TYPES: [&str; 6] = ["funding", "withdrawal", "purchase", "sale", "refund", "fee"];
const STATUSES: [&str; 5] = ["pending", "processing", "confirmed", "failed", "cancelled"];

const DEFAULT_FUNDING_DESCRIPTION: &str = "Wallet funding";
const DEFAULT_WITHDRAWAL_DESCRIPTION: &str = "Wallet withdrawal";

#[derive(Clone)]
pub struct PgTransactionsService {
    db: Db,
    clock: Arc<dyn Clock>,
    chain: Arc<dyn ChainClient>,
    webhook_secret: WebhookSecret,
    repository: PgTransactionsRepository,
    users_repository: PgUsersRepository,
    orders_repository: PgOrdersRepository,
}

impl PgTransactionsService {
    #[must_use]
    pub fn new(
        db: Db,
        clock: Arc<dyn Clock>,
        chain: Arc<dyn ChainClient>,
        webhook_secret: WebhookSecret,
    ) -> Self {
        Self {
            db,
            clock,
            chain,
            webhook_secret,
            repository: PgTransactionsRepository::new(),
            users_repository: PgUsersRepository::new(),
            orders_repository: PgOrdersRepository::new(),
        }
    }

    /// Apply a settlement report to an entry the caller has locked.
    ///
    /// Returns whether the status changed.
    async fn apply_settlement(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        transaction: &Transaction,
        verdict: Verdict,
        source: SettlementSource,
        mut change: SettlementChange,
        now: Timestamp,
    ) -> Result<bool, TransactionsServiceError> {
        let settlement = settle(transaction.status, verdict, source).map_err(|rejected| {
            TransactionsServiceError::InvalidStateTransition {
                transaction: transaction.uuid,
                current: rejected.current,
                action: "confirm",
            }
        })?;

        let Settlement::Transition {
            status,
            stamp_confirmed,
        } = settlement
        else {
            if !change.metadata.is_empty() {
                self.repository
                    .enrich_metadata(tx, transaction.uuid, change.metadata, now)
                    .await?;
            }

            return Ok(false);
        };

        if stamp_confirmed {
            change.confirmed_at = Some(now);
        }

        let rows_affected = self
            .repository
            .settle(tx, transaction.uuid, transaction.status, status, change, now)
            .await?;

        if rows_affected == 0 {
            return Err(TransactionsServiceError::InvalidStateTransition {
                transaction: transaction.uuid,
                current: transaction.status,
                action: "settle",
            });
        }

        let payment_status = match status {
            TransactionStatus::Confirmed => Some(PaymentStatus::Paid),
            TransactionStatus::Failed => Some(PaymentStatus::Failed),
            TransactionStatus::Pending
            | TransactionStatus::Processing
            | TransactionStatus::Cancelled => None,
        };

        // Only the buyer's purchase entry drives the order's payment status.
        if let (TransactionType::Purchase, Some(order), Some(payment_status)) = (
            transaction.transaction_type,
            transaction.order_uuid,
            payment_status,
        ) {
            self.orders_repository
                .update_payment_status(tx, order, PaymentStatus::Pending, payment_status, now)
                .await?;
        }

        info!(
            transaction_uuid = %transaction.uuid,
            from = %transaction.status,
            to = %status,
            "settled transaction"
        );

        Ok(true)
    }

    /// Lock the entry and apply what the chain reported for it.
    async fn settle_from_chain(
        &self,
        transaction: TransactionUuid,
        report: &SignatureStatus,
    ) -> Result<Transaction, TransactionsServiceError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let locked = self.repository.lock_transaction(&mut tx, transaction).await?;

        let mut metadata = Metadata::new();

        if let Some(slot) = report.slot {
            metadata.insert("slot".to_string(), Value::from(slot));
        }

        self.apply_settlement(
            &mut tx,
            &locked,
            report.verdict(),
            SettlementSource::Chain,
            SettlementChange {
                metadata,
                ..SettlementChange::default()
            },
            now,
        )
        .await?;

        let settled = self.repository.get_transaction(&mut tx, transaction).await?;

        tx.commit().await?;

        Ok(settled)
    }

    /// Read an entry its owner wants to act on.
    async fn owned(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError> {
        let locked = self.repository.lock_transaction(tx, transaction).await?;

        if locked.user_uuid != user {
            return Err(TransactionsServiceError::Unauthorized);
        }

        Ok(locked)
    }
}

impl Debug for PgTransactionsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgTransactionsService")
            .field("db", &self.db)
            .field("clock", &self.clock)
            .field("webhook_secret", &self.webhook_secret)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionsService for PgTransactionsService {
    #[tracing::instrument(
        name = "transactions.service.list_transactions",
        skip(self, query),
        fields(user_uuid = %user, total = tracing::field::Empty),
        err
    )]
    async fn list_transactions(
        &self,
        user: UserUuid,
        query: TransactionListQuery,
    ) -> Result<Page<Transaction>, TransactionsServiceError> {
        let mut errors = ValidationErrors::new();

        let filter = TransactionFilter {
            transaction_type: errors.check(optional_choice("type", query.transaction_type, &TYPES)),
            status: errors.check(optional_choice("status", query.status, &STATUSES)),
            currency: errors.check(optional_choice("currency", query.currency, &CURRENCIES)),
        };

        let pagination = errors.absorb(Pagination::from_query(query.page, query.per_page));

        errors.into_result()?;

        let mut tx = self.db.begin().await?;

        let items = self
            .repository
            .list_transactions(&mut tx, user, filter, pagination)
            .await?;

        let total = self.repository.count_transactions(&mut tx, user, filter).await?;

        tx.commit().await?;

        Span::current().record("total", total);

        Ok(Page::new(items, total, pagination))
    }

    #[tracing::instrument(
        name = "transactions.service.get_transaction",
        skip(self),
        fields(user_uuid = %user, transaction_uuid = %transaction),
        err
    )]
    async fn get_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError> {
        let mut tx = self.db.begin().await?;

        let found = self.repository.get_transaction(&mut tx, transaction).await?;

        tx.commit().await?;

        if found.user_uuid != user && found.market_owner_uuid != Some(user) {
            return Err(TransactionsServiceError::Unauthorized);
        }

        Ok(found)
    }

    #[tracing::instrument(
        name = "transactions.service.summary",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn summary(&self, user: UserUuid) -> Result<TransactionSummary, TransactionsServiceError> {
        let mut tx = self.db.begin().await?;

        let pending_count = self.repository.count_pending(&mut tx, user).await?;
        let rows = self.repository.confirmed_totals(&mut tx, user).await?;

        tx.commit().await?;

        let mut totals: BTreeMap<Currency, CurrencyTotals> = BTreeMap::new();

        for row in rows {
            let entry = totals
                .entry(row.currency)
                .or_insert_with(|| CurrencyTotals::zero(row.currency));

            let bucket = match row.transaction_type {
                TransactionType::Funding => &mut entry.funding,
                TransactionType::Withdrawal => &mut entry.withdrawals,
                TransactionType::Purchase => &mut entry.purchases,
                TransactionType::Sale => &mut entry.sales,
                TransactionType::Fee => &mut entry.fees,
                TransactionType::Refund => continue,
            };

            *bucket += row.total;
        }

        Ok(TransactionSummary {
            pending_count,
            totals: totals.into_values().collect(),
        })
    }

    #[tracing::instrument(
        name = "transactions.service.create_funding",
        skip(self, funding),
        fields(user_uuid = %user, transaction_uuid = tracing::field::Empty),
        err
    )]
    async fn create_funding(
        &self,
        user: UserUuid,
        funding: NewFunding,
    ) -> Result<Transaction, TransactionsServiceError> {
        let mut errors = ValidationErrors::new();

        let amount = errors.check(decimal_amount(
            "amount",
            &funding.amount,
            MIN_TRANSFER_AMOUNT,
            AMOUNT_SCALE,
        ));
        let currency: Currency = errors.check(one_of("currency", &funding.currency, &CURRENCIES));
        let transaction_hash = errors.check(required_text(
            "transaction_hash",
            &funding.transaction_hash,
            MAX_TEXT_CHARS,
        ));
        let from_wallet =
            errors.check(required_text("from_wallet", &funding.from_wallet, MAX_TEXT_CHARS));
        let to_wallet =
            errors.check(required_text("to_wallet", &funding.to_wallet, MAX_TEXT_CHARS));
        let blockchain_signature = errors.check(optional_text(
            "blockchain_signature",
            funding.blockchain_signature.as_deref(),
            MAX_TEXT_CHARS,
        ));
        let description = errors.check(optional_text(
            "description",
            funding.description.as_deref(),
            MAX_TEXT_CHARS,
        ));

        errors.into_result()?;

        let uuid = TransactionUuid::new();

        Span::current().record("transaction_uuid", tracing::field::display(uuid));

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        self.repository
            .insert_transaction(
                &mut tx,
                &NewTransactionRow {
                    uuid,
                    user,
                    market: None,
                    order: None,
                    transaction_type: TransactionType::Funding,
                    amount,
                    currency,
                    transaction_hash: Some(&transaction_hash),
                    blockchain_signature: blockchain_signature.as_deref(),
                    from_wallet: Some(&from_wallet),
                    to_wallet: Some(&to_wallet),
                    description: Some(
                        description
                            .as_deref()
                            .unwrap_or(DEFAULT_FUNDING_DESCRIPTION),
                    ),
                    processed_at: Some(now),
                },
                now,
            )
            .await?;

        let created = self.repository.get_transaction(&mut tx, uuid).await?;

        tx.commit().await?;

        info!(transaction_uuid = %uuid, "recorded funding");

        // The lookup is advisory: the entry stays pending if the chain
        // service is down or has not seen the hash yet.
        match self.chain.signature_status(&transaction_hash).await {
            Ok(Some(report)) => match self.settle_from_chain(uuid, &report).await {
                Ok(settled) => Ok(settled),
                Err(error) => {
                    warn!(transaction_uuid = %uuid, %error, "could not apply chain status");
                    Ok(created)
                }
            },
            Ok(None) => Ok(created),
            Err(error) => {
                warn!(transaction_uuid = %uuid, %error, "chain lookup failed");
                Ok(created)
            }
        }
    }

    #[tracing::instrument(
        name = "transactions.service.create_withdrawal",
        skip(self, withdrawal),
        fields(user_uuid = %user, transaction_uuid = tracing::field::Empty),
        err
    )]
    async fn create_withdrawal(
        &self,
        user: UserUuid,
        withdrawal: NewWithdrawal,
    ) -> Result<Transaction, TransactionsServiceError> {
        let mut errors = ValidationErrors::new();

        let amount = errors.check(decimal_amount(
            "amount",
            &withdrawal.amount,
            MIN_TRANSFER_AMOUNT,
            AMOUNT_SCALE,
        ));
        let currency: Currency =
            errors.check(one_of("currency", &withdrawal.currency, &CURRENCIES));
        let to_wallet =
            errors.check(required_text("to_wallet", &withdrawal.to_wallet, MAX_TEXT_CHARS));
        let description = errors.check(optional_text(
            "description",
            withdrawal.description.as_deref(),
            MAX_TEXT_CHARS,
        ));

        errors.into_result()?;

        let uuid = TransactionUuid::new();

        Span::current().record("transaction_uuid", tracing::field::display(uuid));

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let owner = self
            .users_repository
            .get_user(&mut tx, user)
            .await
            .map_err(|error| match TransactionsServiceError::from(error) {
                TransactionsServiceError::NotFound => TransactionsServiceError::InvalidReference,
                other => other,
            })?;

        self.repository
            .insert_transaction(
                &mut tx,
                &NewTransactionRow {
                    uuid,
                    user,
                    market: None,
                    order: None,
                    transaction_type: TransactionType::Withdrawal,
                    amount,
                    currency,
                    transaction_hash: None,
                    blockchain_signature: None,
                    from_wallet: owner.wallet_address.as_deref(),
                    to_wallet: Some(&to_wallet),
                    description: Some(
                        description
                            .as_deref()
                            .unwrap_or(DEFAULT_WITHDRAWAL_DESCRIPTION),
                    ),
                    processed_at: None,
                },
                now,
            )
            .await?;

        let created = self.repository.get_transaction(&mut tx, uuid).await?;

        tx.commit().await?;

        info!(transaction_uuid = %uuid, "recorded withdrawal");

        Ok(created)
    }

    #[tracing::instrument(
        name = "transactions.service.confirm_transaction",
        skip(self, confirmation),
        fields(user_uuid = %user, transaction_uuid = %transaction),
        err
    )]
    async fn confirm_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
        confirmation: ConfirmTransaction,
    ) -> Result<Transaction, TransactionsServiceError> {
        let mut errors = ValidationErrors::new();

        let transaction_hash = errors.check(optional_text(
            "transaction_hash",
            confirmation.transaction_hash.as_deref(),
            MAX_TEXT_CHARS,
        ));
        let blockchain_signature = errors.check(optional_text(
            "blockchain_signature",
            confirmation.blockchain_signature.as_deref(),
            MAX_TEXT_CHARS,
        ));
        let gas_fee = errors.check(optional_gas_fee(confirmation.gas_fee.as_deref()));

        errors.into_result()?;

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let locked = self.owned(&mut tx, user, transaction).await?;

        self.apply_settlement(
            &mut tx,
            &locked,
            Verdict::Confirmed,
            SettlementSource::Owner,
            SettlementChange {
                transaction_hash,
                blockchain_signature,
                gas_fee,
                ..SettlementChange::default()
            },
            now,
        )
        .await?;

        let confirmed = self.repository.get_transaction(&mut tx, transaction).await?;

        tx.commit().await?;

        Ok(confirmed)
    }

    #[tracing::instrument(
        name = "transactions.service.cancel_transaction",
        skip(self),
        fields(user_uuid = %user, transaction_uuid = %transaction),
        err
    )]
    async fn cancel_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let locked = self.owned(&mut tx, user, transaction).await?;

        let cancelled = locked.status.is_open()
            && self
                .repository
                .settle(
                    &mut tx,
                    transaction,
                    locked.status,
                    TransactionStatus::Cancelled,
                    SettlementChange::default(),
                    now,
                )
                .await?
                > 0;

        if !cancelled {
            return Err(TransactionsServiceError::InvalidStateTransition {
                transaction,
                current: locked.status,
                action: "cancel",
            });
        }

        let updated = self.repository.get_transaction(&mut tx, transaction).await?;

        tx.commit().await?;

        info!(transaction_uuid = %transaction, "cancelled transaction");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "transactions.service.sync_transaction",
        skip(self),
        fields(user_uuid = %user, transaction_uuid = %transaction),
        err
    )]
    async fn sync_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self.owned(&mut tx, user, transaction).await?;

        tx.commit().await?;

        let Some(transaction_hash) = current.transaction_hash.clone() else {
            return Err(ValidationErrors::single(
                "transaction_hash",
                "is required to sync with the chain",
            )
            .into());
        };

        let report = self
            .chain
            .signature_status(&transaction_hash)
            .await
            .map_err(TransactionsServiceError::ExternalServiceFailure)?;

        match report {
            Some(report) => self.settle_from_chain(transaction, &report).await,
            None => Ok(current),
        }
    }

    #[tracing::instrument(
        name = "transactions.service.handle_webhook",
        skip(self, payload),
        fields(
            transaction_hash = tracing::field::Empty,
            transaction_uuid = tracing::field::Empty,
            applied = tracing::field::Empty
        ),
        err
    )]
    async fn handle_webhook(
        &self,
        payload: WebhookPayload,
    ) -> Result<WebhookReceipt, TransactionsServiceError> {
        let mut errors = ValidationErrors::new();

        let transaction_hash = errors.check(required_text(
            "transaction_hash",
            &payload.transaction_hash,
            MAX_TEXT_CHARS,
        ));
        let verdict = errors.check(webhook_verdict(&payload.status));
        let gas_fee = errors.check(optional_gas_fee(payload.gas_fee.as_deref()));
        let block_number = errors.check(optional_block_number(payload.block_number));
        errors.check(required_text("signature", &payload.signature, MAX_TEXT_CHARS));

        errors.into_result()?;

        let span = Span::current();

        span.record("transaction_hash", transaction_hash.as_str());

        let message = canonical_message(
            &payload.transaction_hash,
            &payload.status,
            payload.gas_fee.as_deref(),
            payload.block_number,
        );

        if !self.webhook_secret.verify(&message, &payload.signature) {
            warn!(transaction_hash = %transaction_hash, "rejected webhook signature");

            return Err(TransactionsServiceError::InvalidSignature);
        }

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let locked = self
            .repository
            .lock_by_hash(&mut tx, &transaction_hash)
            .await?
            .ok_or_else(|| TransactionsServiceError::UnknownHash(transaction_hash.clone()))?;

        span.record("transaction_uuid", tracing::field::display(locked.uuid));

        let mut metadata = Metadata::new();

        if let Some(block_number) = block_number {
            metadata.insert("block_number".to_string(), Value::from(block_number));
        }

        let applied = self
            .apply_settlement(
                &mut tx,
                &locked,
                verdict,
                SettlementSource::Chain,
                SettlementChange {
                    gas_fee,
                    metadata,
                    ..SettlementChange::default()
                },
                now,
            )
            .await?;

        let transaction = self.repository.get_transaction(&mut tx, locked.uuid).await?;

        tx.commit().await?;

        span.record("applied", applied);

        Ok(WebhookReceipt {
            transaction,
            applied,
        })
    }
}

#[automock]
#[async_trait]
pub trait TransactionsService: Send + Sync {
    /// The caller's ledger entries, newest first.
    async fn list_transactions(
        &self,
        user: UserUuid,
        query: TransactionListQuery,
    ) -> Result<Page<Transaction>, TransactionsServiceError>;

    /// One entry, visible to its owner and to the owner of its market.
    async fn get_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError>;

    /// Pending count and confirmed totals per currency.
    async fn summary(&self, user: UserUuid) -> Result<TransactionSummary, TransactionsServiceError>;

    /// Record an incoming transfer and ask the chain how far it got.
    async fn create_funding(
        &self,
        user: UserUuid,
        funding: NewFunding,
    ) -> Result<Transaction, TransactionsServiceError>;

    /// Record a pending outgoing transfer from the user's wallet.
    async fn create_withdrawal(
        &self,
        user: UserUuid,
        withdrawal: NewWithdrawal,
    ) -> Result<Transaction, TransactionsServiceError>;

    /// Owner confirmation of a pending entry.
    async fn confirm_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
        confirmation: ConfirmTransaction,
    ) -> Result<Transaction, TransactionsServiceError>;

    /// Withdraw a pending or processing entry.
    async fn cancel_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError>;

    /// Pull the entry's status from the chain service and apply it.
    async fn sync_transaction(
        &self,
        user: UserUuid,
        transaction: TransactionUuid,
    ) -> Result<Transaction, TransactionsServiceError>;

    /// Verify and apply a signed settlement report.
    async fn handle_webhook(
        &self,
        payload: WebhookPayload,
    ) -> Result<WebhookReceipt, TransactionsServiceError>;
}

fn optional_choice<T: std::str::FromStr>(
    field: &str,
    raw: Option<String>,
    allowed: &[&str],
) -> Result<Option<T>, FieldError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| one_of(field, &value, allowed))
        .transpose()
}

fn optional_gas_fee(raw: Option<&str>) -> Result<Option<Decimal>, FieldError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| decimal_amount("gas_fee", value, Decimal::ZERO, AMOUNT_SCALE))
        .transpose()
}

fn optional_block_number(raw: Option<i64>) -> Result<Option<i64>, FieldError> {
    match raw {
        Some(block) if block < 0 => Err(FieldError::new("block_number", "must not be negative")),
        other => Ok(other),
    }
}

fn webhook_verdict(raw: &str) -> Result<Verdict, FieldError> {
    match raw {
        "confirmed" => Ok(Verdict::Confirmed),
        "failed" => Ok(Verdict::Failed),
        _ => Err(FieldError::new("status", "must be one of: confirmed, failed")),
    }
}
