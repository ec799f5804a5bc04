//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::Span;

use crate::{
    clock::Clock,
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{CartItem, CartItemUuid, NewCartItem},
            repository::PgCartItemsRepository,
        },
        products::{
            ProductsServiceError,
            models::{Product, ProductUuid},
            repository::PgProductsRepository,
        },
        users::models::UserUuid,
    },
    validation::{ValidationErrors, positive_quantity},
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    clock: Arc<dyn Clock>,
    items_repository: PgCartItemsRepository,
    products_repository: PgProductsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            items_repository: PgCartItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    /// Load a product a buyer wants in their cart.
    async fn cartable_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Product, CartsServiceError> {
        let found = self
            .products_repository
            .get_product(tx, product)
            .await
            .map_err(|error| match ProductsServiceError::from(error) {
                ProductsServiceError::NotFound => CartsServiceError::ProductNotFound(product),
                ProductsServiceError::Sql(source) => CartsServiceError::Sql(source),
                _other => CartsServiceError::InvalidData,
            })?;

        if !found.is_active {
            return Err(CartsServiceError::ProductUnavailable(found.uuid));
        }

        Ok(found)
    }

    /// The line, provided `buyer` owns it.
    async fn owned_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
        item: CartItemUuid,
    ) -> Result<CartItem, CartsServiceError> {
        let (owner, stored) = self.items_repository.get_item(tx, item).await?;

        if owner != buyer {
            return Err(CartsServiceError::Unauthorized);
        }

        Ok(stored)
    }
}

fn ensure_in_stock(product: &Product, requested: i32) -> Result<(), CartsServiceError> {
    if requested > product.stock_quantity {
        return Err(CartsServiceError::InsufficientStock {
            product: product.uuid,
            requested,
            available: product.stock_quantity,
        });
    }

    Ok(())
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.list_items",
        skip(self),
        fields(buyer_uuid = %buyer, line_count = tracing::field::Empty),
        err
    )]
    async fn list_items(&self, buyer: UserUuid) -> Result<Vec<CartItem>, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let items = self.items_repository.list_items(&mut tx, buyer).await?;

        tx.commit().await?;

        Span::current().record("line_count", items.len());

        Ok(items)
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(buyer_uuid = %buyer, product_uuid = %item.product_uuid),
        err
    )]
    async fn add_item(
        &self,
        buyer: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItem, CartsServiceError> {
        let mut errors = ValidationErrors::new();
        let quantity = errors.check(positive_quantity("quantity", item.quantity));

        errors.into_result()?;

        let mut tx = self.db.begin().await?;

        let product = self.cartable_product(&mut tx, item.product_uuid).await?;

        let uuid = self
            .items_repository
            .upsert_item(
                &mut tx,
                buyer,
                item.uuid,
                product.uuid,
                quantity,
                self.clock.now(),
            )
            .await?;

        let (_buyer, stored) = self.items_repository.get_item(&mut tx, uuid).await?;

        ensure_in_stock(&product, stored.quantity)?;

        tx.commit().await?;

        Ok(stored)
    }

    #[tracing::instrument(
        name = "carts.service.update_item",
        skip(self),
        fields(buyer_uuid = %buyer, cart_item_uuid = %item),
        err
    )]
    async fn update_item(
        &self,
        buyer: UserUuid,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartItem, CartsServiceError> {
        let mut errors = ValidationErrors::new();
        let quantity = errors.check(positive_quantity("quantity", quantity));

        errors.into_result()?;

        let mut tx = self.db.begin().await?;

        let current = self.owned_item(&mut tx, buyer, item).await?;
        let product = self.cartable_product(&mut tx, current.product_uuid).await?;

        ensure_in_stock(&product, quantity)?;

        let rows_affected = self
            .items_repository
            .set_quantity(&mut tx, buyer, item, quantity)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        let (_buyer, stored) = self.items_repository.get_item(&mut tx, item).await?;

        tx.commit().await?;

        Ok(stored)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        fields(buyer_uuid = %buyer, cart_item_uuid = %item),
        err
    )]
    async fn remove_item(
        &self,
        buyer: UserUuid,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        self.owned_item(&mut tx, buyer, item).await?;

        let rows_affected = self.items_repository.delete_item(&mut tx, buyer, item).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.clear",
        skip(self),
        fields(buyer_uuid = %buyer, removed = tracing::field::Empty),
        err
    )]
    async fn clear(&self, buyer: UserUuid) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let removed = self.items_repository.clear(&mut tx, buyer).await?;

        tx.commit().await?;

        Span::current().record("removed", removed);

        Ok(removed)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The buyer's cart, oldest line first.
    async fn list_items(&self, buyer: UserUuid) -> Result<Vec<CartItem>, CartsServiceError>;

    /// Add a product to the buyer's cart, merging with an existing line for
    /// the same product.
    async fn add_item(
        &self,
        buyer: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItem, CartsServiceError>;

    /// Set the quantity of one of the buyer's lines, checked against the
    /// product's current stock.
    async fn update_item(
        &self,
        buyer: UserUuid,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartItem, CartsServiceError>;

    /// Remove one line from the buyer's cart.
    async fn remove_item(
        &self,
        buyer: UserUuid,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError>;

    /// Empty the buyer's cart, returning how many lines were removed.
    async fn clear(&self, buyer: UserUuid) -> Result<u64, CartsServiceError>;
}
