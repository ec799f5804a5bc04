//! Test Helpers
//!
//! Fixtures that set up rows through the services, plus a few direct
//! writes for states the services never produce on their own.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{query, query_scalar};

use crate::{
    domain::{
        carts::{
            CartsService,
            models::{CartItemUuid, NewCartItem},
        },
        checkout::{
            CheckoutService,
            models::{CheckoutInput, ShippingAddressInput},
        },
        markets::{
            MarketsService,
            models::{MarketUuid, NewMarket},
        },
        orders::models::Order,
        products::{
            ProductsService,
            models::{NewProduct, ProductUuid},
        },
        users::{
            UsersService,
            models::{NewUser, UserUuid},
        },
    },
    test::TestContext,
};

impl TestContext {
    /// A user with a wallet address derived from their name.
    pub async fn create_user(&self, name: &str) -> UserUuid {
        let uuid = UserUuid::new();
        let wallet = format!("{}Wallet{}", name.replace(' ', ""), uuid.into_uuid().simple());

        self.users
            .create_user(NewUser {
                uuid,
                name: name.to_string(),
                wallet_address: Some(wallet),
            })
            .await
            .expect("Failed to create test user");

        uuid
    }

    pub async fn create_market(&self, owner: UserUuid) -> MarketUuid {
        let uuid = MarketUuid::new();

        self.markets
            .create_market(NewMarket {
                uuid,
                owner_uuid: owner,
                name: "Test Market".to_string(),
                wallet_address: Some(format!("MarketWallet{}", uuid.into_uuid().simple())),
            })
            .await
            .expect("Failed to create test market");

        uuid
    }

    pub async fn create_product(&self, market: MarketUuid, price: &str, stock: i32) -> ProductUuid {
        let uuid = ProductUuid::new();

        self.products
            .create_product(NewProduct {
                uuid,
                market_uuid: market,
                name: "Test Product".to_string(),
                description: "A product for tests".to_string(),
                image_url: None,
                price: Decimal::from_str(price).expect("valid price"),
                stock_quantity: stock,
            })
            .await
            .expect("Failed to create test product");

        uuid
    }

    /// A product at 10.00 in a fresh market with its own owner.
    pub async fn seed_product(&self, stock: i32) -> ProductUuid {
        let owner = self.create_user("Seed Owner").await;
        let market = self.create_market(owner).await;

        self.create_product(market, "10.00", stock).await
    }

    pub async fn add_to_cart(&self, buyer: UserUuid, product: ProductUuid, quantity: i64) {
        self.carts
            .add_item(
                buyer,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity,
                },
            )
            .await
            .expect("Failed to add cart item");
    }

    /// Check out the buyer's whole cart with a standard address.
    pub async fn checkout_cart(&self, buyer: UserUuid) -> Vec<Order> {
        self.checkout
            .checkout(
                buyer,
                CheckoutInput {
                    shipping_address: ShippingAddressInput {
                        street: "1 Market St".to_string(),
                        city: "Lisbon".to_string(),
                        postal_code: "1000-001".to_string(),
                        country: "PT".to_string(),
                    },
                    shipping_method: Some("standard".to_string()),
                    notes: None,
                },
            )
            .await
            .expect("Failed to check out cart")
    }

    pub async fn stock_of(&self, product: ProductUuid) -> i32 {
        query_scalar("SELECT stock_quantity FROM products WHERE uuid = $1")
            .bind(product.into_uuid())
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to read stock")
    }

    pub async fn set_stock(&self, product: ProductUuid, stock: i32) {
        query("UPDATE products SET stock_quantity = $2 WHERE uuid = $1")
            .bind(product.into_uuid())
            .bind(stock)
            .execute(self.db.pool())
            .await
            .expect("Failed to set stock");
    }

    pub async fn set_price(&self, product: ProductUuid, price: &str) {
        query("UPDATE products SET price = $2 WHERE uuid = $1")
            .bind(product.into_uuid())
            .bind(Decimal::from_str(price).expect("valid price"))
            .execute(self.db.pool())
            .await
            .expect("Failed to set price");
    }

    pub async fn deactivate_product(&self, product: ProductUuid) {
        query("UPDATE products SET is_active = FALSE WHERE uuid = $1")
            .bind(product.into_uuid())
            .execute(self.db.pool())
            .await
            .expect("Failed to deactivate product");
    }
}
