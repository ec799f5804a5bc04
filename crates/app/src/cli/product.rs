use bazaar_app::domain::{
    markets::models::MarketUuid,
    products::{
        PgProductsService, ProductsService,
        models::{NewProduct, ProductUuid},
    },
};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    Create(CreateProductArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// Market the product is listed in
    #[arg(long)]
    market_uuid: Uuid,

    /// Product name
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long)]
    image_url: Option<String>,

    /// Unit price, e.g. `19.99`
    #[arg(long)]
    price: Decimal,

    /// Initial available quantity
    #[arg(long, default_value_t = 0)]
    stock: i32,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateProductArgs) -> Result<(), String> {
    if args.price.is_sign_negative() {
        return Err("price cannot be negative".to_string());
    }

    if args.stock < 0 {
        return Err("stock cannot be negative".to_string());
    }

    let (db, clock) = super::connect(&args.database_url).await?;

    let product = PgProductsService::new(db, clock)
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            market_uuid: MarketUuid::from_uuid(args.market_uuid),
            name: args.name,
            description: args.description,
            image_url: args.image_url,
            price: args.price.round_dp(2),
            stock_quantity: args.stock,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("product_price: {}", product.price);
    println!("product_stock: {}", product.stock_quantity);

    Ok(())
}
