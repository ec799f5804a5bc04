use bazaar_app::domain::{
    markets::{
        MarketsService, PgMarketsService,
        models::{MarketUuid, NewMarket},
    },
    users::models::UserUuid,
};
use clap::{Args, Subcommand};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct MarketCommand {
    #[command(subcommand)]
    command: MarketSubcommand,
}

#[derive(Debug, Subcommand)]
enum MarketSubcommand {
    Create(CreateMarketArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateMarketArgs {
    /// Market display name
    #[arg(long)]
    name: String,

    /// Owning user
    #[arg(long)]
    owner_uuid: Uuid,

    /// Wallet that receives sale proceeds
    #[arg(long)]
    wallet_address: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(command: MarketCommand) -> Result<(), String> {
    match command.command {
        MarketSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateMarketArgs) -> Result<(), String> {
    let (db, clock) = super::connect(&args.database_url).await?;

    let market = PgMarketsService::new(db, clock)
        .create_market(NewMarket {
            uuid: MarketUuid::new(),
            owner_uuid: UserUuid::from_uuid(args.owner_uuid),
            name: args.name,
            wallet_address: args.wallet_address,
        })
        .await
        .map_err(|error| format!("failed to create market: {error}"))?;

    println!("market_uuid: {}", market.uuid);
    println!("market_name: {}", market.name);

    Ok(())
}
