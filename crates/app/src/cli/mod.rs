use std::sync::Arc;

use bazaar_app::{
    clock::{Clock, SystemClock},
    database::{self, Db},
};
use clap::{Parser, Subcommand};

mod market;
mod product;
mod token;
mod user;

#[derive(Debug, Parser)]
#[command(name = "bazaar-app", about = "Bazaar seeding CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    User(user::UserCommand),
    Token(token::TokenCommand),
    Market(market::MarketCommand),
    Product(product::ProductCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::User(command) => user::run(command).await,
            Commands::Token(command) => token::run(command).await,
            Commands::Market(command) => market::run(command).await,
            Commands::Product(command) => product::run(command).await,
        }
    }
}

/// Connect, bring the schema up to date, and hand back a wall clock.
async fn connect(database_url: &str) -> Result<(Db, Arc<dyn Clock>), String> {
    let pool = database::connect(database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to apply migrations: {error}"))?;

    Ok((Db::new(pool), Arc::new(SystemClock)))
}
