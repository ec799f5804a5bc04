use bazaar_app::{
    auth::{AuthService, PgAuthService},
    domain::users::{
        PgUsersService, UsersService,
        models::{NewUser, UserUuid},
    },
};
use clap::{Args, Subcommand};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Debug, Subcommand)]
enum UserSubcommand {
    Create(CreateUserArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateUserArgs {
    /// Display name
    #[arg(long)]
    name: String,

    /// Wallet address used as the source of withdrawals
    #[arg(long)]
    wallet_address: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Optional user UUID; generated when omitted
    #[arg(long)]
    user_uuid: Option<Uuid>,

    /// Also issue an API token for the new user
    #[arg(long)]
    with_token: bool,
}

pub(crate) async fn run(command: UserCommand) -> Result<(), String> {
    match command.command {
        UserSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateUserArgs) -> Result<(), String> {
    let (db, clock) = super::connect(&args.database_url).await?;

    let user = PgUsersService::new(db.clone(), clock.clone())
        .create_user(NewUser {
            uuid: args.user_uuid.map_or_else(UserUuid::new, UserUuid::from_uuid),
            name: args.name,
            wallet_address: args.wallet_address,
        })
        .await
        .map_err(|error| format!("failed to create user: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("user_name: {}", user.name);

    if args.with_token {
        let issued = PgAuthService::new(db, clock)
            .issue_api_token(user.uuid)
            .await
            .map_err(|error| format!("failed to create token: {error}"))?;

        println!("token_uuid: {}", issued.metadata.uuid);
        println!("api_token: {}", issued.token);
        println!("store this token now; it is only shown once");
    }

    Ok(())
}
