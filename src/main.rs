use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally::api::{self, AppState};
use tally::auth::{hash_password, TokenKeys};
use tally::config::{Cli, Commands, CreateUserArgs, DbArgs, ServeArgs};
use tally::models::CreateUserInput;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "tally=debug,tally_core=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => serve(args).await?,
        Some(Commands::Migrate { db }) => migrate(&db)?,
        Some(Commands::CreateUser(args)) => create_user(args)?,
        // Default: start server
        None => serve(cli.serve).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;

    let db = config.db.open()?;
    db.migrate()?;
    let seeded = db.seed_default_stages()?;
    if seeded > 0 {
        tracing::info!(count = seeded, "seeded default pipeline stages");
    }

    let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl);
    let state = AppState::new(db, Arc::new(config.policy), tokens);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Tally server listening on http://{}", config.addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn migrate(args: &DbArgs) -> anyhow::Result<()> {
    let db = args.open()?;
    db.migrate()?;
    let seeded = db.seed_default_stages()?;
    println!("Schema is up to date ({} stages seeded)", seeded);
    Ok(())
}

fn create_user(args: CreateUserArgs) -> anyhow::Result<()> {
    let db = args.db.open()?;
    db.migrate()?;

    let password_hash = hash_password(&args.password, bcrypt::DEFAULT_COST)?;
    let user = db.create_user(CreateUserInput {
        name: args.name,
        email: args.email,
        password_hash,
        role: args.role.into(),
    })?;
    println!("Created {} user {} ({})", user.role.as_str(), user.email, user.id);
    Ok(())
}
