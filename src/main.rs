use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::migrate::MigrateDatabase;
use tastebook::ai::OpenAiClient;
use tastebook::media::DiskMediaStore;
use tastebook::{create_app, AppState};

/// tastebook - recipe sharing platform
#[derive(Parser)]
#[command(name = "tastebook")]
#[command(about = "Recipe sharing platform API", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run database migrations
    Migrate,
    /// Drop database if exists and recreate with migrations
    Reset,
    /// Load the built-in demo data
    Seed,
    /// Create an administrator account
    SeedAdmin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, default_value = "Administrator")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = tastebook::config::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    tastebook::observability::init_observability(&config.observability.log_level)?;

    match cli.command {
        Commands::Serve { host, port } => serve_command(config, host, port).await,
        Commands::Migrate => migrate_command(config).await,
        Commands::Reset => reset_command(config).await,
        Commands::Seed => seed_command(config).await,
        Commands::SeedAdmin {
            email,
            password,
            name,
        } => seed_admin_command(config, email, password, name).await,
    }
}

#[tracing::instrument(skip(config))]
async fn serve_command(
    config: tastebook::config::Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting tastebook server...");

    let host = host_override.unwrap_or_else(|| config.server.host.clone());
    let port = port_override.unwrap_or(config.server.port);

    let pool =
        tastebook_db::connect(&config.database.url, config.database.max_connections).await?;
    // Statements are idempotent; running them at startup keeps deploys
    // one-step.
    tastebook_db::migrate(&pool).await?;

    let suggestions = Arc::new(OpenAiClient::new(
        config.ai.api_key.clone(),
        config.ai.model.clone(),
        config.ai.base_url.clone(),
    ));
    let media = Arc::new(DiskMediaStore::new(
        config.media.dir.clone(),
        config.media.base_url.clone(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config),
        suggestions,
        media,
    };

    let app = create_app(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    // Peer addresses feed the auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(config))]
async fn migrate_command(config: tastebook::config::Config) -> Result<()> {
    tracing::info!("Running database migrations...");
    let pool = tastebook_db::connect(&config.database.url, 1).await?;
    tastebook_db::migrate(&pool).await?;
    tracing::info!("Migrations completed successfully");
    Ok(())
}

#[tracing::instrument(skip(config))]
async fn reset_command(config: tastebook::config::Config) -> Result<()> {
    tracing::info!("Resetting database...");

    if sqlx::Sqlite::database_exists(&config.database.url).await? {
        tracing::warn!("Dropping existing database: {}", config.database.url);
        sqlx::Sqlite::drop_database(&config.database.url).await?;
    } else {
        tracing::info!("Database does not exist, nothing to drop");
    }

    migrate_command(config).await?;
    tracing::info!("Database reset completed successfully");
    Ok(())
}

#[tracing::instrument(skip(config))]
async fn seed_command(config: tastebook::config::Config) -> Result<()> {
    let pool = tastebook_db::connect(&config.database.url, 1).await?;
    tastebook_db::migrate(&pool).await?;
    tastebook::seed::seed(&pool).await?;
    Ok(())
}

#[tracing::instrument(skip(config, password))]
async fn seed_admin_command(
    config: tastebook::config::Config,
    email: String,
    password: String,
    name: String,
) -> Result<()> {
    let pool = tastebook_db::connect(&config.database.url, 1).await?;
    tastebook_db::migrate(&pool).await?;
    tastebook::seed::seed_admin(&pool, &name, &email, &password).await?;
    Ok(())
}
