mod admin;
mod catalog;
mod quote;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::admin::AdminCommands;
use crate::catalog::CatalogCommands;

#[derive(Debug, Parser)]
#[command(name = "zina-cli")]
#[command(about = "Zina store command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Catalog mirroring
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Back-office accounts
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Price a saved cart snapshot with the configured tax and discounts
    Quote {
        /// Path to a cart snapshot (JSON array of cart lines)
        cart: PathBuf,
        /// Discount code to apply
        #[arg(long)]
        discount: Option<String>,
        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("zina-cli: run with --help to list commands");
        return Ok(());
    };

    let config = zina_core::load_app_config()?;

    match command {
        Commands::Quote {
            cart,
            discount,
            json,
        } => {
            let policy = config.pricing_policy();
            let quote = quote::quote_cart_file(&cart, &policy, discount.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                print!("{}", quote::format_quote(&quote));
            }
        }
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    zina_db::health_check(&pool).await?;
                    println!("database reachable");
                }
                DbCommands::Migrate => {
                    let applied = zina_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Commands::Catalog { command } => {
            let pool = connect(&config).await?;
            catalog::run_catalog_command(&pool, &config, command).await?;
        }
        Commands::Admin { command } => {
            let pool = connect(&config).await?;
            admin::run_admin_command(&pool, command).await?;
        }
    }

    Ok(())
}

async fn connect(config: &zina_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = zina_db::PoolConfig::from_app_config(config);
    let pool = zina_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
