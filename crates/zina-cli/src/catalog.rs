//! Catalog mirroring: copies the catalog API (or the bundled sample catalog
//! when no API is configured) into the local `categories`/`products` tables.

use std::fmt::Write as _;

use clap::Subcommand;
use zina_catalog::CatalogClient;
use zina_core::{Category, Product};

#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// Upsert categories and products from the catalog API into the database
    Sync {
        /// Print what would be written without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Upsert the bundled sample catalog, ignoring any configured API
    Seed,
}

pub(crate) async fn run_catalog_command(
    pool: &sqlx::PgPool,
    config: &zina_core::AppConfig,
    command: CatalogCommands,
) -> anyhow::Result<()> {
    match command {
        CatalogCommands::Sync { dry_run } => {
            let client = CatalogClient::from_app_config(config)?;
            if !client.is_configured() {
                tracing::warn!("ZINA_CATALOG_API_URL not set; syncing the sample catalog");
            }
            let categories = client.list_categories().await;
            let products = client.fetch_all_products().await;
            if dry_run {
                print!("{}", describe_batch(&categories, &products));
                return Ok(());
            }
            write_batch(pool, &categories, &products).await
        }
        CatalogCommands::Seed => {
            let categories = zina_catalog::sample::sample_categories();
            let products = zina_catalog::sample::sample_products();
            write_batch(pool, &categories, &products).await
        }
    }
}

async fn write_batch(
    pool: &sqlx::PgPool,
    categories: &[Category],
    products: &[Product],
) -> anyhow::Result<()> {
    let summary = zina_db::seed_catalog(pool, categories, products).await?;
    tracing::info!(
        categories = summary.categories,
        products = summary.products,
        "catalog written"
    );
    println!(
        "upserted {} categories and {} products",
        summary.categories, summary.products
    );
    Ok(())
}

/// One line per category followed by its products; uncategorized products last.
pub(crate) fn describe_batch(categories: &[Category], products: &[Product]) -> String {
    let mut out = String::new();
    for category in categories {
        let _ = writeln!(out, "{} ({})", category.name_ar, category.slug);
        for product in products.iter().filter(|p| p.category_id == Some(category.id)) {
            let _ = writeln!(out, "  - {} {}", product.slug, product.price);
        }
    }
    let orphans: Vec<&Product> = products
        .iter()
        .filter(|p| {
            p.category_id
                .is_none_or(|id| !categories.iter().any(|c| c.id == id))
        })
        .collect();
    if !orphans.is_empty() {
        out.push_str("uncategorized\n");
        for product in orphans {
            let _ = writeln!(out, "  - {} {}", product.slug, product.price);
        }
    }
    out
}
