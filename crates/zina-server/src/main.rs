mod api;
mod auth;
mod checkout;
mod data;
mod invoice;
mod middleware;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    auth::AuthState,
    data::DataAccess,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(zina_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = zina_db::PoolConfig::from_app_config(&config);
    let pool = zina_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = zina_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let catalog = zina_catalog::CatalogClient::from_app_config(&config)?;
    if !catalog.is_configured() {
        tracing::warn!("ZINA_CATALOG_API_URL not set; catalog reads serve sample data");
    }

    tokio::fs::create_dir_all(&config.receipts_dir).await?;

    let auth = AuthState::from_app_config(&config, pool.clone());
    let state = AppState::new(DataAccess::new(pool, catalog), Arc::clone(&config));
    let app = build_app(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "zina-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
