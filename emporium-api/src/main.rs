use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emporium_api::{app, AppState, AuthConfig};
use emporium_core::Notifier;
use emporium_order::{CheckoutSettings, InMemoryOrderRepository, OrderRepository, OrderService};
use emporium_store::app_config::Config;
use emporium_store::{DbClient, LogMailer, PaystackGateway, PgOrderRepository, ResendMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "emporium_api=debug,emporium_order=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Emporium orders API on port {}", config.server.port);

    let db = if config.database.url().is_some() {
        let db = DbClient::new(&config.database)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        Some(db)
    } else {
        None
    };

    let repo: Arc<dyn OrderRepository> = match &db {
        Some(db) => Arc::new(PgOrderRepository::new(db.pool.clone())),
        None => {
            tracing::warn!("database.url not set, orders are kept in memory and lost on restart");
            Arc::new(InMemoryOrderRepository::new())
        }
    };

    let gateway = PaystackGateway::new(&config.paystack).context("Failed to set up Paystack")?;

    let notifier: Arc<dyn Notifier> = match config.mail.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => Arc::new(ResendMailer::new(&config.mail, key).context("Failed to set up mailer")?),
        None => {
            tracing::warn!("mail.api_key not set, notifications are only logged");
            Arc::new(LogMailer)
        }
    };

    let orders = OrderService::new(
        repo,
        Arc::new(gateway),
        notifier,
        CheckoutSettings {
            allow_guest_checkout: config.checkout.allow_guest,
        },
    );

    let app_state = AppState {
        orders: Arc::new(orders),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(db) = db {
        db.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining in-flight requests");
}
