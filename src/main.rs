use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use affiliate_attribution::config::Config;
use affiliate_attribution::db::{
    AppState, DbPool, SqliteStore, WebhookSettings, create_pool, init_db, queries,
};
use affiliate_attribution::handlers;
use affiliate_attribution::models::{CommissionTier, CreatePartner, PartnerStatus};
use affiliate_attribution::platform::OrderClient;

#[derive(Parser, Debug)]
#[command(name = "affiliate-attribution")]
#[command(about = "Order attribution and commission recording for storefront partners")]
struct Cli {
    /// Seed the database with a demo approved partner (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Inserts a demo partner so webhooks can be exercised locally.
fn seed_dev_data(pool: &DbPool) -> Result<(), String> {
    let conn = pool.get().map_err(|e| e.to_string())?;

    if queries::get_partner_by_code(&conn, "DEMO10")
        .map_err(|e| e.to_string())?
        .is_some()
    {
        tracing::info!("Demo partner already exists, skipping seed");
        return Ok(());
    }

    let partner = queries::create_partner(
        &conn,
        &CreatePartner {
            name: "Demo Lighting Partner".to_string(),
            referral_code: "DEMO10".to_string(),
            status: PartnerStatus::Approved,
            base_rate_bps: 500,
            tiers: vec![CommissionTier {
                label: "volume".to_string(),
                min_order_cents: 25_000,
                rate_bps: 800,
            }],
        },
    )
    .map_err(|e| e.to_string())?;

    tracing::info!("Seeded partner {} with code {}", partner.id, partner.referral_code);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "affiliate_attribution=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET not set: order webhooks are accepted unsigned");
    }
    if !config.platform.is_configured() {
        tracing::warn!("Platform store id/access token not set: every order fetch will fail");
    }

    let pool = create_pool(&config.database_path).unwrap_or_else(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        std::process::exit(1);
    });

    {
        let conn = pool.get().unwrap_or_else(|e| {
            tracing::error!("Failed to get database connection: {}", e);
            std::process::exit(1);
        });
        if let Err(e) = init_db(&conn) {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    }

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ATTRIBUTION_ENV=dev)");
        } else if let Err(e) = seed_dev_data(&pool) {
            tracing::error!("Failed to seed dev data: {}", e);
        }
    }

    let state = AppState {
        store: Arc::new(SqliteStore::new(pool)),
        orders: OrderClient::new(&config.platform),
        webhook: WebhookSettings {
            secret: config.webhook_secret.clone(),
            deadline: config.webhook_deadline,
            attribution_window_days: config.attribution_window_days,
        },
    };

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Attribution server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
