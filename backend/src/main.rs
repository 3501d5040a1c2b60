//! Booking service entry-point: loads settings, applies migrations, starts
//! the expiry sweeper and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use reqwest::Url;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{
    AppSettings, BuildMode, ServerConfig, build_http_state, create_server, load_session_key,
};
use tutor_booking::domain::spawn_expiry_sweeper;
use tutor_booking::inbound::http::health::HealthState;
use tutor_booking::outbound::calendar::HttpCalendarProvider;
use tutor_booking::outbound::memory::load_roster;
use tutor_booking::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let config = build_server_config(&settings).await?;

    let http_state = build_http_state(&config);
    let sweeper = spawn_expiry_sweeper(Arc::clone(&http_state.sweeper), settings.sweep_interval());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, config)
        .wrap_err("failed to start HTTP server")?;
    info!(bind_addr = %settings.bind_addr(), "booking service listening");

    let served = server.await;
    health_state.mark_unhealthy();
    sweeper.shutdown().await;
    served.wrap_err("HTTP server stopped with an error")
}

async fn build_server_config(settings: &AppSettings) -> Result<ServerConfig> {
    let key = load_session_key(
        settings.session_key_file(),
        BuildMode::from_debug_assertions(),
    )?;
    let mut config = ServerConfig::new(key, settings.cookie_secure, settings.bind_addr())
        .with_external_timeout(settings.external_timeout());

    match &settings.database_url {
        Some(url) => {
            let applied = run_pending_migrations(url).await?;
            info!(applied, "database migrations applied");
            let pool_config = PoolConfig::new(url).with_max_size(settings.db_max_connections());
            let pool = DbPool::new(pool_config).await?;
            config = config.with_db_pool(pool);
        }
        None => {
            warn!("no database configured; bookings are kept in memory");
            if let Some(path) = &settings.users_file {
                let roster = load_roster(path)?;
                info!(participants = roster.len(), "participant roster loaded");
                config = config.with_roster(roster);
            }
        }
    }

    match &settings.calendar_endpoint {
        Some(endpoint) => {
            let url = Url::parse(endpoint)
                .wrap_err_with(|| format!("invalid calendar endpoint {endpoint}"))?;
            let calendar = HttpCalendarProvider::new(
                url,
                settings.external_timeout(),
                settings.calendar_token.clone(),
            )
            .wrap_err("failed to build calendar client")?;
            config = config.with_calendar(Arc::new(calendar));
        }
        None => info!("no calendar provider configured; meetings stay pending"),
    }

    Ok(config)
}
