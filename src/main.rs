/// Admissions Portal
///
/// A university-application management portal backend: applicants track
/// document submissions and timeline events, admins manage feedback,
/// checklists, messaging, and admin-user permissions.

mod admin;
mod api;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod portal;
mod server;

use config::ServerConfig;
use context::AppContext;
use error::PortalResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> PortalResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admissions_portal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
