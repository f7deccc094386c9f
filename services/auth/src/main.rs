use anyhow::Result;
use auth::{AppState, bootstrap::BootstrapAdmin, rate_limiter::RateLimiterConfig, routes};
use common::{database, server::ServerConfig, token::JwtConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let jwt_config = JwtConfig::from_env()?;
    let app_state = AppState::new(pool, jwt_config, RateLimiterConfig::default());

    if let Some(admin) = BootstrapAdmin::from_env()? {
        admin.ensure(&app_state.user_repository).await?;
    }

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let server = ServerConfig::from_env("AUTH_BIND_ADDR", "0.0.0.0:3000");
    let listener = TcpListener::bind(&server.bind_addr).await?;
    info!("Authentication service listening on {}", server.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
