use anyhow::Result;
use api::{
    AppState,
    config::{ExpiryConfig, PaymentConfig},
    routes,
    scheduler::PendingBookingSweeper,
};
use common::{
    database::{DatabaseConfig, health_check, init_pool},
    server::ServerConfig,
    token::JwtConfig,
};
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

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let jwt_config = JwtConfig::from_env()?;
    let payment_config = PaymentConfig::from_env()?;
    let app_state = AppState::new(pool, &jwt_config, payment_config);

    // Expire abandoned pending bookings in the background
    let expiry = ExpiryConfig::from_env();
    let sweeper = PendingBookingSweeper::new(app_state.booking_repository.clone(), &expiry);
    let _scheduler = sweeper.start(&expiry.schedule).await?;

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let server = ServerConfig::from_env("API_BIND_ADDR", "0.0.0.0:3001");
    let listener = TcpListener::bind(&server.bind_addr).await?;
    info!("API service listening on {}", server.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
