use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use checkin_server::config::Config;
use checkin_server::repository::PgStore;
use checkin_server::routes::create_routes;
use checkin_server::services::identity::HttpIdentityProvider;
use checkin_server::services::token::TokenCodec;
use checkin_server::state::AppState;
use checkin_server::utils::clock::SystemClock;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "Configuration loaded");

    let codec = TokenCodec::new(&config.qr_signing_secret).expect("QR signing secret rejected");
    let identity = HttpIdentityProvider::new(
        &config.identity_provider_url,
        config.identity_provider_api_key.clone(),
        config.request_timeout,
    )
    .expect("Failed to build identity provider client");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    if config.run_migrations {
        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        tracing::info!("Migrations run successfully");
    }

    let state = AppState::new(
        codec,
        Arc::new(identity),
        PgStore::new(pool),
        Arc::new(SystemClock),
        config.request_timeout,
    );
    let app: Router = create_routes(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Check-in server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
