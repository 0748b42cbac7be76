use erc20_gateway_core::api::{self, AppState};
use erc20_gateway_core::config::load_config;
use erc20_gateway_core::parser::parse_address;
use erc20_gateway_core::session::TokenSession;
use erc20_gateway_core::token::{AlloyTokenFactory, TokenFactory};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // -------------------------------
    // Load configuration
    // -------------------------------
    let config = load_config().expect("Failed to load configuration");

    // -------------------------------
    // Initialize Tracing / Logging
    // -------------------------------
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", &config.rust_log);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ERC20 gateway initialized with config: {:?}", config);

    // -------------------------------
    // Blockchain client
    // -------------------------------
    let factory = AlloyTokenFactory::connect(&config.rpc_settings())
        .expect("Invalid blockchain client settings");
    tracing::info!(operator = %factory.operator(), rpc = %config.eth_rpc_url, "Operator account ready");
    if config.uses_dev_key() {
        tracing::warn!("Using the well-known development operator key; do not use it outside a local node");
    }

    let state = Arc::new(AppState::new(Arc::new(factory)));

    if let Some(raw) = config.contract_address.as_deref().filter(|s| !s.trim().is_empty()) {
        match parse_address("contract_address", raw) {
            Ok(address) => match state.factory.load(address).await {
                Ok(client) => {
                    state.sessions.replace(TokenSession::new(client)).await;
                }
                Err(e) => tracing::error!(%address, "Could not load configured contract: {}", e),
            },
            Err(e) => tracing::error!("{}", e),
        }
    }

    // -------------------------------
    // Run Server
    // -------------------------------
    let app = api::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
