use axum::serve;
use relation_sync::api::routes::create_router;
use relation_sync::build_registry;
use relation_sync::config::AppConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}, store={:?}",
        config.server_address(),
        config.sync.store
    );

    let registry = build_registry(&config).await?;
    for extra in registry.descriptors() {
        log::info!("Serving extra '{}' at /extras/{}", extra.name, extra.id);
    }

    let app = create_router().with_state(Arc::new(registry));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("relation-sync listening on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
