use dotenv::dotenv;
use ledgerdesk_core::auth::AuthConfig;
use ledgerdesk_core::config::{Config, StoreBackend};
use ledgerdesk_core::db::{create_pool, run_migrations};
use ledgerdesk_core::store::{MemoryStore, PgStore, SheetStore};
use ledgerdesk_core::{create_router, AppState};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn open_store(config: &Config) -> anyhow::Result<SheetStore> {
    match config.backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = create_pool(url, config.max_connections).await?;
            run_migrations(&pool).await?;
            Ok(SheetStore::Postgres(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => {
                    warn!("Memory store started without SEED_FILE; it is empty");
                    MemoryStore::default()
                }
            };
            Ok(SheetStore::Memory(store))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting LedgerDesk Core Server...");

    let config = Config::from_env()?;
    info!("Using {} store", config.backend);
    if config.reconcile_users.is_empty() {
        warn!("RECONCILE_USERS is empty; nobody can change reconciliations");
    }

    let store = open_store(&config).await?;

    // Create application state
    let app_state = AppState {
        store,
        auth: AuthConfig::new(&config.jwt_secret, config.reconcile_users.clone()),
    };

    // Create router
    let app = create_router(app_state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", address, e))?;

    info!("Server listening on {}", address);

    // Start the server
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
