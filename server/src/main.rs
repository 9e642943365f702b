use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wolfiefind_server::{create_router, seed, AppState, Config, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;

    if config.seed {
        if db.has_buildings()? {
            tracing::info!("Store already has buildings, skipping seed");
        } else {
            let summary = seed::seed_campus(&db)?;
            tracing::info!(
                "Seeded {} buildings, {} entrances, {} resources",
                summary.buildings,
                summary.entrances,
                summary.resources
            );
        }
    }

    let mut state = AppState::new(db);
    state.verified_threshold = config.verified_threshold;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
