//! Hockey Stats Back binary entrypoint wiring REST, SSE and the selected storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hockey_stats_back::{
    config::AppConfig,
    dao::{
        stats_store::{StatsStore, memory::MemoryStatsStore},
        storage::StorageError,
    },
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| default_backend().into());

    let app_state = start_storage(&backend, config).await?;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, %backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn default_backend() -> &'static str {
    if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    }
}

/// Build the shared state and, for remote backends, hand the connection to the
/// storage supervisor which keeps degraded mode in sync.
async fn start_storage(backend: &str, config: AppConfig) -> anyhow::Result<SharedState> {
    match backend {
        "memory" => {
            warn!("using the in-memory store; data is lost on restart");
            let store: Arc<dyn StatsStore> = Arc::new(MemoryStatsStore::new());
            Ok(AppState::with_store(config, store).await)
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            use hockey_stats_back::dao::stats_store::mongodb::{MongoConfig, MongoStatsStore};
            use hockey_stats_back::services::storage_supervisor;

            let mongo = MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            let state = AppState::new(config);
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let mongo = mongo.clone();
                async move {
                    let store = MongoStatsStore::connect(mongo).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn StatsStore>)
                }
            }));
            Ok(state)
        }
        #[cfg(feature = "rest-store")]
        "rest" => {
            use hockey_stats_back::dao::stats_store::rest::{RestConfig, RestStatsStore};
            use hockey_stats_back::services::storage_supervisor;

            let rest = RestConfig::from_env().context("reading REST store configuration")?;
            let state = AppState::new(config);
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let rest = rest.clone();
                async move {
                    let store = RestStatsStore::connect(rest).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn StatsStore>)
                }
            }));
            Ok(state)
        }
        other => bail!("unsupported STORAGE_BACKEND `{other}`"),
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
