//! Game provider binary entrypoint wiring configuration, storage, and the REST layer.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use game_provider_service::{
    config::{AppConfig, StorageBackend},
    dao::game_store::memory::MemoryGameStore,
    routes,
    services::health_service,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);
    tokio::spawn(health_service::log_degraded_transitions(app_state.clone()));

    start_storage(&app_state).await?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the configured backend. Remote backends are connected by the
/// storage supervisor in the background; until then the state stays degraded.
async fn start_storage(state: &SharedState) -> anyhow::Result<()> {
    let backend = state.config().storage();
    info!(?backend, "selecting storage backend");

    match backend {
        StorageBackend::Memory => {
            state
                .install_game_store(Arc::new(MemoryGameStore::new()))
                .await;
        }
        StorageBackend::Mongo => spawn_mongo_supervisor(state)?,
        StorageBackend::Couch => spawn_couch_supervisor(state)?,
    }

    Ok(())
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: &SharedState) -> anyhow::Result<()> {
    use game_provider_service::{
        dao::{
            game_store::{
                GameStore,
                mongodb::{MongoConfig, MongoGameStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = MongoConfig::from_env().await?;
        let store = MongoGameStore::connect(config).await?;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo_supervisor(_state: &SharedState) -> anyhow::Result<()> {
    anyhow::bail!("storage backend `mongo` requires the `mongo-store` feature")
}

#[cfg(feature = "couch-store")]
fn spawn_couch_supervisor(state: &SharedState) -> anyhow::Result<()> {
    use game_provider_service::{
        dao::{
            game_store::{
                GameStore,
                couchdb::{CouchConfig, CouchGameStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = CouchConfig::from_env()?;
        let store = CouchGameStore::connect(config).await?;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
    }));
    Ok(())
}

#[cfg(not(feature = "couch-store"))]
fn spawn_couch_supervisor(_state: &SharedState) -> anyhow::Result<()> {
    anyhow::bail!("storage backend `couch` requires the `couch-store` feature")
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
