use tracing::{info, warn};

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether game routes can currently reach storage, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_game_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::from(true);
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::from(state.is_degraded())
}

/// Log every degraded mode transition until the state is dropped.
pub async fn log_degraded_transitions(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    drop(state);

    while watcher.changed().await.is_ok() {
        if *watcher.borrow_and_update() {
            warn!("service entered degraded mode; game routes answer 503");
        } else {
            info!("service left degraded mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, dto::health::HealthStatus,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn transition_logger_stops_with_the_state() {
        let state = AppState::new(AppConfig::default());
        let logger = tokio::spawn(log_degraded_transitions(state.clone()));

        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state.clear_game_store().await;
        drop(state);

        logger.await.unwrap();
    }

    #[tokio::test]
    async fn reports_ok_with_healthy_store() {
        let state = AppState::new(AppConfig::default());
        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
