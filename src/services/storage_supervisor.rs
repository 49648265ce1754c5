use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep the shared state in degraded mode while it is unavailable.
///
/// Once connected, the store is polled every few seconds. A failed poll flips the
/// state to degraded and triggers in-place reconnects; when those run out, the
/// store is dropped and `connect` is called again with exponential backoff.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_game_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_store(&state, store.as_ref()).await;

                state.clear_game_store().await;
                warn!("exhausted storage reconnect attempts; staying in degraded mode");
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll `store` until it stays unreachable after [`MAX_RECONNECT_ATTEMPTS`] reconnects.
async fn watch_store(state: &SharedState, store: &dyn GameStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true);
                if !reconnect(store).await {
                    return;
                }
                info!("storage reconnection succeeded after health check failure");
                state.update_degraded(false);
            }
        }

        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(store: &dyn GameStore) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(reconnect_delay).await;
                reconnect_delay = next_delay(reconnect_delay);
            }
        }
    }

    false
}

fn next_delay(current: Duration) -> Duration {
    (current * 2).min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState,
    };

    #[test]
    fn backoff_is_capped() {
        assert_eq!(next_delay(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(8)), MAX_DELAY);
    }

    #[tokio::test]
    async fn installs_the_connected_store() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();

        let supervisor = tokio::spawn(run(state.clone(), || async {
            Ok(Arc::new(MemoryGameStore::new()) as Arc<dyn GameStore>)
        }));

        watcher.changed().await.unwrap();
        assert!(!*watcher.borrow());
        assert!(state.game_store().await.is_some());

        supervisor.abort();
    }
}
