use tracing::{debug, info};

use crate::{
    dao::{game_store::GameStore, models::GameEntity},
    dto::{
        game::{GameRequest, GameResponse},
        mapper,
    },
    error::ServiceError,
    state::SharedState,
};

/// Create a game, refusing names that are already taken.
pub async fn save_game(
    state: &SharedState,
    request: &GameRequest,
) -> Result<GameResponse, ServiceError> {
    let name = request.name();
    info!(name, "save the game");
    let store = state.require_game_store().await?;

    if store
        .find_by_name(name.to_owned())
        .await
        .map_err(|err| ServiceError::from_storage(name, err))?
        .is_some()
    {
        return Err(ServiceError::AlreadyExists(name.to_owned()));
    }

    let saved = store
        .save(mapper::request_to_entity(request))
        .await
        .map_err(|err| ServiceError::from_storage(name, err))?;
    debug!(name, id = ?saved.id, "game created");
    Ok(saved.into())
}

/// Fetch a single game by name.
pub async fn get_game(state: &SharedState, name: &str) -> Result<GameResponse, ServiceError> {
    info!(name, "get the game");
    let store = state.require_game_store().await?;
    load(store.as_ref(), name).await.map(Into::into)
}

/// List every stored game.
pub async fn get_games(state: &SharedState) -> Result<Vec<GameResponse>, ServiceError> {
    info!("get all games");
    let store = state.require_game_store().await?;
    // Listing never writes, so the only failure is an unreachable backend.
    let games = store.find_all().await.map_err(ServiceError::Unavailable)?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// Overwrite the mutable fields of the game named in the request.
///
/// Every call re-reads the current row, so a caller retrying after
/// [`ServiceError::Conflict`] works against the latest committed version.
pub async fn update_game(
    state: &SharedState,
    request: &GameRequest,
) -> Result<GameResponse, ServiceError> {
    let name = request.name();
    info!(name, "update the game");
    let store = state.require_game_store().await?;

    let mut game = load(store.as_ref(), name).await?;
    let read_version = game.version;
    mapper::apply_request(&mut game, request);

    let saved = store
        .save(game)
        .await
        .map_err(|err| ServiceError::from_storage(name, err))?;
    debug!(name, from = read_version, to = saved.version, "game updated");
    Ok(saved.into())
}

/// Remove the game with the given name, provided nobody changed it since it was read.
pub async fn delete_game(state: &SharedState, name: &str) -> Result<(), ServiceError> {
    info!(name, "delete the game");
    let store = state.require_game_store().await?;

    let game = load(store.as_ref(), name).await?;
    let Some(id) = game.id else {
        return Err(ServiceError::NotFound(name.to_owned()));
    };

    store
        .delete_by_id(id, game.version)
        .await
        .map_err(|err| ServiceError::from_storage(name, err))
}

async fn load(store: &dyn GameStore, name: &str) -> Result<GameEntity, ServiceError> {
    store
        .find_by_name(name.to_owned())
        .await
        .map_err(|err| ServiceError::from_storage(name, err))?
        .ok_or_else(|| ServiceError::NotFound(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState,
    };

    async fn ready_state() -> (SharedState, MemoryGameStore) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::new();
        state.install_game_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn request(name: &str, active: bool) -> GameRequest {
        GameRequest {
            name: Some(name.into()),
            date_of_creation: Some(datetime!(2024-01-15 10:30 UTC)),
            active: Some(active),
        }
    }

    #[tokio::test]
    async fn save_then_get_returns_the_game() {
        let (state, _) = ready_state().await;

        let created = save_game(&state, &request("Zelda", false)).await.unwrap();
        assert_eq!(created.name, "Zelda");

        let fetched = get_game(&state, "Zelda").await.unwrap();
        assert_eq!(fetched.active, Some(false));
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_without_mutation() {
        let (state, store) = ready_state().await;
        save_game(&state, &request("Zelda", false)).await.unwrap();

        let err = save_game(&state, &request("Zelda", true)).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(ref name) if name == "Zelda"));

        let stored = GameStore::find_by_name(&store, "Zelda".into()).await.unwrap().unwrap();
        assert_eq!(stored.active, Some(false));
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn update_bumps_version_by_one() {
        let (state, store) = ready_state().await;
        save_game(&state, &request("Zelda", false)).await.unwrap();

        let updated = update_game(&state, &request("Zelda", true)).await.unwrap();
        assert_eq!(updated.active, Some(true));

        let stored = GameStore::find_by_name(&store, "Zelda".into()).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn missing_games_are_not_found() {
        let (state, _) = ready_state().await;

        assert!(matches!(
            get_game(&state, "Nope").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            update_game(&state, &request("Nope", true)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_game(&state, "Nope").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_game() {
        let (state, _) = ready_state().await;
        save_game(&state, &request("Zelda", false)).await.unwrap();

        delete_game(&state, "Zelda").await.unwrap();
        assert!(get_games(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn degraded_state_refuses_every_operation() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            get_games(&state).await,
            Err(ServiceError::Degraded)
        ));
    }
}
