use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use validator::Validate;

use crate::{
    dto::{
        game::{GameRequest, GameResponse},
        validation::BLANK_MESSAGE,
    },
    error::{AppError, ErrorResponse, ServiceError, invalid_value_message},
    services::{game_service, retry::retry_on},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/v1/games",
    tag = "games",
    responses(
        (status = 200, description = "Every stored game", body = [GameResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
/// List all games.
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    let games = game_service::get_games(&state).await?;
    Ok(Json(games))
}

#[utoipa::path(
    get,
    path = "/v1/games/{name}",
    tag = "games",
    params(("name" = String, Path, description = "Unique game name")),
    responses(
        (status = 200, description = "Game found", body = GameResponse),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
/// Fetch one game by name.
pub async fn get_game(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    ensure_name(&name)?;
    let game = game_service::get_game(&state, &name).await?;
    Ok(Json(game))
}

#[utoipa::path(
    post,
    path = "/v1/games",
    tag = "games",
    request_body = GameRequest,
    responses(
        (status = 200, description = "Game created", body = GameResponse),
        (status = 400, description = "Game already exists", body = ErrorResponse),
        (status = 422, description = "Invalid payload", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
/// Create a game.
pub async fn create_game(
    State(state): State<SharedState>,
    Json(payload): Json<GameRequest>,
) -> Result<Json<GameResponse>, AppError> {
    payload.validate()?;
    let game = game_service::save_game(&state, &payload).await?;
    Ok(Json(game))
}

#[utoipa::path(
    put,
    path = "/v1/games",
    tag = "games",
    request_body = GameRequest,
    responses(
        (status = 200, description = "Game updated", body = GameResponse),
        (status = 404, description = "Game not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification persisted through every retry", body = ErrorResponse),
        (status = 422, description = "Invalid payload", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
/// Update the game named in the payload, retrying on concurrent modification.
pub async fn update_game(
    State(state): State<SharedState>,
    Json(payload): Json<GameRequest>,
) -> Result<Json<GameResponse>, AppError> {
    payload.validate()?;
    let state = &state;
    let payload = &payload;
    let game = retry_on(state.retry_policy(), ServiceError::is_conflict, move || {
        game_service::update_game(state, payload)
    })
    .await?;
    Ok(Json(game))
}

#[utoipa::path(
    delete,
    path = "/v1/games/{name}",
    tag = "games",
    params(("name" = String, Path, description = "Unique game name")),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification persisted through every retry", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
/// Delete a game by name, retrying on concurrent modification.
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    ensure_name(&name)?;
    let state = &state;
    let name = name.as_str();
    retry_on(state.retry_policy(), ServiceError::is_conflict, move || {
        game_service::delete_game(state, name)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest(invalid_value_message(
            "name",
            BLANK_MESSAGE,
        )));
    }
    Ok(())
}

/// Configure the `/v1/games` routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route(
            "/v1/games",
            get(list_games).post(create_game).put(update_game),
        )
        .route("/v1/games/{name}", get(get_game).delete(delete_game))
}
