use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the game provider service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::list_games,
        crate::routes::game::get_game,
        crate::routes::game::create_game,
        crate::routes::game::update_game,
        crate::routes::game::delete_game,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::GameRequest,
            crate::dto::game::GameResponse,
            crate::error::ErrorResponse,
            crate::error::ErrorEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Game catalogue CRUD operations"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_game_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/healthcheck"));
        assert!(paths.contains_key("/v1/games"));
        assert!(paths.contains_key("/v1/games/{name}"));
    }
}
