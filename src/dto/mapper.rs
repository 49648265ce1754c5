//! Translation between wire payloads and the persisted [`GameEntity`].

use time::{OffsetDateTime, UtcOffset};

use crate::{
    dao::models::GameEntity,
    dto::game::{GameRequest, GameResponse},
};

/// Build a not-yet-persisted entity from a validated request.
pub fn request_to_entity(request: &GameRequest) -> GameEntity {
    GameEntity::new(
        request.name().to_owned(),
        normalize(request.date_of_creation),
        request.active,
    )
}

/// Overwrite the mutable fields of a stored entity, keeping its id and version.
pub fn apply_request(entity: &mut GameEntity, request: &GameRequest) {
    entity.name = request.name().to_owned();
    entity.date_of_creation = normalize(request.date_of_creation);
    entity.active = request.active;
}

/// Timestamps are stored as UTC instants whatever offset the client used.
fn normalize(timestamp: Option<OffsetDateTime>) -> Option<OffsetDateTime> {
    timestamp.map(|value| value.to_offset(UtcOffset::UTC))
}

impl From<GameEntity> for GameResponse {
    fn from(entity: GameEntity) -> Self {
        Self {
            name: entity.name,
            date_of_creation: entity.date_of_creation,
            active: entity.active,
        }
    }
}
