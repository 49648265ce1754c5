use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_not_blank;

/// Payload used to create or update a game.
///
/// Every field may be omitted or `null` on the wire so that a missing name is
/// reported as a validation failure rather than a deserialization error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    /// Unique name of the game, must not be blank.
    #[serde(default)]
    pub name: Option<String>,
    /// ISO-8601 creation timestamp chosen by the client.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_of_creation: Option<OffsetDateTime>,
    /// Whether the game is active.
    #[serde(default)]
    pub active: Option<bool>,
}

impl GameRequest {
    /// Name carried by a request that passed validation.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl Validate for GameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(self.name.as_deref()) {
            errors.add("name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Public projection of a game. Identifier and version stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    /// Unique name of the game.
    pub name: String,
    /// Creation timestamp, always rendered in UTC.
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_of_creation: Option<OffsetDateTime>,
    /// Whether the game is active.
    pub active: Option<bool>,
}
