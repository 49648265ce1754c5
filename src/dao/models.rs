use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Game record persisted by the storage layer.
///
/// A record without `id` has never been stored: saving it inserts a new row and
/// assigns both the identifier and the initial version. A record with an `id`
/// is an update, and `version` is the value the caller read before modifying it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// System assigned identifier, `None` until first saved.
    pub id: Option<Uuid>,
    /// Unique business key.
    pub name: String,
    /// Client supplied creation timestamp.
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_of_creation: Option<OffsetDateTime>,
    /// Whether the game is currently active.
    pub active: Option<bool>,
    /// Concurrency token, starts at 0 and grows by one per write.
    pub version: i32,
}

impl GameEntity {
    /// Build a record that has not been persisted yet.
    pub fn new(name: String, date_of_creation: Option<OffsetDateTime>, active: Option<bool>) -> Self {
        Self {
            id: None,
            name,
            date_of_creation,
            active,
            version: 0,
        }
    }
}
