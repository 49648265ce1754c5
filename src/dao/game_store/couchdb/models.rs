use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::GameEntity;

pub const GAME_PREFIX: &str = "game::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Result of a Mango `_find` query.
#[derive(Debug, Deserialize)]
pub struct FindResponse {
    pub docs: Vec<CouchGameDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub doc_id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub date_of_creation: Option<OffsetDateTime>,
    #[serde(default)]
    pub active: Option<bool>,
    pub version: i32,
}

impl CouchGameDocument {
    pub fn new(id: Uuid, game: GameEntity, rev: Option<String>) -> Self {
        Self {
            doc_id: game_doc_id(&game.name),
            rev,
            id,
            name: game.name,
            date_of_creation: game.date_of_creation,
            active: game.active,
            version: game.version,
        }
    }
}

impl From<CouchGameDocument> for GameEntity {
    fn from(doc: CouchGameDocument) -> Self {
        Self {
            id: Some(doc.id),
            name: doc.name,
            date_of_creation: doc.date_of_creation,
            active: doc.active,
            version: doc.version,
        }
    }
}

pub fn game_doc_id(name: &str) -> String {
    format!("{GAME_PREFIX}{name}")
}

/// Name of the Mango index on the game identifier.
pub const ID_INDEX_NAME: &str = "game-id-idx";

/// Body of the `_index` request creating [`ID_INDEX_NAME`].
pub fn id_index_definition() -> Value {
    json!({
        "index": { "fields": ["id"] },
        "name": ID_INDEX_NAME,
        "type": "json",
    })
}

/// Mango query selecting the single document of game `id` through [`ID_INDEX_NAME`].
pub fn find_by_id_query(id: Uuid) -> Value {
    json!({
        "selector": { "id": id },
        "use_index": ID_INDEX_NAME,
        "limit": 1,
    })
}
