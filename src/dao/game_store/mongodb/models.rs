use mongodb::bson::{Binary, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::GameEntity;

/// Stored shape of a game. Timestamps are kept as RFC 3339 strings so the
/// sub-millisecond part supplied by clients survives a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: mongodb::bson::Uuid,
    name: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    date_of_creation: Option<OffsetDateTime>,
    #[serde(default)]
    active: Option<bool>,
    version: i32,
}

impl MongoGameDocument {
    pub fn new(id: Uuid, game: GameEntity) -> Self {
        Self {
            id: mongodb::bson::Uuid::from_bytes(id.into_bytes()),
            name: game.name,
            date_of_creation: game.date_of_creation,
            active: game.active,
            version: game.version,
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: Some(Uuid::from_bytes(value.id.bytes())),
            name: value.name,
            date_of_creation: value.date_of_creation,
            active: value.active,
            version: value.version,
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

/// Filter matching a game only while it still carries `version`.
pub fn doc_id_at_version(id: Uuid, version: i32) -> Document {
    doc! {"_id": uuid_as_binary(id), "version": version}
}
