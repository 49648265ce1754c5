use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoGameDocument, doc_id_at_version},
};
use crate::dao::{
    game_store::GameStore,
    models::GameEntity,
    storage::{StorageError, StorageResult},
};

const GAME_COLLECTION_NAME: &str = "games";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed [`GameStore`] implementation.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept alive alongside the database handle it produced.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Outcome of a version-checked write, before it is turned into a storage error.
enum Write<T> {
    Applied(T),
    Rejected(StorageError),
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_name_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "name",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn find_by_name(&self, name: String) -> MongoResult<Option<GameEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc! {"name": &name})
            .await
            .map_err(|source| MongoDaoError::LoadGame { name, source })?;

        Ok(document.map(Into::into))
    }

    async fn find_all(&self) -> MongoResult<Vec<GameEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoGameDocument> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, mut game: GameEntity) -> MongoResult<Write<GameEntity>> {
        let id = Uuid::new_v4();
        game.id = Some(id);
        game.version = 0;

        let document = MongoGameDocument::new(id, game.clone());
        let collection = self.collection().await;
        match collection.insert_one(&document).await {
            Ok(_) => Ok(Write::Applied(game)),
            Err(err) if is_duplicate_key(&err) => {
                Ok(Write::Rejected(StorageError::duplicate(game.name)))
            }
            Err(source) => Err(MongoDaoError::InsertGame {
                name: game.name,
                source,
            }),
        }
    }

    /// Replace the document only while it still carries the version the caller read.
    async fn update(&self, id: Uuid, game: GameEntity) -> MongoResult<Write<GameEntity>> {
        let expected = game.version;
        let mut next = game;
        next.version = expected + 1;

        let replacement = MongoGameDocument::new(id, next.clone());
        let collection = self.collection().await;
        let result = match collection
            .replace_one(doc_id_at_version(id, expected), &replacement)
            .await
        {
            Ok(result) => result,
            Err(err) if is_duplicate_key(&err) => {
                return Ok(Write::Rejected(StorageError::duplicate(next.name)));
            }
            Err(source) => return Err(MongoDaoError::UpdateGame { id, source }),
        };

        if result.matched_count == 0 {
            debug!(%id, expected, "version check rejected MongoDB update");
            return Ok(Write::Rejected(StorageError::conflict(id, expected)));
        }

        Ok(Write::Applied(next))
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> MongoResult<Write<()>> {
        let collection = self.collection().await;
        let result = collection
            .delete_one(doc_id_at_version(id, expected_version))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;

        if result.deleted_count == 0 {
            debug!(%id, expected_version, "version check rejected MongoDB delete");
            return Ok(Write::Rejected(StorageError::conflict(id, expected_version)));
        }

        Ok(Write::Applied(()))
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

fn settle<T>(outcome: MongoResult<Write<T>>) -> StorageResult<T> {
    match outcome? {
        Write::Applied(value) => Ok(value),
        Write::Rejected(err) => Err(err),
    }
}

impl GameStore for MongoGameStore {
    fn find_by_name(&self, name: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_name(name).await.map_err(Into::into) })
    }

    fn find_all(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_all().await.map_err(Into::into) })
    }

    fn save(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            match game.id {
                Some(id) => settle(store.update(id, game).await),
                None => settle(store.insert(game).await),
            }
        })
    }

    fn delete_by_id(
        &self,
        id: Uuid,
        expected_version: i32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { settle(store.delete(id, expected_version).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
