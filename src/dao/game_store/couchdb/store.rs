use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::debug;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::GameEntity,
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchGameDocument, END_SUFFIX, FindResponse, GAME_PREFIX,
        find_by_id_query, game_doc_id, id_index_definition,
    },
};

const ALL_DOCS: &str = "_all_docs";
const FIND: &str = "_find";
const INDEX: &str = "_index";

/// Whether CouchDB applied a write or refused it because of a revision clash.
enum Write {
    Applied,
    RevisionConflict,
}

/// CouchDB-backed [`GameStore`] implementation.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    database_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let database_url = database_url(&config.base_url, &config.database)?;
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            database_url: Arc::new(database_url),
            database: Arc::from(config.database),
            auth,
        };

        store.ensure_database().await?;
        store.ensure_id_index().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    /// Build a request for `path` relative to the database, percent-encoding it as one segment.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut url = (*self.database_url).clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(path);
        }
        self.with_auth(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = (*self.database_url).clone();

        let response = self
            .with_auth(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412: another instance created it first.
                if create.status().is_success()
                    || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    /// Mango index backing [`Self::find_by_id`]; CouchDB answers `exists` when already present.
    async fn ensure_id_index(&self) -> CouchResult<()> {
        let response = self
            .request(Method::POST, INDEX)
            .json(&id_index_definition())
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: INDEX.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: INDEX.to_string(),
                status: response.status(),
            });
        }
        Ok(())
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<Write>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(Write::RevisionConflict),
            status if status.is_success() => Ok(Write::Applied),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<Write> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            // A concurrent delete already removed this revision.
            StatusCode::CONFLICT | StatusCode::NOT_FOUND => Ok(Write::RevisionConflict),
            status if status.is_success() => Ok(Write::Applied),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    async fn find_by_id(&self, id: Uuid) -> CouchResult<Option<CouchGameDocument>> {
        let query = find_by_id_query(id);

        let response = self
            .request(Method::POST, FIND)
            .json(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: FIND.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: FIND.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<FindResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: FIND.to_string(),
                source,
            }
        })?;

        Ok(payload.docs.into_iter().next())
    }

    async fn insert(&self, mut game: GameEntity) -> StorageResult<GameEntity> {
        let id = Uuid::new_v4();
        game.id = Some(id);
        game.version = 0;

        let doc = CouchGameDocument::new(id, game.clone(), None);
        match self.put_document(&doc.doc_id, &doc).await? {
            Write::Applied => Ok(game),
            Write::RevisionConflict => Err(StorageError::duplicate(game.name)),
        }
    }

    async fn update(&self, id: Uuid, game: GameEntity) -> StorageResult<GameEntity> {
        let expected = game.version;
        let doc_id = game_doc_id(&game.name);
        let current = self.get_document::<CouchGameDocument>(&doc_id).await?;
        let current = ensure_current(current, id, expected)?;

        let mut next = game;
        next.version = expected + 1;
        let doc = CouchGameDocument::new(id, next.clone(), current.rev);
        match self.put_document(&doc_id, &doc).await? {
            Write::Applied => Ok(next),
            Write::RevisionConflict => Err(StorageError::conflict(id, expected)),
        }
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> StorageResult<()> {
        let Some(current) = self.find_by_id(id).await? else {
            return Err(StorageError::conflict(id, expected_version));
        };
        let (true, Some(rev)) = (current.version == expected_version, current.rev.as_deref())
        else {
            debug!(%id, expected_version, actual = current.version, "stale CouchDB delete");
            return Err(StorageError::conflict(id, expected_version));
        };

        match self.delete_document(&current.doc_id, rev).await? {
            Write::Applied => Ok(()),
            Write::RevisionConflict => Err(StorageError::conflict(id, expected_version)),
        }
    }
}

/// Accept the stored document only if it is still the game `id` at version `expected`.
///
/// A missing document or one owned by another id means the game was deleted
/// (and maybe recreated under the same name) after the caller read it.
fn ensure_current(
    current: Option<CouchGameDocument>,
    id: Uuid,
    expected: i32,
) -> StorageResult<CouchGameDocument> {
    match current {
        Some(doc) if doc.id == id && doc.version == expected => Ok(doc),
        Some(doc) => {
            debug!(%id, expected, found = %doc.id, actual = doc.version, "stale CouchDB update");
            Err(StorageError::conflict(id, expected))
        }
        None => Err(StorageError::conflict(id, expected)),
    }
}

fn database_url(base_url: &str, database: &str) -> CouchResult<Url> {
    let invalid = |reason: String| CouchDaoError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason,
    };

    let mut url =
        Url::parse(base_url.trim_end_matches('/')).map_err(|err| invalid(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be a base".into()))?
        .pop_if_empty()
        .push(database);
    Ok(url)
}

impl GameStore for CouchGameStore {
    fn find_by_name(&self, name: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchGameDocument>(&game_doc_id(&name))
                .await?;
            Ok(maybe_doc.map(Into::into))
        })
    }

    fn find_all(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchGameDocument>(GAME_PREFIX)
                .await?;
            Ok(docs.into_iter().map(Into::into).collect())
        })
    }

    fn save(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            match game.id {
                Some(id) => store.update(id, game).await,
                None => store.insert(game).await,
            }
        })
    }

    fn delete_by_id(
        &self,
        id: Uuid,
        expected_version: i32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete(id, expected_version).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = (*store.database_url).clone();
            let path = url.to_string();
            let response = store
                .with_auth(store.client.get(url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: path.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_database().await?;
            store.ensure_id_index().await?;
            Ok(())
        })
    }
}
