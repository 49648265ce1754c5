#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::GameEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for games.
///
/// Writes are optimistic: `save` on an existing record and `delete_by_id` both
/// compare the caller's version with the stored one and fail with
/// [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict) on mismatch.
pub trait GameStore: Send + Sync {
    /// Look a game up by its unique name.
    fn find_by_name(&self, name: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Return every stored game in storage order.
    fn find_all(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Insert a game without identifier, or compare-and-swap an existing one.
    ///
    /// Returns the stored state, including the assigned identifier and the new version.
    fn save(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Remove a game, provided its stored version still equals `expected_version`.
    fn delete_by_id(&self, id: Uuid, expected_version: i32)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
