//! In-process [`GameStore`] used for local runs and tests.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::GameEntity,
    storage::{StorageError, StorageResult},
};

/// Concurrent map backed store.
///
/// Lock order is always `names` before `games`, and no guard on `games` is held
/// while touching `names`.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, StoredGame>,
    names: DashMap<String, Uuid>,
    sequence: AtomicU64,
}

struct StoredGame {
    sequence: u64,
    game: GameEntity,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, name: &str) -> Option<GameEntity> {
        let id = *self.inner.names.get(name)?;
        self.inner.games.get(&id).map(|stored| stored.game.clone())
    }

    fn ordered(&self) -> Vec<GameEntity> {
        let mut stored = self
            .inner
            .games
            .iter()
            .map(|entry| (entry.sequence, entry.game.clone()))
            .collect::<Vec<_>>();
        stored.sort_by_key(|(sequence, _)| *sequence);
        stored.into_iter().map(|(_, game)| game).collect()
    }

    fn insert(&self, mut game: GameEntity) -> StorageResult<GameEntity> {
        match self.inner.names.entry(game.name.clone()) {
            Entry::Occupied(_) => Err(StorageError::duplicate(game.name)),
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                game.id = Some(id);
                game.version = 0;
                let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
                self.inner.games.insert(
                    id,
                    StoredGame {
                        sequence,
                        game: game.clone(),
                    },
                );
                slot.insert(id);
                Ok(game)
            }
        }
    }

    fn update(&self, id: Uuid, game: GameEntity) -> StorageResult<GameEntity> {
        let owner = self.inner.names.get(&game.name).map(|owner| *owner);
        if owner.is_some_and(|owner| owner != id) {
            // Name taken by another row: a rename clash only if our row is still current.
            let current = self
                .inner
                .games
                .get(&id)
                .is_some_and(|stored| stored.game.version == game.version);
            return Err(if current {
                StorageError::duplicate(game.name)
            } else {
                StorageError::conflict(id, game.version)
            });
        }

        let (saved, previous_name) = {
            let Some(mut stored) = self.inner.games.get_mut(&id) else {
                return Err(StorageError::conflict(id, game.version));
            };
            if stored.game.version != game.version {
                return Err(StorageError::conflict(id, game.version));
            }

            let previous_name = std::mem::replace(&mut stored.game.name, game.name);
            stored.game.date_of_creation = game.date_of_creation;
            stored.game.active = game.active;
            stored.game.version += 1;
            (stored.game.clone(), previous_name)
        };

        if previous_name != saved.name {
            self.inner
                .names
                .remove_if(&previous_name, |_, owner| *owner == id);
            self.inner.names.insert(saved.name.clone(), id);
        }

        Ok(saved)
    }

    fn delete(&self, id: Uuid, expected_version: i32) -> StorageResult<()> {
        let removed = self
            .inner
            .games
            .remove_if(&id, |_, stored| stored.game.version == expected_version);

        match removed {
            Some((_, stored)) => {
                self.inner
                    .names
                    .remove_if(&stored.game.name, |_, owner| *owner == id);
                Ok(())
            }
            None => Err(StorageError::conflict(id, expected_version)),
        }
    }
}

impl GameStore for MemoryGameStore {
    fn find_by_name(&self, name: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lookup(&name)) })
    }

    fn find_all(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ordered()) })
    }

    fn save(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            match game.id {
                Some(id) => store.update(id, game),
                None => store.insert(game),
            }
        })
    }

    fn delete_by_id(
        &self,
        id: Uuid,
        expected_version: i32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete(id, expected_version) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
