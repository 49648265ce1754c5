//! CouchDB backed store. Each game lives in a document keyed by its name, so
//! CouchDB itself rejects a second game with the same name, and its `_rev`
//! check rejects writes based on a stale read.

mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchGameStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
