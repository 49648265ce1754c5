/// OpenAPI documentation generation.
pub mod documentation;
/// Game catalogue operations on top of the storage backend.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Bounded retry for operations that lose an optimistic-lock race.
pub mod retry;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
