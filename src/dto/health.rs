use serde::Serialize;
use utoipa::ToSchema;

/// Whether the service currently has a working storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Storage is installed and answered its last health check.
    Ok,
    /// No storage backend is available; game routes answer 503.
    Degraded,
}

/// Payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Storage availability.
    pub status: HealthStatus,
}

impl From<bool> for HealthResponse {
    fn from(degraded: bool) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status }
    }
}
