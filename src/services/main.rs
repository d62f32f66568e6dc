use serde::Serialize;

/// Capabilities advertised by the health endpoint.
pub const FEATURES: [&str; 4] = ["single-check", "bulk-check", "file-upload", "export"];

/// Liveness report returned by `GET /health`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub environment: String,
    pub features: Vec<&'static str>,
}

/// Core business logic for the health endpoint.
pub fn health_status(environment: &str) -> HealthStatus {
    HealthStatus {
        status: "OK",
        message: "Keepa BSR lookup service is running",
        environment: environment.to_string(),
        features: FEATURES.to_vec(),
    }
}
