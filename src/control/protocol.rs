//! Wire types for the control-plane ping/stop protocol.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PingRequest {
    pub secret: String,
    pub port: u16,
    pub disk_space: u64,
    pub network_speed: u64,
    pub build_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PingResponse {
    pub image_server: String,
    #[serde(default)]
    pub tls: Option<TlsMaterial>,
}

#[derive(Debug, Deserialize)]
pub struct TlsMaterial {
    pub created_at: String,
    pub certificate: String,
    pub private_key: String,
}

#[derive(Debug, Serialize)]
pub struct StopRequest {
    pub secret: String,
}
