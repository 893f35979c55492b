//! Control-plane heartbeat client.
//!
//! Runs the ping/stop protocol against the configured control URL: a
//! synchronous first call at startup (so the node never accepts traffic
//! before it has an origin to serve from), then a 45-second background
//! loop that survives individual request-handling failures and exits only
//! once [`NodeState::is_running`] goes false.

pub mod protocol;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{BUILD_VERSION, SettingsSource};
use crate::error::ControlError;
use crate::node::NodeState;
use crate::node::OriginSnapshot;

use protocol::{PingRequest, PingResponse, StopRequest};

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(45);

pub struct ControlClient {
    http: reqwest::Client,
    settings: Arc<dyn SettingsSource>,
    node: Arc<NodeState>,
    tls_cert_path: std::path::PathBuf,
    tls_key_path: std::path::PathBuf,
}

impl ControlClient {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        node: Arc<NodeState>,
        tls_cert_path: std::path::PathBuf,
        tls_key_path: std::path::PathBuf,
    ) -> Result<Self, ControlError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ControlError::Transport)?;
        Ok(Self {
            http,
            settings,
            node,
            tls_cert_path,
            tls_key_path,
        })
    }

    /// Performs a single heartbeat: re-reads settings (so edits made since
    /// startup propagate), posts the ping, and applies whatever the control
    /// plane returns.
    pub async fn ping_once(&self) -> Result<(), ControlError> {
        let settings = self.settings.current().await?;

        let tls_created_at = self.node.origin().tls_created_at.clone();
        let payload = PingRequest {
            secret: settings.client_secret.clone(),
            port: settings.client_port,
            disk_space: settings.reported_disk_space_bytes,
            network_speed: settings.reported_network_speed_bytes_per_sec,
            build_version: BUILD_VERSION,
            tls_created_at,
        };

        let url = format!("{}/ping", settings.control_url);
        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .header(reqwest::header::CONNECTION, "Keep-Alive")
            .header(
                reqwest::header::USER_AGENT,
                "Apache-HttpClient/4.5.12 (Java/11.0.7)",
            )
            .header(reqwest::header::ACCEPT_ENCODING, "gzip,deflate")
            .json(&payload)
            .send()
            .await
            .map_err(ControlError::Transport)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "heartbeat rejected by control plane");
            return Ok(());
        }

        let body: PingResponse = response.json().await.map_err(ControlError::Transport)?;
        self.apply(body).await;
        Ok(())
    }

    async fn apply(&self, body: PingResponse) {
        let tls_created_at = match &body.tls {
            Some(material) => {
                if let Err(err) = self.rotate_tls_material(material).await {
                    error!(%err, "failed to persist rotated TLS material");
                }
                Some(material.created_at.clone())
            }
            None => self.node.origin().tls_created_at.clone(),
        };

        self.node.set_origin(OriginSnapshot {
            origin_url: body.image_server,
            tls_created_at,
        });
    }

    async fn rotate_tls_material(
        &self,
        material: &protocol::TlsMaterial,
    ) -> Result<(), std::io::Error> {
        write_then_rename(&self.tls_cert_path, material.certificate.as_bytes()).await?;

        let mut key_bytes = material.private_key.clone().into_bytes();
        let result = write_then_rename(&self.tls_key_path, &key_bytes).await;
        key_bytes.iter_mut().for_each(|b| *b = 0);

        result
    }

    /// Sends the stop notification. Best-effort: failures are logged, not
    /// propagated, since shutdown proceeds regardless.
    pub async fn notify_stop(&self, client_secret: &str, control_url: &str) {
        let url = format!("{control_url}/stop");
        let result = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&StopRequest {
                secret: client_secret.to_string(),
            })
            .send()
            .await;

        if let Err(err) = result {
            warn!(%err, "failed to notify control plane of shutdown");
        }
    }

    /// Runs the background heartbeat loop. Exits once `node.is_running()`
    /// is false; the caller is expected to have already performed the
    /// initial synchronous heartbeat.
    pub async fn run_heartbeat_loop(self: Arc<Self>) {
        loop {
            tokio::time::sleep(HEARTBEAT_PERIOD).await;
            if !self.node.is_running() {
                return;
            }
            if let Err(err) = self.ping_once().await {
                warn!(%err, "heartbeat failed, keeping previous settings");
            } else {
                info!("heartbeat ok");
            }
        }
    }
}

async fn write_then_rename(path: &std::path::Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}
