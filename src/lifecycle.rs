//! Startup and graceful-shutdown sequencing.
//!
//! Startup order matters: settings are read, one heartbeat runs
//! synchronously (so the node has an origin and current TLS material
//! before it ever accepts traffic), then the background heartbeat loop and
//! the request listener start together.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};

use crate::cache::Cache;
use crate::config::Settings;
use crate::config::SettingsSource;
use crate::control::ControlClient;
use crate::dispatcher::{self, DispatcherContext};
use crate::fetch::FetchClient;
use crate::node::NodeState;
use crate::router::Router;
use crate::singleflight::SingleFlight;
use crate::types::Request;
use hyper::Method;

const QUIESCENCE_THRESHOLD: Duration = Duration::from_secs(5);
const QUIESCENCE_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run(
    initial_settings: Settings,
    settings_source: Arc<dyn SettingsSource>,
) -> anyhow::Result<()> {
    let node = NodeState::new(String::new(), unix_millis());

    let cache = Arc::new(
        Cache::new(
            initial_settings.cache_dir.clone(),
            initial_settings.max_cache_size_bytes,
        )
        .await?,
    );
    let single_flight = Arc::new(SingleFlight::new());
    let fetch_client = Arc::new(FetchClient::new()?);
    let control = Arc::new(ControlClient::new(
        settings_source,
        node.clone(),
        initial_settings.tls_cert_path.clone(),
        initial_settings.tls_key_path.clone(),
    )?);

    info!("performing initial synchronous heartbeat");
    control.ping_once().await?;

    let heartbeat_handle = tokio::spawn({
        let control = control.clone();
        async move { control.run_heartbeat_loop().await }
    });

    let ctx = Arc::new(DispatcherContext {
        cache,
        single_flight,
        fetch_client,
        node: node.clone(),
    });
    let router = build_router(ctx);

    spawn_shutdown_handler(
        node,
        control,
        initial_settings.client_secret.clone(),
        initial_settings.control_url.clone(),
    );

    let listener = TcpListener::bind(("0.0.0.0", initial_settings.client_port)).await?;
    let result = crate::server_tls::serve_tls(
        listener,
        router,
        &initial_settings.tls_cert_path,
        &initial_settings.tls_key_path,
    )
    .await;

    heartbeat_handle.abort();
    result
}

fn build_router(ctx: Arc<DispatcherContext>) -> Router {
    let mut router = Router::new();

    for path in [
        "/{image_class}/{chapter_id}/{image_name}",
        "/{token}/{image_class}/{chapter_id}/{image_name}",
        "/{token}/{image_class}/{chapter_id}/{image_name}/{a}/{b}/{c}/{d}",
    ] {
        let ctx = ctx.clone();
        router.route(Method::GET, path, move |req: Request| {
            let ctx = ctx.clone();
            async move { dispatcher::dispatch(ctx, req).await }
        });
    }

    router
}

/// Spawns the task that waits for SIGTERM/SIGINT and runs the graceful
/// shutdown sequence, then exits the process. In-flight requests are not
/// drained beyond the quiescence wait; the control plane is responsible
/// for steering new traffic away once `/stop` is acknowledged.
fn spawn_shutdown_handler(
    node: Arc<NodeState>,
    control: Arc<ControlClient>,
    client_secret: String,
    control_url: String,
) {
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(err) => {
                error!(%err, "failed to install SIGINT handler");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }

        info!("shutdown signal received, stopping");
        node.stop();
        control.notify_stop(&client_secret, &control_url).await;

        loop {
            let idle_ms = unix_millis() - node.last_request_at_unix_ms();
            if idle_ms >= QUIESCENCE_THRESHOLD.as_millis() as i64 {
                break;
            }
            info!(idle_ms, "waiting for request quiescence");
            tokio::time::sleep(QUIESCENCE_POLL_INTERVAL).await;
        }

        info!("quiescent, exiting");
        std::process::exit(0);
    });
}

fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
