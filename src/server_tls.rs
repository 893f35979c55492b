//! TLS-terminating HTTP/1.1 listener.
//!
//! The node speaks HTTPS exclusively: the control plane routes clients to
//! this node's `client_port` over TLS, using the certificate/key pair most
//! recently rotated in by the control-plane client (see [`crate::control`]).

use std::convert::Infallible;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use hyper::{Request, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tokio::net::TcpListener;
use tokio_rustls::{TlsAcceptor, rustls::ServerConfig};
use tracing::{error, info};

use crate::router::Router;

/// Starts the TLS server with the given listener, router, and certificate
/// material, and serves connections until the listener errors.
pub async fn serve_tls(
    listener: TcpListener,
    router: Router,
    cert_path: &Path,
    key_path: &Path,
) -> anyhow::Result<()> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    let acceptor = TlsAcceptor::from(Arc::new(config));
    let router = Arc::new(router);

    info!(addr = %listener.local_addr()?, "listening");

    loop {
        let (stream, addr) = listener.accept().await?;
        let acceptor = acceptor.clone();
        let router = router.clone();

        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(s) => s,
                Err(err) => {
                    error!(%err, "TLS handshake failed");
                    return;
                }
            };

            let io = TokioIo::new(tls_stream);
            let svc = service_fn(move |mut req: Request<_>| {
                let router = router.clone();
                async move {
                    req.extensions_mut().insert(addr);
                    Ok::<_, Infallible>(router.dispatch(req).await)
                }
            });

            let mut h1 = http1::Builder::new();
            h1.keep_alive(true);

            if let Err(err) = h1.serve_connection(io, svc).with_upgrades().await {
                error!(%err, "connection error");
            }
        });
    }
}

fn load_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let mut rd = BufReader::new(File::open(path)?);
    Ok(certs(&mut rd).collect::<Result<Vec<_>, _>>()?)
}

fn load_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    let mut rd = BufReader::new(File::open(path)?);
    let key = pkcs8_private_keys(&mut rd)
        .next()
        .ok_or_else(|| anyhow::anyhow!("no private key found in {}", path.display()))??;
    Ok(key.into())
}
