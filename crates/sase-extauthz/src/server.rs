//! ExtAuthz Server
//!
//! Runs the HTTP and gRPC listeners side by side over one shared
//! [`Authorizer`] and returns once both have terminated.

use crate::adapter::{Authorizer, GrpcAdapter, HttpAdapter};
use crate::config::ExtAuthzConfig;
use crate::listener::{ListenerError, ListenerHandle, ListenerManager, ProtocolServer, Shutdown};
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};

/// Per-listener readiness senders; each fires once with the bound address
#[derive(Debug, Default)]
pub struct Readiness {
    pub http: Option<oneshot::Sender<ListenerHandle>>,
    pub grpc: Option<oneshot::Sender<ListenerHandle>>,
}

impl Readiness {
    /// Senders for the server plus the matching receivers
    pub fn channel() -> (Readiness, ReadinessWatch) {
        let (http_tx, http_rx) = oneshot::channel();
        let (grpc_tx, grpc_rx) = oneshot::channel();

        (
            Readiness {
                http: Some(http_tx),
                grpc: Some(grpc_tx),
            },
            ReadinessWatch {
                http: http_rx,
                grpc: grpc_rx,
            },
        )
    }
}

/// Receiving side of [`Readiness`]
#[derive(Debug)]
pub struct ReadinessWatch {
    http: oneshot::Receiver<ListenerHandle>,
    grpc: oneshot::Receiver<ListenerHandle>,
}

/// Both listeners, once bound
#[derive(Debug, Clone, Copy)]
pub struct ReadyListeners {
    pub http: ListenerHandle,
    pub grpc: ListenerHandle,
}

impl ReadinessWatch {
    /// Wait for both listeners to bind. `None` if either never does.
    pub async fn wait(self) -> Option<ReadyListeners> {
        let http = self.http.await.ok()?;
        let grpc = self.grpc.await.ok()?;
        Some(ReadyListeners { http, grpc })
    }
}

/// Composition root for the two check listeners
pub struct ExtAuthzServer {
    config: ExtAuthzConfig,
    authorizer: Arc<Authorizer>,
}

impl ExtAuthzServer {
    /// Create server from validated configuration
    pub fn new(config: ExtAuthzConfig) -> Result<Self> {
        config.validate()?;
        let authorizer = Arc::new(Authorizer::from_config(&config));

        Ok(Self { config, authorizer })
    }

    pub fn config(&self) -> &ExtAuthzConfig {
        &self.config
    }

    /// Run both listeners until they terminate.
    ///
    /// A bind failure on either side stops the other listener and is
    /// returned. A serve failure only ends that listener. `shutdown`
    /// resolving with `Ok` stops both; an `Err` means no shutdown signal
    /// is available and the listeners keep serving.
    pub async fn run<F>(self, readiness: Readiness, shutdown: F) -> Result<()>
    where
        F: Future<Output = std::io::Result<()>> + Send + 'static,
    {
        let (stop_tx, signal) = Shutdown::channel();
        let stop_tx = Arc::new(stop_tx);

        let trigger = Arc::clone(&stop_tx);
        let external = tokio::spawn(async move {
            match shutdown.await {
                Ok(()) => {
                    info!("Shutdown requested");
                    trigger.send_replace(true);
                }
                Err(e) => error!("Shutdown signal unavailable, serving until killed: {}", e),
            }
        });

        info!(
            "ExtAuthz rule={} check_header={}",
            self.authorizer.engine().rule(),
            self.authorizer.credential_header()
        );

        let mut http = ListenerManager::new(
            self.config.http_addr(),
            HttpAdapter::new(Arc::clone(&self.authorizer)),
        );
        let mut grpc = ListenerManager::new(
            self.config.grpc_addr(),
            GrpcAdapter::new(Arc::clone(&self.authorizer)),
        );

        let (http_result, grpc_result) = tokio::join!(
            supervise(&mut http, readiness.http, signal.clone(), &stop_tx),
            supervise(&mut grpc, readiness.grpc, signal, &stop_tx),
        );
        external.abort();

        info!(
            "Listeners terminated: HTTP {}, gRPC {}",
            http.state(),
            grpc.state()
        );

        match first_bind_failure([http_result, grpc_result]) {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// The bind failure to report, if any. Serve failures were already logged
/// by their listener.
fn first_bind_failure(
    results: [std::result::Result<ListenerHandle, ListenerError>; 2],
) -> Option<ListenerError> {
    results.into_iter().find_map(|result| match result {
        Err(err) if err.is_bind() => Some(err),
        _ => None,
    })
}

/// Run one listener; a bind failure asks every other listener to stop.
async fn supervise<S: ProtocolServer>(
    manager: &mut ListenerManager<S>,
    ready: Option<oneshot::Sender<ListenerHandle>>,
    shutdown: Shutdown,
    stop: &watch::Sender<bool>,
) -> std::result::Result<ListenerHandle, ListenerError> {
    let result = manager.run(ready, shutdown).await;

    if let Err(err) = &result {
        if err.is_bind() {
            warn!("Stopping remaining listeners after {} bind failure", err.protocol());
            stop.send_replace(true);
        }
    }

    result
}
