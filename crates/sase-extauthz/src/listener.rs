//! Listener Lifecycle
//!
//! One manager per protocol: bind, announce the bound address, serve until
//! the serve loop ends. Managers share nothing, so one protocol failing
//! never moves the other's state.

use crate::attributes::ProtocolKind;
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info};

/// Lifecycle state of one listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Created,
    Bound,
    Serving,
    Stopped,
    Failed,
}

impl ListenerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ListenerState::Stopped | ListenerState::Failed)
    }
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListenerState::Created => "created",
            ListenerState::Bound => "bound",
            ListenerState::Serving => "serving",
            ListenerState::Stopped => "stopped",
            ListenerState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A bound listener, as announced to readiness observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle {
    pub bound_address: SocketAddr,
    pub protocol: ProtocolKind,
}

impl ListenerHandle {
    pub fn port(&self) -> u16 {
        self.bound_address.port()
    }
}

/// Listener errors
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Failed to bind {protocol} server on {address}: {source}")]
    Bind {
        protocol: ProtocolKind,
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serve {protocol} server: {source}")]
    Serve {
        protocol: ProtocolKind,
        #[source]
        source: std::io::Error,
    },
}

impl ListenerError {
    pub fn protocol(&self) -> ProtocolKind {
        match self {
            ListenerError::Bind { protocol, .. } | ListenerError::Serve { protocol, .. } => *protocol,
        }
    }

    pub fn is_bind(&self) -> bool {
        matches!(self, ListenerError::Bind { .. })
    }
}

/// Shutdown signal handed to a serve loop
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Paired trigger and signal
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Shutdown { rx })
    }

    /// Resolves once shutdown is requested or the trigger is dropped
    pub async fn signalled(mut self) {
        loop {
            let stopped = *self.rx.borrow();
            if stopped || self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// A protocol that can serve checks on an already bound listener
#[async_trait]
pub trait ProtocolServer: Send + Sync + 'static {
    fn kind(&self) -> ProtocolKind;

    /// Serve until the listener fails or `shutdown` resolves
    async fn serve(&self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()>;
}

/// Drives one listener through `Created -> Bound -> Serving -> Stopped`
pub struct ListenerManager<S> {
    address: SocketAddr,
    server: S,
    state: ListenerState,
}

impl<S: ProtocolServer> ListenerManager<S> {
    pub fn new(address: SocketAddr, server: S) -> Self {
        Self {
            address,
            server,
            state: ListenerState::Created,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn protocol(&self) -> ProtocolKind {
        self.server.kind()
    }

    /// Bind, report readiness, then serve until the loop ends.
    ///
    /// Bind errors are returned as-is and never retried.
    pub async fn run(
        &mut self,
        ready: Option<oneshot::Sender<ListenerHandle>>,
        shutdown: Shutdown,
    ) -> Result<ListenerHandle, ListenerError> {
        let protocol = self.server.kind();

        let listener = match TcpListener::bind(self.address).await {
            Ok(listener) => listener,
            Err(source) => return Err(self.fail(protocol, source)),
        };
        let bound_address = match listener.local_addr() {
            Ok(addr) => addr,
            Err(source) => return Err(self.fail(protocol, source)),
        };

        let handle = ListenerHandle {
            bound_address,
            protocol,
        };
        self.state = ListenerState::Bound;

        if let Some(ready) = ready {
            if ready.send(handle).is_err() {
                debug!("{} readiness observer went away", protocol);
            }
        }

        self.state = ListenerState::Serving;
        info!("Starting {} server at {}", protocol, bound_address);

        let result = self.server.serve(listener, shutdown).await;
        self.state = ListenerState::Stopped;

        match result {
            Ok(()) => {
                info!("Stopped {} server", protocol);
                Ok(handle)
            }
            Err(source) => {
                error!("{} server stopped unexpectedly: {}", protocol, source);
                Err(ListenerError::Serve { protocol, source })
            }
        }
    }

    fn fail(&mut self, protocol: ProtocolKind, source: std::io::Error) -> ListenerError {
        self.state = ListenerState::Failed;
        let err = ListenerError::Bind {
            protocol,
            address: self.address,
            source,
        };
        error!("{}", err);
        err
    }
}
