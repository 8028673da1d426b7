//! OpenSASE External Authorization Service
//!
//! Envoy `ext_authz` check service exposed over two protocols at once.
//!
//! ## Components
//!
//! - **Decision**: credential header -> ALLOW/DENY
//! - **Adapters**: gRPC (`envoy.service.auth.v3.Authorization/Check`) and plain HTTP
//! - **Listeners**: one independently failing lifecycle per protocol
//! - **Server**: runs both listeners and waits for them to terminate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sase_extauthz::{ExtAuthzConfig, ExtAuthzServer, Readiness};
//!
//! let server = ExtAuthzServer::new(ExtAuthzConfig::default())?;
//! server.run(Readiness::default(), tokio::signal::ctrl_c()).await?;
//! ```

pub mod adapter;
pub mod attributes;
pub mod config;
pub mod decision;
pub mod listener;
pub mod proto;
pub mod server;

#[cfg(test)]
mod testing;

pub use adapter::{Authorizer, GrpcAdapter, HttpAdapter, ProtocolAdapter};
pub use attributes::{CheckAttributes, ProtocolKind, ResponseDirective, StatusCategory};
pub use config::ExtAuthzConfig;
pub use decision::{DecisionEngine, DecisionRule, Verdict};
pub use listener::{ListenerError, ListenerHandle, ListenerManager, ListenerState};
pub use server::{ExtAuthzServer, Readiness, ReadinessWatch, ReadyListeners};

use thiserror::Error;

/// ExtAuthz service errors
#[derive(Error, Debug)]
pub enum ExtAuthzError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtAuthzError>;
