//! Service Configuration

use crate::decision::{DecisionEngine, DecisionRule, DEFAULT_ALLOW_TOKEN};
use crate::{ExtAuthzError, Result};
use axum::http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

/// Header the exact-match rule reports its verdict in
pub const RESULT_HEADER: &str = "x-ext-authz-result";

/// Header the bearer rule sets on allow
pub const SET_COOKIE_HEADER: &str = "Set-Cookie";

/// Cookie injected upstream by the bearer rule on allow
pub const DEFAULT_ALLOW_COOKIE: &str = "x-ext-authz-session=allowed";

/// ExtAuthz service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtAuthzConfig {
    /// Interface both listeners bind on
    pub bind_address: IpAddr,
    /// HTTP check port
    pub http_port: u16,
    /// gRPC check port
    pub grpc_port: u16,
    /// Credential comparison rule
    pub rule: DecisionRule,
    /// Token that yields an allow verdict
    pub allow_token: String,
    /// Overrides the rule's credential header
    pub check_header: Option<String>,
    /// Verdict header for the exact-match rule
    pub result_header: String,
    /// Cookie value for the bearer rule
    pub allow_cookie: String,
}

impl Default for ExtAuthzConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 8000,
            grpc_port: 9000,
            rule: DecisionRule::ExactMatch,
            allow_token: DEFAULT_ALLOW_TOKEN.into(),
            check_header: None,
            result_header: RESULT_HEADER.into(),
            allow_cookie: DEFAULT_ALLOW_COOKIE.into(),
        }
    }
}

impl ExtAuthzConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings that would make every check misbehave
    pub fn validate(&self) -> Result<()> {
        if self.allow_token.is_empty() {
            return Err(ExtAuthzError::Config(
                "allow_token must not be empty".into(),
            ));
        }

        HeaderName::from_bytes(self.credential_header().as_bytes()).map_err(|e| {
            ExtAuthzError::Config(format!("invalid check header {:?}: {}", self.credential_header(), e))
        })?;
        HeaderName::from_bytes(self.result_header.as_bytes()).map_err(|e| {
            ExtAuthzError::Config(format!("invalid result header {:?}: {}", self.result_header, e))
        })?;
        HeaderValue::from_str(&self.allow_cookie).map_err(|e| {
            ExtAuthzError::Config(format!("invalid allow cookie {:?}: {}", self.allow_cookie, e))
        })?;

        Ok(())
    }

    /// Header the credential is read from
    pub fn credential_header(&self) -> String {
        match &self.check_header {
            Some(header) => header.to_ascii_lowercase(),
            None => self.rule.credential_header().to_string(),
        }
    }

    /// Engine built from the rule settings
    pub fn engine(&self) -> DecisionEngine {
        DecisionEngine::new(self.rule, self.allow_token.clone())
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.http_port)
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.grpc_port)
    }
}
