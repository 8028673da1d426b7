//! OpenSASE ExtAuthz - Main Entry Point
//!
//! # Usage
//!
//! ```bash
//! sase-extauthz --http 8000 --grpc 9000
//! sase-extauthz --rule bearer --allow-token allow
//! sase-extauthz --config /etc/opensase/extauthz.json
//! ```

use clap::{Parser, ValueEnum};
use sase_extauthz::{DecisionRule, ExtAuthzConfig, ExtAuthzServer, Readiness};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sase-extauthz")]
#[command(author = "OpenSASE")]
#[command(version)]
#[command(about = "OpenSASE external authorization check service", long_about = None)]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(long, env = "EXTAUTHZ_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP server port [default: 8000]
    #[arg(long = "http", env = "EXTAUTHZ_HTTP_PORT")]
    http_port: Option<u16>,

    /// gRPC server port [default: 9000]
    #[arg(long = "grpc", env = "EXTAUTHZ_GRPC_PORT")]
    grpc_port: Option<u16>,

    /// Address both servers bind on [default: 0.0.0.0]
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Credential rule [default: exact]
    #[arg(long, value_enum)]
    rule: Option<RuleArg>,

    /// Token that is allowed [default: allow]
    #[arg(long, env = "EXTAUTHZ_ALLOW_TOKEN")]
    allow_token: Option<String>,

    /// Header carrying the credential [default: depends on rule]
    #[arg(long)]
    check_header: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RuleArg {
    /// `x-ext-authz: <token>`
    Exact,
    /// `Authorization: Bearer <token>`
    Bearer,
}

impl From<RuleArg> for DecisionRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Exact => DecisionRule::ExactMatch,
            RuleArg::Bearer => DecisionRule::BearerToken,
        }
    }
}

impl Cli {
    fn into_config(self) -> sase_extauthz::Result<ExtAuthzConfig> {
        let mut config = match &self.config {
            Some(path) => ExtAuthzConfig::load(path)?,
            None => ExtAuthzConfig::default(),
        };

        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(port) = self.grpc_port {
            config.grpc_port = port;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(rule) = self.rule {
            config.rule = rule.into();
        }
        if let Some(token) = self.allow_token {
            config.allow_token = token;
        }
        if self.check_header.is_some() {
            config.check_header = self.check_header;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("OpenSASE ExtAuthz v{}", env!("CARGO_PKG_VERSION"));

    let server = match Cli::parse().into_config().and_then(ExtAuthzServer::new) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match server.run(Readiness::default(), tokio::signal::ctrl_c()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Cli::parse_from(["sase-extauthz"]).into_config().unwrap();
        assert_eq!(config, ExtAuthzConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let config = Cli::parse_from([
            "sase-extauthz",
            "--http",
            "18000",
            "--grpc",
            "19000",
            "--rule",
            "bearer",
            "--allow-token",
            "letmein",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.http_port, 18000);
        assert_eq!(config.grpc_port, 19000);
        assert_eq!(config.rule, DecisionRule::BearerToken);
        assert_eq!(config.allow_token, "letmein");
        assert_eq!(config.credential_header(), "authorization");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
