//! Protocol Adapters
//!
//! Each adapter turns a protocol-native check into [`CheckAttributes`],
//! consults the shared [`Authorizer`] and writes the verdict back in the
//! protocol's own response shape.

mod grpc;
mod http;

pub use self::grpc::GrpcAdapter;
pub use self::http::HttpAdapter;

use crate::attributes::{CheckAttributes, ProtocolKind, ResponseDirective, StatusCategory};
use crate::config::{ExtAuthzConfig, SET_COOKIE_HEADER};
use crate::decision::{DecisionEngine, DecisionRule, Verdict};
use tracing::info;

/// Decision engine plus verdict translation, shared by both adapters
#[derive(Debug, Clone)]
pub struct Authorizer {
    engine: DecisionEngine,
    credential_header: String,
    result_header: String,
    allow_cookie: String,
}

impl Authorizer {
    /// Build from service configuration
    pub fn from_config(config: &ExtAuthzConfig) -> Self {
        Self {
            engine: config.engine(),
            credential_header: config.credential_header(),
            result_header: config.result_header.clone(),
            allow_cookie: config.allow_cookie.clone(),
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Header the credential is read from (lowercase)
    pub fn credential_header(&self) -> &str {
        &self.credential_header
    }

    /// Verdict for a request snapshot; only the credential header counts
    pub fn decide(&self, attributes: &CheckAttributes) -> Verdict {
        self.engine.decide(attributes.header(&self.credential_header))
    }

    /// Protocol-agnostic response for a verdict
    pub fn translate(&self, verdict: Verdict) -> ResponseDirective {
        match (self.engine.rule(), verdict) {
            (DecisionRule::ExactMatch, Verdict::Allowed) => ResponseDirective::new(StatusCategory::Ok)
                .with_header(self.result_header.as_str(), "allowed"),
            (DecisionRule::ExactMatch, Verdict::Denied) => {
                ResponseDirective::new(StatusCategory::PermissionDenied)
                    .with_header(self.result_header.as_str(), "denied")
            }
            (DecisionRule::BearerToken, Verdict::Allowed) => ResponseDirective::new(StatusCategory::Ok)
                .with_header(SET_COOKIE_HEADER, self.allow_cookie.as_str()),
            (DecisionRule::BearerToken, Verdict::Denied) => {
                ResponseDirective::new(StatusCategory::PermissionDenied)
            }
        }
    }
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::from_config(&ExtAuthzConfig::default())
    }
}

/// One wire protocol's view of a check
pub trait ProtocolAdapter: Send + Sync {
    type Request;
    type Response;

    fn protocol(&self) -> ProtocolKind;

    fn authorizer(&self) -> &Authorizer;

    /// Pull the check attributes out of a native request. Must not fail:
    /// anything missing becomes an empty string.
    fn extract_attributes(&self, request: &Self::Request) -> CheckAttributes;

    /// Render a directive as a native response
    fn emit(&self, directive: ResponseDirective) -> Self::Response;

    fn translate(&self, verdict: Verdict) -> ResponseDirective {
        self.authorizer().translate(verdict)
    }

    /// Full check: extract, decide, log, respond
    fn check(&self, request: &Self::Request) -> Self::Response {
        let attributes = self.extract_attributes(request);
        let verdict = self.authorizer().decide(&attributes);
        record_decision(self.protocol(), verdict, &attributes);
        self.emit(self.translate(verdict))
    }
}

/// Emit the single log record every check produces
pub(crate) fn record_decision(protocol: ProtocolKind, verdict: Verdict, attributes: &CheckAttributes) {
    info!(
        protocol = %protocol,
        verdict = %verdict,
        method = attributes.method(),
        host = attributes.host(),
        path = attributes.path(),
        "[{}][{:>7}]: {} {}{} with headers {:?}",
        protocol,
        verdict.to_string(),
        attributes.method(),
        attributes.host(),
        attributes.path(),
        attributes.headers()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{attribute_context, AttributeContext, CheckRequest};
    use crate::testing::CapturedLogs;
    use axum::body::Body;
    use std::sync::Arc;
    use tracing::Level;

    fn bearer_authorizer() -> Authorizer {
        Authorizer::from_config(&ExtAuthzConfig {
            rule: DecisionRule::BearerToken,
            ..Default::default()
        })
    }

    fn attrs(name: &str, value: &str) -> CheckAttributes {
        CheckAttributes::new(vec![(name, value)], "example.com", "/headers", "GET")
    }

    #[test]
    fn test_exact_match_translation() {
        let authorizer = Authorizer::default();

        let allowed = authorizer.translate(Verdict::Allowed);
        assert_eq!(allowed.status, StatusCategory::Ok);
        assert_eq!(
            allowed.headers,
            vec![("x-ext-authz-result".to_string(), "allowed".to_string())]
        );

        let denied = authorizer.translate(Verdict::Denied);
        assert_eq!(denied.status, StatusCategory::PermissionDenied);
        assert_eq!(
            denied.headers,
            vec![("x-ext-authz-result".to_string(), "denied".to_string())]
        );
    }

    #[test]
    fn test_bearer_translation() {
        let authorizer = bearer_authorizer();

        let allowed = authorizer.translate(Verdict::Allowed);
        assert_eq!(allowed.status, StatusCategory::Ok);
        assert_eq!(allowed.headers.len(), 1);
        assert_eq!(allowed.headers[0].0, "Set-Cookie");
        assert_eq!(allowed.headers[0].1, "x-ext-authz-session=allowed");

        let denied = authorizer.translate(Verdict::Denied);
        assert_eq!(denied.status, StatusCategory::PermissionDenied);
        assert!(denied.headers.is_empty());
    }

    #[test]
    fn test_decide_reads_configured_header() {
        let authorizer = Authorizer::default();
        assert_eq!(authorizer.decide(&attrs("X-Ext-Authz", "allow")), Verdict::Allowed);
        assert_eq!(authorizer.decide(&attrs("x-ext-authz", "block")), Verdict::Denied);
        assert_eq!(authorizer.decide(&attrs("authorization", "allow")), Verdict::Denied);

        let bearer = bearer_authorizer();
        assert_eq!(bearer.decide(&attrs("Authorization", "Bearer allow")), Verdict::Allowed);
        assert_eq!(bearer.decide(&attrs("x-ext-authz", "allow")), Verdict::Denied);
    }

    #[test]
    fn test_other_attributes_do_not_matter() {
        let authorizer = Authorizer::default();
        let a = CheckAttributes::new(vec![("x-ext-authz", "allow")], "a.example", "/a", "GET");
        let b = CheckAttributes::new(
            vec![("x-ext-authz", "allow"), ("x-other", "1")],
            "b.example",
            "/b?q=1",
            "DELETE",
        );

        assert_eq!(authorizer.decide(&a), authorizer.decide(&b));
    }

    fn grpc_request(value: &str) -> CheckRequest {
        CheckRequest {
            attributes: Some(AttributeContext {
                request: Some(attribute_context::Request {
                    time: None,
                    http: Some(attribute_context::HttpRequest {
                        method: "GET".into(),
                        host: "httpbin.example.com".into(),
                        path: "/headers".into(),
                        headers: [("x-ext-authz".to_string(), value.to_string())].into(),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            }),
        }
    }

    fn http_request(value: &str) -> axum::extract::Request {
        axum::http::Request::builder()
            .method("GET")
            .uri("/headers")
            .header("host", "httpbin.example.com")
            .header("x-ext-authz", value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_one_decision_record_per_check() {
        let authorizer = Arc::new(Authorizer::default());
        let grpc = GrpcAdapter::new(Arc::clone(&authorizer));
        let http = HttpAdapter::new(authorizer);
        let (logs, _guard) = CapturedLogs::install();

        for (value, verdict) in [("allow", "allowed"), ("block", "denied")] {
            for protocol in ["gRPC", "HTTP"] {
                logs.clear();
                match protocol {
                    "gRPC" => {
                        ProtocolAdapter::check(&grpc, &grpc_request(value));
                    }
                    _ => {
                        ProtocolAdapter::check(&http, &http_request(value));
                    }
                }

                let records = logs.records();
                assert_eq!(records.len(), 1, "{} {}", protocol, verdict);

                let record = &records[0];
                assert_eq!(record.level, Level::INFO);
                assert_eq!(record.field("protocol"), protocol);
                assert_eq!(record.field("verdict"), verdict);
                assert_eq!(record.field("method"), "GET");
                assert_eq!(record.field("host"), "httpbin.example.com");
                assert_eq!(record.field("path"), "/headers");
            }
        }
    }
}
