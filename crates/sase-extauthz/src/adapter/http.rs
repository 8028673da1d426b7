//! HTTP Adapter
//!
//! Plain HTTP check: any method, any path. 200 on allow, 403 on deny,
//! always an empty body.

use super::{Authorizer, ProtocolAdapter};
use crate::attributes::{CheckAttributes, ProtocolKind, ResponseDirective, StatusCategory};
use crate::listener::{ProtocolServer, Shutdown};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::warn;

/// HTTP check adapter
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    authorizer: Arc<Authorizer>,
}

impl HttpAdapter {
    pub fn new(authorizer: Arc<Authorizer>) -> Self {
        Self { authorizer }
    }

    /// Router answering every request with a check verdict
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(handle_check)
            .with_state(Arc::new(self.clone()))
    }
}

async fn handle_check(State(adapter): State<Arc<HttpAdapter>>, request: Request) -> Response {
    adapter.check(&request)
}

impl ProtocolAdapter for HttpAdapter {
    type Request = Request;
    type Response = Response;

    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Http
    }

    fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    fn extract_attributes(&self, request: &Request) -> CheckAttributes {
        let headers = request.headers().iter().map(|(name, value)| {
            (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        });

        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| request.uri().authority().map(|a| a.as_str()))
            .unwrap_or("");

        let path = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        CheckAttributes::new(headers, host, path, request.method().as_str())
    }

    fn emit(&self, directive: ResponseDirective) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = match directive.status {
            StatusCategory::Ok => StatusCode::OK,
            StatusCategory::PermissionDenied => StatusCode::FORBIDDEN,
        };

        for (name, value) in directive.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => warn!("Dropping invalid response header {}: {}", name, value),
            }
        }

        response
    }
}

#[async_trait]
impl ProtocolServer for HttpAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Http
    }

    async fn serve(&self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown.signalled())
            .await
    }
}
