//! gRPC Adapter
//!
//! Implements Envoy's `envoy.service.auth.v3.Authorization/Check`.

use super::{Authorizer, ProtocolAdapter};
use crate::attributes::{CheckAttributes, ProtocolKind, ResponseDirective, StatusCategory};
use crate::listener::{ProtocolServer, Shutdown};
use crate::proto::authorization_server::{Authorization, AuthorizationServer};
use crate::proto::config_core::{HeaderValue, HeaderValueOption};
use crate::proto::{check_response, rpc, CheckRequest, CheckResponse, OkHttpResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// gRPC check adapter
#[derive(Debug, Clone)]
pub struct GrpcAdapter {
    authorizer: Arc<Authorizer>,
}

impl GrpcAdapter {
    pub fn new(authorizer: Arc<Authorizer>) -> Self {
        Self { authorizer }
    }
}

impl ProtocolAdapter for GrpcAdapter {
    type Request = CheckRequest;
    type Response = CheckResponse;

    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Grpc
    }

    fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    fn extract_attributes(&self, request: &CheckRequest) -> CheckAttributes {
        let http = request
            .attributes
            .as_ref()
            .and_then(|a| a.request.as_ref())
            .and_then(|r| r.http.as_ref());

        match http {
            Some(http) => CheckAttributes::new(
                http.headers.iter().map(|(k, v)| (k.as_str(), v.clone())),
                http.host.as_str(),
                http.path.as_str(),
                http.method.as_str(),
            ),
            None => CheckAttributes::default(),
        }
    }

    fn emit(&self, directive: ResponseDirective) -> CheckResponse {
        let code = match directive.status {
            StatusCategory::Ok => rpc::Code::Ok,
            StatusCategory::PermissionDenied => rpc::Code::PermissionDenied,
        };

        // Envoy applies these to the upstream request; the list rides in
        // ok_response for both verdicts.
        let headers = directive
            .headers
            .into_iter()
            .map(|(key, value)| HeaderValueOption {
                header: Some(HeaderValue {
                    key,
                    value,
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();

        CheckResponse {
            status: Some(rpc::Status {
                code: code as i32,
                ..Default::default()
            }),
            http_response: Some(check_response::HttpResponse::OkResponse(OkHttpResponse {
                headers,
                ..Default::default()
            })),
        }
    }
}

#[tonic::async_trait]
impl Authorization for GrpcAdapter {
    async fn check(&self, request: Request<CheckRequest>) -> Result<Response<CheckResponse>, Status> {
        Ok(Response::new(ProtocolAdapter::check(self, request.get_ref())))
    }
}

#[async_trait]
impl ProtocolServer for GrpcAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Grpc
    }

    async fn serve(&self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        Server::builder()
            .add_service(AuthorizationServer::new(self.clone()))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.signalled())
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
