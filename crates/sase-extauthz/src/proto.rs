//! Envoy ext_authz v3 wire types
//!
//! Hand-maintained prost messages for `envoy.service.auth.v3.Authorization`.
//! Field numbers match the upstream protos; fields this service never reads
//! or writes are left out and skipped on decode.
//!
//! Only the messages reachable from `Check` are kept, and the server and
//! client modules below mirror what `tonic-build` emits for that one RPC.
//! Extending the service means adding the message here with its upstream
//! tag and, for a new RPC, a route in `AuthorizationServer::call`.

/// `google.rpc`
pub mod rpc {
    /// `google.rpc.Status`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Status {
        #[prost(int32, tag = "1")]
        pub code: i32,
        #[prost(string, tag = "2")]
        pub message: ::prost::alloc::string::String,
        #[prost(message, repeated, tag = "3")]
        pub details: ::prost::alloc::vec::Vec<::prost_types::Any>,
    }

    /// `google.rpc.Code` values used by the check service
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Code {
        Ok = 0,
        PermissionDenied = 7,
    }
}

/// `envoy.config.core.v3`
pub mod config_core {
    /// `envoy.config.core.v3.HeaderValue`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HeaderValue {
        #[prost(string, tag = "1")]
        pub key: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub value: ::prost::alloc::string::String,
        #[prost(bytes = "vec", tag = "3")]
        pub raw_value: ::prost::alloc::vec::Vec<u8>,
    }

    /// `envoy.config.core.v3.HeaderValueOption`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HeaderValueOption {
        #[prost(message, optional, tag = "1")]
        pub header: ::core::option::Option<HeaderValue>,
        #[prost(int32, tag = "3")]
        pub append_action: i32,
        #[prost(bool, tag = "4")]
        pub keep_empty_value: bool,
    }
}

/// `envoy.type.v3`
pub mod types {
    /// `envoy.type.v3.HttpStatus`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HttpStatus {
        #[prost(int32, tag = "1")]
        pub code: i32,
    }
}

/// `envoy.service.auth.v3.AttributeContext`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttributeContext {
    #[prost(message, optional, tag = "1")]
    pub source: ::core::option::Option<attribute_context::Peer>,
    #[prost(message, optional, tag = "2")]
    pub destination: ::core::option::Option<attribute_context::Peer>,
    #[prost(message, optional, tag = "4")]
    pub request: ::core::option::Option<attribute_context::Request>,
    #[prost(map = "string, string", tag = "10")]
    pub context_extensions:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

/// Nested message types of [`AttributeContext`]
pub mod attribute_context {
    /// `AttributeContext.Peer`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Peer {
        #[prost(string, tag = "2")]
        pub service: ::prost::alloc::string::String,
        #[prost(map = "string, string", tag = "3")]
        pub labels:
            ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
        #[prost(string, tag = "4")]
        pub principal: ::prost::alloc::string::String,
        #[prost(string, tag = "5")]
        pub certificate: ::prost::alloc::string::String,
    }

    /// `AttributeContext.Request`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(message, optional, tag = "1")]
        pub time: ::core::option::Option<::prost_types::Timestamp>,
        #[prost(message, optional, tag = "2")]
        pub http: ::core::option::Option<HttpRequest>,
    }

    /// `AttributeContext.HttpRequest`
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HttpRequest {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub method: ::prost::alloc::string::String,
        #[prost(map = "string, string", tag = "3")]
        pub headers:
            ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
        #[prost(string, tag = "4")]
        pub path: ::prost::alloc::string::String,
        #[prost(string, tag = "5")]
        pub host: ::prost::alloc::string::String,
        #[prost(string, tag = "6")]
        pub scheme: ::prost::alloc::string::String,
        #[prost(string, tag = "7")]
        pub query: ::prost::alloc::string::String,
        #[prost(string, tag = "8")]
        pub fragment: ::prost::alloc::string::String,
        #[prost(int64, tag = "9")]
        pub size: i64,
        #[prost(string, tag = "10")]
        pub protocol: ::prost::alloc::string::String,
        #[prost(string, tag = "11")]
        pub body: ::prost::alloc::string::String,
        #[prost(bytes = "vec", tag = "12")]
        pub raw_body: ::prost::alloc::vec::Vec<u8>,
    }
}

/// `envoy.service.auth.v3.CheckRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckRequest {
    #[prost(message, optional, tag = "1")]
    pub attributes: ::core::option::Option<AttributeContext>,
}

/// `envoy.service.auth.v3.DeniedHttpResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeniedHttpResponse {
    #[prost(message, optional, tag = "1")]
    pub status: ::core::option::Option<types::HttpStatus>,
    #[prost(message, repeated, tag = "2")]
    pub headers: ::prost::alloc::vec::Vec<config_core::HeaderValueOption>,
    #[prost(string, tag = "3")]
    pub body: ::prost::alloc::string::String,
}

/// `envoy.service.auth.v3.OkHttpResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OkHttpResponse {
    #[prost(message, repeated, tag = "2")]
    pub headers: ::prost::alloc::vec::Vec<config_core::HeaderValueOption>,
    #[prost(string, repeated, tag = "5")]
    pub headers_to_remove: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(message, repeated, tag = "6")]
    pub response_headers_to_add: ::prost::alloc::vec::Vec<config_core::HeaderValueOption>,
}

/// `envoy.service.auth.v3.CheckResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckResponse {
    #[prost(message, optional, tag = "1")]
    pub status: ::core::option::Option<rpc::Status>,
    #[prost(oneof = "check_response::HttpResponse", tags = "2, 3")]
    pub http_response: ::core::option::Option<check_response::HttpResponse>,
}

/// Nested types of [`CheckResponse`]
pub mod check_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum HttpResponse {
        #[prost(message, tag = "2")]
        DeniedResponse(super::DeniedHttpResponse),
        #[prost(message, tag = "3")]
        OkResponse(super::OkHttpResponse),
    }
}

impl CheckResponse {
    /// Headers carried by whichever HTTP response variant is set
    pub fn headers(&self) -> Vec<(&str, &str)> {
        let options = match &self.http_response {
            Some(check_response::HttpResponse::OkResponse(ok)) => &ok.headers,
            Some(check_response::HttpResponse::DeniedResponse(denied)) => &denied.headers,
            None => return Vec::new(),
        };

        options
            .iter()
            .filter_map(|option| option.header.as_ref())
            .map(|header| (header.key.as_str(), header.value.as_str()))
            .collect()
    }

    /// `google.rpc` status code, `Ok` when unset
    pub fn code(&self) -> i32 {
        self.status.as_ref().map(|s| s.code).unwrap_or(rpc::Code::Ok as i32)
    }
}

const CHECK_PATH: &str = "/envoy.service.auth.v3.Authorization/Check";

/// Server side of `envoy.service.auth.v3.Authorization`
pub mod authorization_server {
    use tonic::codegen::*;

    /// Check handler implemented by the gRPC adapter
    #[async_trait]
    pub trait Authorization: Send + Sync + 'static {
        async fn check(
            &self,
            request: tonic::Request<super::CheckRequest>,
        ) -> std::result::Result<tonic::Response<super::CheckResponse>, tonic::Status>;
    }

    /// Routes `Authorization/Check` calls to an [`Authorization`] handler
    #[derive(Debug)]
    pub struct AuthorizationServer<T> {
        inner: Arc<T>,
    }

    impl<T: Authorization> AuthorizationServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T> Clone for AuthorizationServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    struct CheckSvc<T>(Arc<T>);

    impl<T: Authorization> tonic::server::UnaryService<super::CheckRequest> for CheckSvc<T> {
        type Response = super::CheckResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<super::CheckRequest>) -> Self::Future {
            let inner = Arc::clone(&self.0);
            Box::pin(async move { <T as Authorization>::check(&inner, request).await })
        }
    }

    impl<T, B> Service<http::Request<B>> for AuthorizationServer<T>
    where
        T: Authorization,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = Arc::clone(&self.inner);
            if req.uri().path() == super::CHECK_PATH {
                Box::pin(async move {
                    let codec = tonic::codec::ProstCodec::default();
                    let mut grpc = tonic::server::Grpc::new(codec);
                    Ok(grpc.unary(CheckSvc(inner), req).await)
                })
            } else {
                Box::pin(async move {
                    let mut response = http::Response::new(empty_body());
                    let headers = response.headers_mut();
                    headers.insert(
                        "grpc-status",
                        http::HeaderValue::from(tonic::Code::Unimplemented as i32),
                    );
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_static("application/grpc"),
                    );
                    Ok(response)
                })
            }
        }
    }

    impl<T: Authorization> tonic::server::NamedService for AuthorizationServer<T> {
        const NAME: &'static str = "envoy.service.auth.v3.Authorization";
    }
}

/// Client side of `envoy.service.auth.v3.Authorization`
pub mod authorization_client {
    use tonic::codegen::http;
    use tonic::transport::{Channel, Endpoint};

    /// Minimal unary client for `Authorization/Check`
    #[derive(Debug, Clone)]
    pub struct AuthorizationClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl AuthorizationClient {
        /// Connect to `dst`, e.g. `http://127.0.0.1:9000`
        pub async fn connect(dst: String) -> Result<Self, tonic::transport::Error> {
            let channel = Endpoint::from_shared(dst)?.connect().await?;
            Ok(Self::new(channel))
        }

        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn check(
            &mut self,
            request: impl tonic::IntoRequest<super::CheckRequest>,
        ) -> Result<tonic::Response<super::CheckResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {}", e)))?;

            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(super::CHECK_PATH);
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}
