//! Request-scoped logging for `tower` services.
//!
//! For each request [`RequestLoggerService`]:
//! - builds a fresh [`Logger`], optionally tagged with a `request_id`;
//! - publishes that logger in the request's [`RequestContext`];
//! - calls the inner service;
//! - emits exactly one Debug `"request"` record with `status`, `method`,
//!   `client_ip` and `path` once the call is over, however it ended.
//!
//! The summary is emitted from a drop guard, so it also fires when the
//! inner service returns an error, panics, or the response future is
//! dropped before completion. In those cases no response exists and the
//! recorded status stays at the default of 200.

use crate::dispatch::{self, Dispatch};
use crate::error::LogError;
use crate::level::Level;
use crate::logger::Logger;
use futures_util::future::BoxFuture;
use http::header::{HeaderName, HeaderValue};
use http::{Extensions, Request, Response, StatusCode};
use std::any::Any;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

/// Header read (and echoed) by [`RequestLoggerLayer::with_default_request_id`].
pub const DEFAULT_REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// String-keyed bag of request-scoped values stored in the request
/// extensions.
#[derive(Clone, Default)]
pub struct RequestContext {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value under `key` if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Context key the middleware published its logger under for this request.
#[derive(Debug, Clone)]
struct LoggerKey(String);

/// Logger published by the middleware.
///
/// It is looked up under the key the middleware used for this request, or
/// under the context key of the process-wide dispatch when the middleware
/// did not run.
pub fn try_get_logger<B>(req: &Request<B>) -> Result<Logger, LogError> {
    try_get_logger_from(req.extensions())
}

fn try_get_logger_from(extensions: &Extensions) -> Result<Logger, LogError> {
    match extensions.get::<LoggerKey>() {
        Some(LoggerKey(key)) => try_get_logger_with_key(extensions, key),
        None => try_get_logger_with_key(extensions, &dispatch::global().context_key()),
    }
}

/// Logger stored in `extensions` under `key`.
pub fn try_get_logger_with_key(extensions: &Extensions, key: &str) -> Result<Logger, LogError> {
    let context = extensions
        .get::<RequestContext>()
        .filter(|ctx| ctx.contains(key))
        .ok_or_else(|| LogError::MissingLogger(key.to_string()))?;
    context
        .get::<Logger>(key)
        .cloned()
        .ok_or_else(|| LogError::WrongContextType(key.to_string()))
}

/// Logger published by the middleware.
///
/// # Panics
///
/// Panics if the middleware did not run for this request, or if another
/// value of a different type was stored under the logger key.
pub fn get_logger<B>(req: &Request<B>) -> Logger {
    match try_get_logger(req) {
        Ok(logger) => logger,
        Err(err) => panic!("{err}"),
    }
}

/// `tower` layer producing [`RequestLoggerService`]s.
#[derive(Clone)]
pub struct RequestLoggerLayer {
    dispatch: Arc<Dispatch>,
    request_id_header: Option<HeaderName>,
    echo_request_id: bool,
}

impl RequestLoggerLayer {
    /// Layer without request-ID handling, logging through the process-wide
    /// dispatch.
    pub fn new() -> Self {
        RequestLoggerLayer {
            dispatch: dispatch::global(),
            request_id_header: None,
            echo_request_id: true,
        }
    }

    /// Read the request ID from `header`, generating a UUID v4 when it is
    /// missing or empty, and attach it as the `request_id` field.
    pub fn with_request_id(mut self, header: HeaderName) -> Self {
        self.request_id_header = Some(header);
        self
    }

    pub fn with_default_request_id(self) -> Self {
        self.with_request_id(DEFAULT_REQUEST_ID_HEADER)
    }

    /// Whether the request ID is copied into the response headers.
    pub fn echo_request_id(mut self, echo: bool) -> Self {
        self.echo_request_id = echo;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Arc<Dispatch>) -> Self {
        self.dispatch = dispatch;
        self
    }
}

impl Default for RequestLoggerLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RequestLoggerLayer {
    type Service = RequestLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggerService {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestLoggerService<S> {
    inner: S,
    layer: RequestLoggerLayer,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLoggerService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut logger = Logger::with_dispatch(Arc::clone(&self.layer.dispatch));

        let mut echo = None;
        if let Some(header) = &self.layer.request_id_header {
            let id = request_id(&req, header);
            logger = logger.with("request_id", id.to_str().unwrap_or_default());
            if self.layer.echo_request_id {
                echo = Some((header.clone(), id));
            }
        }

        let guard = SummaryGuard::new(logger.clone(), &req);

        let key = self.layer.dispatch.context_key();
        match req.extensions_mut().get_mut::<RequestContext>() {
            Some(context) => context.insert(key.clone(), logger),
            None => {
                let mut context = RequestContext::new();
                context.insert(key.clone(), logger);
                req.extensions_mut().insert(context);
            }
        }
        req.extensions_mut().insert(LoggerKey(key));

        // The clone may not be ready; keep the instance `poll_ready` was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let future = inner.call(req);

        Box::pin(async move {
            let mut guard = guard;
            let mut response = future.await?;
            guard.status = response.status();
            if let Some((header, id)) = echo {
                response.headers_mut().append(header, id);
            }
            Ok(response)
        })
    }
}

/// Inbound request ID if present, non-empty and printable, otherwise a new
/// UUID v4.
fn request_id<B>(req: &Request<B>, header: &HeaderName) -> HeaderValue {
    req.headers()
        .get(header)
        .filter(|v| v.to_str().is_ok_and(|s| !s.is_empty()))
        .cloned()
        .unwrap_or_else(|| {
            let id = Uuid::new_v4().hyphenated().to_string();
            HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static(""))
        })
}

fn client_ip(extensions: &Extensions) -> String {
    connect_info(extensions)
        .or_else(|| extensions.get::<SocketAddr>().copied())
        .map(|addr| addr.to_string())
        .unwrap_or_default()
}

#[cfg(feature = "axum")]
fn connect_info(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
}

#[cfg(not(feature = "axum"))]
fn connect_info(_extensions: &Extensions) -> Option<SocketAddr> {
    None
}

/// Emits the per-request summary when dropped.
struct SummaryGuard {
    logger: Logger,
    method: String,
    client_ip: String,
    path: String,
    status: StatusCode,
}

impl SummaryGuard {
    fn new<B>(logger: Logger, req: &Request<B>) -> Self {
        SummaryGuard {
            logger,
            method: req.method().to_string(),
            client_ip: client_ip(req.extensions()),
            path: req.uri().path().to_string(),
            status: StatusCode::OK,
        }
    }
}

impl Drop for SummaryGuard {
    fn drop(&mut self) {
        let summary = self
            .logger
            .with("status", self.status.as_u16())
            .with("method", std::mem::take(&mut self.method))
            .with("client_ip", std::mem::take(&mut self.client_ip))
            .with("path", std::mem::take(&mut self.path));

        // A second panic while unwinding would abort the process.
        if std::thread::panicking() {
            if let Err(err) = summary.try_log(Level::Debug, "request", &[]) {
                eprintln!("fieldlog: request summary lost: {err}");
            }
        } else {
            summary.debug("request", &[]);
        }
    }
}

#[cfg(feature = "axum")]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Logger {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        try_get_logger_from(&parts.extensions)
            .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
    }
}
