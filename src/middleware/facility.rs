//! Middleware attachment facility.
//!
//! # Responsibilities
//! - Queue cross-cutting middleware (CORS, body limits, timeouts, request
//!   IDs, trace logging) with caller-supplied passthrough options
//! - Resolve config-driven registrations by name, failing with the backing
//!   package name when it is not linked into this build
//! - Apply the queue to an application so first-registered runs first
//!
//! # Design Decisions
//! - Validation happens before anything is queued: a failing call never
//!   partially registers earlier entries
//! - Layers wrap the whole router at apply time; relative order among
//!   facility middleware is registration order

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, Request};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::app::AppHandle;
use crate::error::{Error, Result};
use crate::middleware::options::{BodyLimitOptions, CorsOptions, TimeoutOptions};

/// Concerns this build knows how to construct, each backed by a linked crate.
#[derive(Debug, Clone)]
enum MiddlewareSpec {
    Cors(CorsOptions),
    BodyLimit(BodyLimitOptions),
    Timeout(TimeoutOptions),
    RequestId,
    Trace,
}

impl MiddlewareSpec {
    fn name(&self) -> &'static str {
        match self {
            MiddlewareSpec::Cors(_) => "cors",
            MiddlewareSpec::BodyLimit(_) => "body_limit",
            MiddlewareSpec::Timeout(_) => "timeout",
            MiddlewareSpec::RequestId => "request_id",
            MiddlewareSpec::Trace => "trace",
        }
    }
}

/// Concerns the source resolved lazily whose backing packages this build
/// deliberately does not link. Attaching one fails with the package name.
const UNLINKED_BACKINGS: &[(&str, &str)] = &[
    ("session", "tower-sessions"),
    ("csrf", "axum-csrf"),
    ("flash", "axum-flash"),
    ("multipart", "axum_typed_multipart"),
    ("file_upload", "axum_typed_multipart"),
];

/// Generates `x-request-id` values with UUID v4.
#[derive(Clone, Copy, Default)]
struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Ordered queue of cross-cutting middleware, applied atomically to an
/// application handle.
#[derive(Debug, Default)]
pub struct MiddlewareFacility {
    queued: Vec<MiddlewareSpec>,
}

impl MiddlewareFacility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a CORS layer with the given passthrough options.
    pub fn cors(&mut self, options: CorsOptions) -> &mut Self {
        self.push(MiddlewareSpec::Cors(options))
    }

    /// Queue a request body size limit.
    pub fn body_limit(&mut self, options: BodyLimitOptions) -> &mut Self {
        self.push(MiddlewareSpec::BodyLimit(options))
    }

    /// Queue a whole-request timeout.
    pub fn timeout(&mut self, options: TimeoutOptions) -> &mut Self {
        self.push(MiddlewareSpec::Timeout(options))
    }

    /// Queue `x-request-id` generation and propagation (UUID v4).
    pub fn request_id(&mut self) -> &mut Self {
        self.push(MiddlewareSpec::RequestId)
    }

    /// Queue HTTP trace logging for every request.
    pub fn trace(&mut self) -> &mut Self {
        self.push(MiddlewareSpec::Trace)
    }

    /// Config-driven registration by name.
    ///
    /// Known names deserialize `options` into the concern's option object
    /// and queue it. Names whose backing package is not linked into this
    /// build fail with [`Error::MissingDependency`] naming that package;
    /// nothing is queued in that case.
    pub fn enable(&mut self, name: &str, options: &toml::Table) -> Result<&mut Self> {
        let spec = match name {
            "cors" => MiddlewareSpec::Cors(parse_options(name, options)?),
            "body_limit" => MiddlewareSpec::BodyLimit(parse_options(name, options)?),
            "timeout" => MiddlewareSpec::Timeout(parse_options(name, options)?),
            "request_id" => MiddlewareSpec::RequestId,
            "trace" => MiddlewareSpec::Trace,
            other => {
                let package = UNLINKED_BACKINGS
                    .iter()
                    .find(|(n, _)| *n == other)
                    .map(|(_, pkg)| *pkg)
                    .unwrap_or(other);
                return Err(Error::MissingDependency {
                    name: other.to_string(),
                    package: package.to_string(),
                });
            }
        };
        Ok(self.push(spec))
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Wrap the application's router with the queued layers and drain the
    /// queue. The first-registered middleware ends up outermost, so it runs
    /// first on every request.
    pub fn apply(&mut self, app: &AppHandle) {
        let specs = std::mem::take(&mut self.queued);
        let count = specs.len();
        app.map_router(move |mut router| {
            for spec in specs.into_iter().rev() {
                router = apply_spec(router, spec);
            }
            router
        });
        info!(middleware = count, "middleware applied to application");
    }

    fn push(&mut self, spec: MiddlewareSpec) -> &mut Self {
        debug!(middleware = spec.name(), position = self.queued.len(), "middleware queued");
        self.queued.push(spec);
        self
    }
}

fn parse_options<T: serde::de::DeserializeOwned>(name: &str, options: &toml::Table) -> Result<T> {
    toml::Value::Table(options.clone())
        .try_into()
        .map_err(|e| Error::MiddlewareOptions {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn apply_spec(router: Router, spec: MiddlewareSpec) -> Router {
    match spec {
        MiddlewareSpec::Cors(options) => router.layer(build_cors(options)),
        MiddlewareSpec::BodyLimit(options) => {
            router.layer(RequestBodyLimitLayer::new(options.max_bytes))
        }
        MiddlewareSpec::Timeout(options) => {
            router.layer(TimeoutLayer::new(Duration::from_secs(options.secs)))
        }
        MiddlewareSpec::RequestId => router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeUuidRequestId)),
        MiddlewareSpec::Trace => router.layer(TraceLayer::new_for_http()),
    }
}

fn build_cors(options: CorsOptions) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if let Some(origins) = options.origins {
        if origins.iter().any(|o| o == "*") {
            layer = layer.allow_origin(AllowOrigin::from(Any));
        } else {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!(origin = %o, "skipping invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer = layer.allow_origin(AllowOrigin::list(values));
        }
    }

    if let Some(methods) = options.methods {
        if methods.iter().any(|m| m == "*") {
            layer = layer.allow_methods(AllowMethods::from(Any));
        } else {
            let parsed: Vec<Method> = methods
                .iter()
                .filter_map(|m| match m.parse::<Method>() {
                    Ok(m) => Some(m),
                    Err(_) => {
                        warn!(method = %m, "skipping invalid CORS method");
                        None
                    }
                })
                .collect();
            layer = layer.allow_methods(parsed);
        }
    }

    if let Some(headers) = options.allowed_headers {
        if headers.iter().any(|h| h == "*") {
            layer = layer.allow_headers(AllowHeaders::from(Any));
        } else {
            let parsed: Vec<HeaderName> = headers
                .iter()
                .filter_map(|h| match h.parse::<HeaderName>() {
                    Ok(h) => Some(h),
                    Err(_) => {
                        warn!(header = %h, "skipping invalid CORS header");
                        None
                    }
                })
                .collect();
            layer = layer.allow_headers(parsed);
        }
    }

    if let Some(credentials) = options.credentials {
        layer = layer.allow_credentials(credentials);
    }

    if let Some(secs) = options.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    layer
}
