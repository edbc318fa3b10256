//! Fluent route registration.
//!
//! # Responsibilities
//! - Accumulate immutable route definitions (method, path, handler chain)
//! - Apply prefixes and group scoping by verbatim concatenation
//! - Snapshot global middleware into every route declared afterwards
//! - Mount the accumulated routes onto an application handle
//!
//! # Design Decisions
//! - Routes are compiled at attach time, immutable at runtime
//! - Declarations for the same (method, path) concatenate their chains in
//!   registration order
//! - Paths are validated before touching the underlying router so failures
//!   surface as errors, not panics

use std::sync::Arc;

use axum::body::Body;
use axum::extract::RawPathParams;
use axum::http::{Method, Request};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use tracing::{debug, info};

use crate::app::AppHandle;
use crate::error::{Error, Result};
use crate::routing::pipeline::{dispatch, Handler, IntoHandlerChain};

/// One registered route: an HTTP method and path bound to an ordered chain
/// of middleware and handlers. Immutable once registered.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pub method: Method,
    pub path: String,
    /// Middleware snapshotted at declaration time; runs before `handlers`.
    pub middleware: Vec<Handler>,
    pub handlers: Vec<Handler>,
}

impl RouteDefinition {
    /// Full execution chain for this route, in order.
    pub(crate) fn chain(&self) -> impl Iterator<Item = &Handler> {
        self.middleware.iter().chain(self.handlers.iter())
    }
}

/// Fluent registrar binding methods and paths to handler chains.
///
/// ```ignore
/// let mut reg = RouteRegistrar::new();
/// reg.global_middleware(request_logger());
/// reg.route("/health").get(health_handler())?;
/// reg.group("/api", |api| {
///     api.route("/users").get(list_users())?.post(create_user())?;
///     Ok(())
/// })?;
/// reg.attach_to(&handle)?;
/// ```
#[derive(Debug, Default)]
pub struct RouteRegistrar {
    /// Prefix applied to every route declared through this registrar.
    base: String,
    /// Working path set by `route()`; methods register against it.
    current_path: Option<String>,
    /// Middleware inherited from enclosing groups.
    inherited: Vec<Handler>,
    /// Global middleware declared on this registrar.
    globals: Vec<Handler>,
    routes: Vec<RouteDefinition>,
}

impl RouteRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working path for subsequent method registrations.
    pub fn route(&mut self, path: impl Into<String>) -> &mut Self {
        self.current_path = Some(path.into());
        self
    }

    /// Prepend `prefix` to the working path. Affects subsequent method
    /// registrations only; already-registered routes are untouched.
    pub fn prefix(&mut self, prefix: &str) -> Result<&mut Self> {
        match self.current_path.take() {
            Some(path) => {
                self.current_path = Some(format!("{prefix}{path}"));
                Ok(self)
            }
            None => Err(Error::BaseRouteNotSet {
                operation: "applying a prefix".into(),
            }),
        }
    }

    /// Register middleware to run, in order, before every route declared
    /// afterwards through this registrar (including inside groups).
    pub fn global_middleware(&mut self, middleware: impl IntoHandlerChain) -> &mut Self {
        self.globals.extend(middleware.into_chain());
        self
    }

    /// Declare routes under `prefix`, sharing this registrar's middleware.
    ///
    /// The prefix is concatenated verbatim with each child path. Middleware
    /// registered on this registrar before the call is prepended to every
    /// route declared inside the group.
    pub fn group<F>(&mut self, prefix: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut RouteRegistrar) -> Result<()>,
    {
        let mut child = RouteRegistrar {
            base: format!("{}{}", self.base, prefix),
            current_path: None,
            inherited: self
                .inherited
                .iter()
                .chain(self.globals.iter())
                .cloned()
                .collect(),
            globals: Vec::new(),
            routes: Vec::new(),
        };
        build(&mut child)?;
        debug!(prefix = %child.base, routes = child.routes.len(), "route group declared");
        self.routes.append(&mut child.routes);
        Ok(self)
    }

    pub fn get(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::GET, handlers)
    }

    pub fn post(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::POST, handlers)
    }

    pub fn put(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::PUT, handlers)
    }

    pub fn delete(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::DELETE, handlers)
    }

    pub fn patch(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::PATCH, handlers)
    }

    pub fn options(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::OPTIONS, handlers)
    }

    pub fn head(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::HEAD, handlers)
    }

    pub fn trace(&mut self, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        self.register(Method::TRACE, handlers)
    }

    /// Routes accumulated so far, in declaration order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    fn register(&mut self, method: Method, handlers: impl IntoHandlerChain) -> Result<&mut Self> {
        let path = self
            .current_path
            .clone()
            .ok_or_else(|| Error::BaseRouteNotSet {
                operation: format!("registering {method} handlers"),
            })?;
        let full_path = format!("{}{}", self.base, path);
        if !full_path.starts_with('/') {
            return Err(Error::RouteRegistration {
                method,
                path: full_path,
                reason: "path must start with '/'".into(),
            });
        }
        let handlers = handlers.into_chain();
        if handlers.is_empty() {
            return Err(Error::RouteRegistration {
                method,
                path: full_path,
                reason: "at least one handler is required".into(),
            });
        }

        debug!(
            method = %method,
            path = %full_path,
            middleware = self.inherited.len() + self.globals.len(),
            handlers = handlers.len(),
            "route declared"
        );

        self.routes.push(RouteDefinition {
            method,
            path: full_path,
            middleware: self
                .inherited
                .iter()
                .chain(self.globals.iter())
                .cloned()
                .collect(),
            handlers,
        });
        Ok(self)
    }

    /// Mount the accumulated routes onto `app`, making them live.
    ///
    /// Chains for repeated (method, path) declarations are concatenated in
    /// registration order. Call once per registrar; attaching the same
    /// routes twice is an overlapping registration in the underlying router.
    pub fn attach_to(&self, app: &AppHandle) -> Result<()> {
        // Group by path, then by method, preserving declaration order.
        let mut grouped: Vec<(String, Vec<(Method, Vec<Handler>)>)> = Vec::new();
        for def in &self.routes {
            let chain: Vec<Handler> = def.chain().cloned().collect();
            let idx = match grouped.iter().position(|(p, _)| *p == def.path) {
                Some(idx) => idx,
                None => {
                    grouped.push((def.path.clone(), Vec::new()));
                    grouped.len() - 1
                }
            };
            let per_path = &mut grouped[idx].1;
            match per_path.iter_mut().find(|(m, _)| *m == def.method) {
                Some((_, existing)) => existing.extend(chain),
                None => per_path.push((def.method.clone(), chain)),
            }
        }

        // The underlying router panics on patterns it cannot insert; check
        // every path against the same matcher first so failures surface as
        // errors carrying the matcher's message.
        let mut patterns: matchit::Router<()> = matchit::Router::new();
        for (path, methods) in &grouped {
            if let Err(e) = patterns.insert(path.clone(), ()) {
                return Err(Error::RouteRegistration {
                    method: methods[0].0.clone(),
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let mut router: Router = Router::new();
        let mut mounted = 0usize;
        for (path, methods) in grouped {
            let mut method_router: MethodRouter = MethodRouter::new();
            for (method, chain) in methods {
                let filter = MethodFilter::try_from(method.clone()).map_err(|e| {
                    Error::RouteRegistration {
                        method: method.clone(),
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let stages: Arc<[Handler]> = chain.into();
                method_router = method_router.on(filter, move |params: RawPathParams, req: Request<Body>| {
                    let stages = stages.clone();
                    async move { dispatch(stages, params, req).await }
                });
                mounted += 1;
            }
            router = router.route(&path, method_router);
        }

        info!(routes = mounted, "routes attached to application");
        app.merge(router);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn noop() -> Handler {
        Handler::endpoint(|mut ctx: Context| async move {
            ctx.send("ok");
            Ok(ctx)
        })
    }

    #[test]
    fn method_before_route_fails_and_registers_nothing() {
        let mut reg = RouteRegistrar::new();
        let err = reg.get(noop()).expect_err("no base route set");
        assert!(matches!(err, Error::BaseRouteNotSet { .. }));
        assert!(reg.routes().is_empty());
    }

    #[test]
    fn route_then_methods_chain_fluently() {
        let mut reg = RouteRegistrar::new();
        reg.route("/users")
            .get(noop())
            .expect("get registers")
            .post(noop())
            .expect("post registers");
        assert_eq!(reg.routes().len(), 2);
        assert_eq!(reg.routes()[0].method, Method::GET);
        assert_eq!(reg.routes()[1].method, Method::POST);
        assert_eq!(reg.routes()[0].path, "/users");
    }

    #[test]
    fn prefix_applies_to_subsequent_registrations_only() {
        let mut reg = RouteRegistrar::new();
        reg.route("/users").get(noop()).expect("registers");
        reg.route("/users");
        reg.prefix("/v2").expect("path is set").get(noop()).expect("registers");
        assert_eq!(reg.routes()[0].path, "/users");
        assert_eq!(reg.routes()[1].path, "/v2/users");
    }

    #[test]
    fn prefix_without_route_fails_naming_the_operation() {
        let mut reg = RouteRegistrar::new();
        let err = reg.prefix("/v2").expect_err("no working path");
        assert!(matches!(err, Error::BaseRouteNotSet { .. }));
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn group_prefixes_children_verbatim() {
        let mut reg = RouteRegistrar::new();
        reg.group("/api", |api| {
            api.route("/users").get(noop())?;
            api.group("/v1", |v1| {
                v1.route("/posts").get(noop())?;
                Ok(())
            })?;
            Ok(())
        })
        .expect("group builds");
        let paths: Vec<&str> = reg.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/users", "/api/v1/posts"]);
    }

    #[test]
    fn global_middleware_snapshots_at_declaration() {
        let mw = Handler::new(|ctx, next| Box::pin(next.run(ctx)));
        let mut reg = RouteRegistrar::new();
        reg.route("/before").get(noop()).expect("registers");
        reg.global_middleware(mw);
        reg.route("/after").get(noop()).expect("registers");

        assert!(reg.routes()[0].middleware.is_empty());
        assert_eq!(reg.routes()[1].middleware.len(), 1);
    }

    #[test]
    fn group_inherits_parent_globals_before_its_own() {
        let parent_mw = Handler::new(|ctx, next| Box::pin(next.run(ctx)));
        let group_mw = Handler::new(|ctx, next| Box::pin(next.run(ctx)));
        let mut reg = RouteRegistrar::new();
        reg.global_middleware(parent_mw);
        reg.group("/api", move |api| {
            api.global_middleware(group_mw);
            api.route("/users").get(noop())?;
            Ok(())
        })
        .expect("group builds");

        // parent global + group global, in that order, before the handler
        assert_eq!(reg.routes()[0].middleware.len(), 2);
        assert_eq!(reg.routes()[0].handlers.len(), 1);
    }

    #[test]
    fn malformed_pattern_is_a_registration_error() {
        let mut reg = RouteRegistrar::new();
        reg.route("/users/{").get(noop()).expect("declaration is accepted");
        let app = AppHandle::new();
        let err = reg.attach_to(&app).expect_err("pattern is invalid");
        assert!(matches!(err, Error::RouteRegistration { .. }));
    }

    #[test]
    fn conflicting_param_names_are_a_registration_error() {
        let mut reg = RouteRegistrar::new();
        reg.route("/users/{id}").get(noop()).expect("registers");
        reg.route("/users/{name}").get(noop()).expect("registers");
        let app = AppHandle::new();
        let err = reg.attach_to(&app).expect_err("parameter names conflict");
        match err {
            Error::RouteRegistration { path, reason, .. } => {
                assert_eq!(path, "/users/{name}");
                assert!(reason.contains("conflict"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_path_is_a_registration_error() {
        let mut reg = RouteRegistrar::new();
        let err = reg.route("users").get(noop()).expect_err("missing slash");
        match err {
            Error::RouteRegistration { path, reason, .. } => {
                assert_eq!(path, "users");
                assert!(reason.contains("start with '/'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_handler_chain_is_rejected() {
        let mut reg = RouteRegistrar::new();
        let err = reg
            .route("/users")
            .get(Vec::<Handler>::new())
            .expect_err("empty chain");
        assert!(matches!(err, Error::RouteRegistration { .. }));
    }
}
