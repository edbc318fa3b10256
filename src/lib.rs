//! Fluent application layer over Axum.
//!
//! breeze re-exposes route registration, middleware attachment,
//! request/response helpers and server lifecycle behind a fluent surface.
//! Routing, serving and the middleware layers themselves are delegated to
//! axum, tokio and tower-http.
//!
//! ```ignore
//! use breeze::{AppManager, ListenOptions, RouteRegistrar, Handler, Context};
//!
//! let mut manager = AppManager::new();
//! let app = manager.initialize();
//!
//! let mut routes = RouteRegistrar::new();
//! routes.route("/hello").get(Handler::endpoint(|mut ctx: Context| async move {
//!     ctx.send("hello");
//!     Ok(ctx)
//! }))?;
//! routes.attach_to(&app)?;
//!
//! manager.listen(ListenOptions::port(3000)).await?;
//! ```

// Core subsystems
pub mod app;
pub mod context;
pub mod error;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod middleware;
pub mod observability;

pub use app::{AppHandle, AppManager, AppRegistry, LifecycleState, ListenOptions, Shutdown};
pub use context::Context;
pub use error::{Error, Result, ValidationFailures};
pub use middleware::{BodyLimitOptions, CorsOptions, MiddlewareFacility, TimeoutOptions};
pub use routing::{Handler, Next, RouteRegistrar};

pub use config::ServerConfig;
