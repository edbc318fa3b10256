//! Per-request pipeline execution.
//!
//! # Responsibilities
//! - Define the stage (handler/middleware) callback type
//! - Drive stages strictly in registration order via the `Next` continuation
//! - Stop advancing once a response has been sent
//! - Wrap stage failures with request context before surfacing them
//!
//! # Design Decisions
//! - The context is passed by value through the chain and handed back,
//!   avoiding shared mutability between stages
//! - Omitting the `next.run(...)` call ends the pipeline for that request;
//!   an unsent pipeline resolves to 404 instead of hanging
//! - Stage futures are boxed so chains of any depth compose

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::RawPathParams;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use tracing::{debug, error};

use crate::context::Context;
use crate::error::{Error, Result};

/// Boxed future returned by every pipeline stage.
pub type StageFuture = Pin<Box<dyn Future<Output = Result<Context>> + Send>>;

/// A single pipeline stage: a route handler or a middleware callback.
///
/// Stages receive the context by value together with the continuation
/// signal. A stage that intends the chain to continue calls
/// `next.run(ctx).await`; a stage that responds simply writes to the
/// context and returns it.
#[derive(Clone)]
pub struct Handler {
    f: Arc<dyn Fn(Context, Next) -> StageFuture + Send + Sync>,
}

impl Handler {
    /// Full middleware form: receives the context and the continuation.
    ///
    /// ```ignore
    /// Handler::new(|ctx, next| Box::pin(async move {
    ///     let mut ctx = next.run(ctx).await?;
    ///     ctx.set_header("x-served-by", "breeze");
    ///     Ok(ctx)
    /// }));
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Context, Next) -> StageFuture + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Terminal form: a handler that produces the response and never
    /// continues the chain.
    pub fn endpoint<F, Fut>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Context>> + Send + 'static,
    {
        Self::new(move |ctx, _next| Box::pin(f(ctx)))
    }

    pub(crate) fn call(&self, ctx: Context, next: Next) -> StageFuture {
        (self.f)(ctx, next)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler")
    }
}

/// Conversion into an ordered handler chain, so registration calls accept a
/// single handler, an array, or a vector.
pub trait IntoHandlerChain {
    fn into_chain(self) -> Vec<Handler>;
}

impl IntoHandlerChain for Handler {
    fn into_chain(self) -> Vec<Handler> {
        vec![self]
    }
}

impl IntoHandlerChain for Vec<Handler> {
    fn into_chain(self) -> Vec<Handler> {
        self
    }
}

impl<const N: usize> IntoHandlerChain for [Handler; N] {
    fn into_chain(self) -> Vec<Handler> {
        self.into()
    }
}

/// Continuation signal handed to each stage alongside the context.
///
/// Calling `run` passes control to the next stage in registration order.
/// Once a stage has sent a response, `run` becomes a no-op: the first
/// writer wins and later stages are not invoked.
pub struct Next {
    stages: Arc<[Handler]>,
    index: usize,
}

impl Next {
    pub(crate) fn start(stages: Arc<[Handler]>) -> Self {
        Self { stages, index: 0 }
    }

    /// Invoke the next pipeline stage, or return the context unchanged if
    /// the chain is exhausted or a response was already sent.
    pub async fn run(mut self, ctx: Context) -> Result<Context> {
        if ctx.sent() {
            return Ok(ctx);
        }
        let Some(stage) = self.stages.get(self.index).cloned() else {
            return Ok(ctx);
        };
        self.index += 1;
        stage.call(ctx, self).await
    }
}

/// Execute a chain against a matched request and emit the response.
pub(crate) async fn dispatch(
    stages: Arc<[Handler]>,
    params: RawPathParams,
    req: Request<Body>,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let ctx = match Context::from_request(&params, req).await {
        Ok(ctx) => ctx,
        Err(err) => {
            let status = match err {
                Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            error!(method = %method, path = %path, error = %err, "failed to build request context");
            return error_response(status, &err);
        }
    };

    debug!(method = %method, path = %path, stages = stages.len(), "dispatching pipeline");

    match Next::start(stages).run(ctx).await {
        Ok(ctx) => ctx.into_response(),
        Err(err) => {
            // Wrap with request context; the original message is preserved.
            let wrapped = match err {
                e @ Error::Handler { .. } => e,
                other => Error::Handler {
                    method: method.clone(),
                    path: path.clone(),
                    message: other.to_string(),
                },
            };
            error!(method = %method, path = %path, error = %wrapped, "pipeline stage failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &wrapped)
        }
    }
}

fn error_response(status: StatusCode, err: &Error) -> Response {
    let body = serde_json::json!({ "error": err.to_string() });
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("application/json"),
    );
    response
}
