//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use breeze::{Context, Handler};

/// Build a bodyless request for the given method and URI.
pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

/// Build a GET request for the given URI.
pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri)
}

/// Collect a response body into a string.
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

/// Terminal handler responding 200 with the given text.
pub fn send_text(text: &'static str) -> Handler {
    Handler::endpoint(move |mut ctx: Context| async move {
        ctx.send(text);
        Ok(ctx)
    })
}

/// Middleware appending `tag` to the `x-order` response header before
/// continuing the chain.
pub fn order_tag(tag: &'static str) -> Handler {
    Handler::new(move |mut ctx, next| {
        Box::pin(async move {
            let seen = ctx.header("x-order").unwrap_or_default().to_string();
            let joined = if seen.is_empty() {
                tag.to_string()
            } else {
                format!("{seen},{tag}")
            };
            ctx.set_header("x-order", &joined);
            next.run(ctx).await
        })
    })
}
