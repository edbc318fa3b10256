//! Merged request/response view handed to pipeline stages.
//!
//! # Responsibilities
//! - Snapshot the incoming request (method, path, headers, params, query,
//!   cookies, buffered body) at construction
//! - Own the outgoing response state (status, headers, body, sent flag)
//! - Resolve merged lookups with response-side precedence
//!
//! # Design Decisions
//! - Response writes are first-write-wins: once `sent` is set, later body
//!   writes are ignored (the chain also stops advancing, see routing)
//! - Absent fields yield `None`, never a panic
//! - Duplicate params/query keys resolve last-write-wins

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::RawPathParams;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Version};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result, ValidationFailures};

/// Upper bound when buffering a request body into the context. Large-upload
/// policies belong to the body-limit middleware, which runs first.
const BODY_BUFFER_LIMIT: usize = 16 * 1024 * 1024;

/// Per-request context unifying read access to the request and write access
/// to the response.
///
/// Request fields are snapshotted when the context is built; response state
/// is owned by the context, so stages observe each other's writes.
#[derive(Debug)]
pub struct Context {
    method: Method,
    path: String,
    version: Version,
    req_headers: HeaderMap,
    params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Bytes,

    status: StatusCode,
    res_headers: HeaderMap,
    res_body: Bytes,
    sent: bool,
}

impl Context {
    /// Build a context from a matched request, buffering the body.
    pub(crate) async fn from_request(params: &RawPathParams, req: Request<Body>) -> Result<Self> {
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();

        let query = parts
            .uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(parse_cookie_header)
            .unwrap_or_default();

        let body = to_bytes(body, BODY_BUFFER_LIMIT).await.map_err(|e| {
            if is_length_limit(&e) {
                Error::PayloadTooLarge {
                    path: path.clone(),
                    limit: BODY_BUFFER_LIMIT,
                }
            } else {
                Error::Handler {
                    method: method.clone(),
                    path: path.clone(),
                    message: format!("failed to read request body: {e}"),
                }
            }
        })?;

        Ok(Self {
            method,
            path,
            version: parts.version,
            req_headers: parts.headers,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            query,
            cookies,
            body,
            status: StatusCode::OK,
            res_headers: HeaderMap::new(),
            res_body: Bytes::new(),
            sent: false,
        })
    }

    // ---- request side ----

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Path parameter by name; duplicate names resolve to the last occurrence.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter by name; duplicate keys resolve to the last occurrence.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Request header by name (case-insensitive).
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.req_headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Raw buffered body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, if valid.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    // ---- merged view ----

    /// Header lookup across both sides: the response's own headers take
    /// precedence over the request's.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.res_headers
            .get(name)
            .or_else(|| self.req_headers.get(name))
            .and_then(|v| v.to_str().ok())
    }

    /// Merged lookup by key: response headers first, then path params, query
    /// parameters, request headers and cookies. Absent everywhere is `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.res_headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .or_else(|| self.param(key))
            .or_else(|| self.query(key))
            .or_else(|| self.request_header(key))
            .or_else(|| self.cookie(key))
    }

    // ---- response side ----

    /// Set the response status. Chainable; does not mark the response sent.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Set or replace a response header. Invalid names/values are skipped
    /// with a warning rather than aborting the pipeline.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.res_headers.insert(name, value);
            }
            _ => {
                warn!(header = name, "skipping invalid response header");
            }
        }
        self
    }

    /// Write the response body and mark the response sent. A second write is
    /// ignored: the first stage to send wins.
    pub fn send(&mut self, body: impl Into<Bytes>) -> &mut Self {
        if self.sent {
            debug!(path = %self.path, "response already sent; ignoring later write");
            return self;
        }
        self.res_body = body.into();
        self.sent = true;
        self
    }

    /// Serialize `value` as a JSON response body and mark the response sent.
    pub fn json_response<T: Serialize>(&mut self, value: &T) -> Result<&mut Self> {
        if self.sent {
            debug!(path = %self.path, "response already sent; ignoring later write");
            return Ok(self);
        }
        let bytes = serde_json::to_vec(value).map_err(|e| Error::Handler {
            method: self.method.clone(),
            path: self.path.clone(),
            message: format!("failed to serialize JSON response: {e}"),
        })?;
        self.res_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.res_body = Bytes::from(bytes);
        self.sent = true;
        Ok(self)
    }

    /// Respond with a 302 redirect to `location`.
    pub fn redirect(&mut self, location: &str) -> &mut Self {
        self.status = StatusCode::FOUND;
        self.set_header(header::LOCATION.as_str(), location);
        self.send(Bytes::new())
    }

    /// Respond 422 with the field → reason map produced by a validator.
    pub fn validation_failed(&mut self, failures: ValidationFailures) -> Result<&mut Self> {
        self.status = StatusCode::UNPROCESSABLE_ENTITY;
        self.json_response(&serde_json::json!({ "errors": failures }))
    }

    /// Whether a stage has already written the response.
    pub fn sent(&self) -> bool {
        self.sent
    }

    /// Current response status (as last set; meaningful once sent).
    pub fn response_status(&self) -> StatusCode {
        self.status
    }

    /// Emit the final response. A pipeline that completed without sending
    /// anything is answered 404 rather than left hanging.
    pub(crate) fn into_response(self) -> Response {
        if !self.sent {
            debug!(method = %self.method, path = %self.path, "pipeline completed without a response; answering 404");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NOT_FOUND;
            return response;
        }
        let mut response = Response::new(Body::from(self.res_body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.res_headers;
        response
    }

    /// Test-only constructor with no underlying connection.
    #[cfg(test)]
    pub(crate) fn for_test(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            version: Version::HTTP_11,
            req_headers: HeaderMap::new(),
            params: Vec::new(),
            query: Vec::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            status: StatusCode::OK,
            res_headers: HeaderMap::new(),
            res_body: Bytes::new(),
            sent: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn push_request_state(
        &mut self,
        params: Vec<(String, String)>,
        query: Vec<(String, String)>,
        headers: HeaderMap,
        body: Bytes,
    ) {
        self.params = params;
        self.query = query;
        self.req_headers = headers;
        self.body = body;
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}

fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
