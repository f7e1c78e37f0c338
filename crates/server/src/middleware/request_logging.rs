//! Request logging middleware.
//!
//! For every intercepted request: bind a correlation id (inbound
//! `x-correlation-id` header or freshly generated) for the request's whole
//! lifetime, emit `request_started`, delegate to the wrapped service, and
//! emit exactly one `request_completed` with status and wall-clock duration
//! on every exit path. Handler failures are logged as `request_error` and
//! re-raised unchanged; the middleware is a diagnostic tap, not an error
//! boundary.

use axum::http::header::UPGRADE;
use axum::http::{HeaderMap, Request, Response};
use lantern_core::context;
use lantern_core::pipeline::Logger;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Inbound header carrying a caller-chosen correlation id.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct RequestLoggingLayer {
    logger: Logger,
}

impl RequestLoggingLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogging {
            inner,
            logger: self.logger.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestLogging<S> {
    inner: S,
    logger: Logger,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogging<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Readiness was polled on `self.inner`; swap in the clone so the
        // ready instance is the one driven to completion.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        // Protocol-upgrade traffic passes through untouched, zero logging.
        if is_upgrade(req.headers()) {
            return Box::pin(async move { inner.call(req).await });
        }

        let logger = self.logger.clone();
        let inbound = req
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or_default().to_string();

        Box::pin(context::scope(async move {
            context::set_correlation_id(inbound.as_deref());

            logger.info(
                "request_started",
                &[
                    ("method", Value::String(method.clone())),
                    ("path", Value::String(path.clone())),
                    ("query", Value::String(query)),
                ],
            );

            // Fires the completion event on every exit path, including drop
            // on cancellation.
            let guard = CompletionGuard {
                logger: logger.clone(),
                method,
                path,
                start: Instant::now(),
                fired: false,
            };

            match inner.call(req).await {
                Ok(response) => {
                    guard.complete(response.status().as_u16());
                    Ok(response)
                }
                Err(err) => {
                    logger.error("request_error", &[("error", json!(err.to_string()))]);
                    // guard drops here: completion with status 500
                    Err(err)
                }
            }
        }))
    }
}

fn is_upgrade(headers: &HeaderMap) -> bool {
    headers.contains_key(UPGRADE)
}

struct CompletionGuard {
    logger: Logger,
    method: String,
    path: String,
    start: Instant,
    fired: bool,
}

impl CompletionGuard {
    fn complete(mut self, status: u16) {
        self.emit(status);
        self.fired = true;
    }

    fn emit(&self, status: u16) {
        self.logger.info(
            "request_completed",
            &[
                ("method", Value::String(self.method.clone())),
                ("path", Value::String(self.path.clone())),
                ("status_code", json!(status)),
                ("duration_seconds", json!(self.start.elapsed().as_secs_f64())),
            ],
        );
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        // No status observed before the handler gave up.
        if !self.fired {
            self.emit(500);
        }
    }
}
