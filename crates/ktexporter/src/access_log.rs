//! Access logging middleware.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use tracing::{debug, info};

/// Logs one line per request. Requests to `quiet_path` (the telemetry
/// endpoint, hit on every scrape) are logged at debug level.
#[derive(Clone)]
pub(crate) struct AccessLogLayer {
    quiet_path: Arc<str>,
}

impl AccessLogLayer {
    pub(crate) fn new(quiet_path: &str) -> Self {
        Self {
            quiet_path: Arc::from(quiet_path),
        }
    }
}

impl<S> tower::Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            quiet_path: self.quiet_path.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AccessLogService<S> {
    inner: S,
    quiet_path: Arc<str>,
}

impl<S> tower::Service<Request> for AccessLogService<S>
where
    S: tower::Service<Request, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let client = req
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| "-".to_owned());
        let quiet = path == *self.quiet_path || path == "/favicon.ico";
        let t0 = Instant::now();

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.call(req).await?;
            let latency_ms = t0.elapsed().as_millis() as u64;
            let status = response.status().as_u16();
            if quiet {
                debug!(client, status, latency_ms, "{method} {path}");
            } else {
                info!(client, status, latency_ms, "{method} {path}");
            }
            Ok(response)
        })
    }
}
