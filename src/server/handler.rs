// src/server/handler.rs
use crate::metrics::MetricsRegistry;
use crate::monitor::MonitorHandle;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

pub const STATUS_PATH: &str = "/status";

#[derive(Debug, Serialize)]
struct StatusBody {
    is_live: bool,
    last_checked: Option<chrono::DateTime<chrono::Utc>>,
    enabled: bool,
}

/// Read-only ops endpoints: Prometheus metrics and the current stream status.
#[derive(Clone)]
pub struct OpsHandler {
    monitor: MonitorHandle,
    registry: Arc<MetricsRegistry>,
    metrics_path: Arc<str>,
}

impl OpsHandler {
    pub fn new(monitor: MonitorHandle, registry: Arc<MetricsRegistry>, metrics_path: &str) -> Self {
        Self {
            monitor,
            registry,
            metrics_path: Arc::from(metrics_path),
        }
    }

    async fn handle(&self, req: Request<Body>) -> Response<Body> {
        if req.method() != Method::GET {
            return text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        let path = req.uri().path().to_string();
        if path == *self.metrics_path {
            let mut response = Response::new(Body::from(self.registry.gather()));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        } else if path == STATUS_PATH {
            let status = self.monitor.get_status().await;
            let body = StatusBody {
                is_live: status.is_live,
                last_checked: status.last_checked,
                enabled: self.monitor.is_enabled(),
            };
            match serde_json::to_vec(&body) {
                Ok(json) => {
                    let mut response = Response::new(Body::from(json));
                    response
                        .headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    response
                }
                Err(e) => {
                    tracing::error!(%e, "Failed to encode status");
                    text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                }
            }
        } else {
            text(StatusCode::NOT_FOUND, "Not Found")
        }
    }
}

fn text(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}

impl Service<Request<Body>> for OpsHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}
