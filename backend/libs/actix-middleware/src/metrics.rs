//! Prometheus HTTP metrics
//!
//! Labels use the matched route pattern and the caller's role so series stay
//! bounded no matter what ids appear in query strings.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use prometheus::{HistogramVec, IntCounterVec, IntGauge};
use std::time::Instant;

use crate::jwt_auth::AuthenticatedUser;

const UNMATCHED_ROUTE: &str = "unmatched";
const ANONYMOUS: &str = "anonymous";

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        &["method", "route", "status", "role"]
    ).expect("http_requests_total registers once");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency",
        &["method", "route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).expect("http_request_duration_seconds registers once");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGauge = prometheus::register_int_gauge!(
        "http_requests_in_flight",
        "Requests currently being served"
    ).expect("http_requests_in_flight registers once");
}

/// Role label for a finished request; unauthenticated traffic is "anonymous"
fn role_label<B>(res: &ServiceResponse<B>) -> &'static str {
    res.request()
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.role().as_str())
        .unwrap_or(ANONYMOUS)
}

/// Prometheus metrics middleware factory
#[derive(Clone, Default)]
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService { service }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

        HTTP_REQUESTS_IN_FLIGHT.inc();
        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            HTTP_REQUESTS_IN_FLIGHT.dec();

            let res = result?;
            let status = res.status().as_u16().to_string();

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &route, &status, role_label(&res)])
                .inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route])
                .observe(start.elapsed().as_secs_f64());

            Ok(res)
        })
    }
}
