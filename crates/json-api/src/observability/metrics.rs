//! Prometheus metrics collection and exposition endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
    core::Collector,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

#[derive(Debug)]
struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    checkouts_total: IntCounterVec,
    orders_created_total: IntCounterVec,
    order_actions_total: IntCounterVec,
    settlements_total: IntCounterVec,
}

static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

/// How a checkout attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckoutOutcome {
    Placed,
    Rejected,
    Failed,
}

impl CheckoutOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug)]
pub(super) struct InFlightRequestGuard {
    tracked: bool,
}

impl InFlightRequestGuard {
    pub(super) fn track() -> Self {
        if let Some(metrics) = metrics() {
            metrics.requests_in_flight.inc();
            return Self { tracked: true };
        }

        Self { tracked: false }
    }
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_class = status_class(status_code);
    let status_code = status_code.to_string();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class, status_code.as_str()])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(duration_seconds);
}

/// Count one checkout attempt, plus the per-market orders it produced.
pub(crate) fn record_checkout(outcome: CheckoutOutcome, orders_created: usize) {
    let Some(metrics) = metrics() else {
        return;
    };

    metrics
        .checkouts_total
        .with_label_values(&[outcome.as_str()])
        .inc();

    if orders_created > 0 {
        metrics
            .orders_created_total
            .with_label_values(&["checkout"])
            .inc_by(u64::try_from(orders_created).unwrap_or(u64::MAX));
    }
}

/// Count an order placed directly against one market.
pub(crate) fn record_direct_order() {
    if let Some(metrics) = metrics() {
        metrics
            .orders_created_total
            .with_label_values(&["direct"])
            .inc();
    }
}

/// Count a lifecycle action attempted on an order.
pub(crate) fn record_order_action(action: &str, succeeded: bool) {
    let Some(metrics) = metrics() else {
        return;
    };

    metrics
        .order_actions_total
        .with_label_values(&[action, outcome_label(succeeded)])
        .inc();
}

/// Count a ledger settlement, by where it came from (`webhook`, `sync`, `manual`).
pub(crate) fn record_settlement(source: &str, succeeded: bool) {
    let Some(metrics) = metrics() else {
        return;
    };

    metrics
        .settlements_total
        .with_label_values(&[source, outcome_label(succeeded)])
        .inc();
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();

    let mut encoded = Vec::new();

    if let Err(source) = encoder.encode(&metric_families, &mut encoded) {
        error!("failed to encode metrics response: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    let content_type = match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => value,
        Err(source) => {
            error!("failed to encode metrics content type header: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            return;
        }
    };

    res.headers_mut().insert(CONTENT_TYPE, content_type);
    res.render(String::from_utf8_lossy(&encoded).into_owned());
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get_or_init(build_metrics).as_ref()
}

fn counter(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Option<IntCounterVec> {
    let metric = match IntCounterVec::new(Opts::new(name, help), labels) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create {name} metric: {source}");
            return None;
        }
    };

    register(registry, name, &metric)?;

    Some(metric)
}

fn register<C>(registry: &Registry, name: &str, metric: &C) -> Option<()>
where
    C: Collector + Clone + 'static,
{
    if let Err(source) = registry.register(Box::new(metric.clone())) {
        error!("failed to register {name} metric: {source}");
        return None;
    }

    Some(())
}

fn build_metrics() -> Option<Metrics> {
    let registry = Registry::new();

    let requests_total = counter(
        &registry,
        "bazaar_json_http_requests_total",
        "Total HTTP requests partitioned by method, route, status class, and status code.",
        &["method", "route", "status_class", "status_code"],
    )?;

    let request_duration_seconds = match HistogramVec::new(
        HistogramOpts::new(
            "bazaar_json_http_request_duration_seconds",
            "HTTP request duration in seconds partitioned by method and route.",
        )
        .buckets(vec![
            0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "route"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create request_duration metric: {source}");
            return None;
        }
    };

    register(
        &registry,
        "bazaar_json_http_request_duration_seconds",
        &request_duration_seconds,
    )?;

    let requests_in_flight = match IntGauge::with_opts(Opts::new(
        "bazaar_json_http_requests_in_flight",
        "Current number of in-flight HTTP requests.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create in-flight gauge metric: {source}");
            return None;
        }
    };

    register(
        &registry,
        "bazaar_json_http_requests_in_flight",
        &requests_in_flight,
    )?;

    let checkouts_total = counter(
        &registry,
        "bazaar_json_checkouts_total",
        "Checkout attempts partitioned by outcome.",
        &["outcome"],
    )?;

    let orders_created_total = counter(
        &registry,
        "bazaar_json_orders_created_total",
        "Orders created partitioned by source.",
        &["source"],
    )?;

    let order_actions_total = counter(
        &registry,
        "bazaar_json_order_actions_total",
        "Order lifecycle actions partitioned by action and outcome.",
        &["action", "outcome"],
    )?;

    let settlements_total = counter(
        &registry,
        "bazaar_json_settlements_total",
        "Ledger settlements partitioned by source and outcome.",
        &["source", "outcome"],
    )?;

    Some(Metrics {
        registry,
        requests_total,
        request_duration_seconds,
        requests_in_flight,
        checkouts_total,
        orders_created_total,
        order_actions_total,
        settlements_total,
    })
}

fn outcome_label(succeeded: bool) -> &'static str {
    if succeeded { "success" } else { "failure" }
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
