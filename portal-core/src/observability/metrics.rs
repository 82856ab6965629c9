use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Served requests
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Calls this portal issues against the backend REST API
pub static BACKEND_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let request_duration = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let backend_requests = IntCounterVec::new(
        Opts::new(
            "backend_requests_total",
            "Requests issued against the backend REST API",
        ),
        &["method", "outcome"],
    )
    .expect("metric can be created");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(backend_requests.clone()))
        .expect("collector can be registered");

    // Repeated init (tests) keeps the first registry.
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = BACKEND_REQUESTS_TOTAL.set(backend_requests);
}

/// Count one backend call. `outcome` is "ok", "error", or "transport".
pub fn record_backend_request(method: &str, outcome: &str) {
    if let Some(counter) = BACKEND_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, outcome]).inc();
    }
}

/// Render the registry in the Prometheus text exposition format.
pub fn gather() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };
    let metric_families = registry.gather();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_reports_backend_counter() {
        init_metrics();
        record_backend_request("GET", "ok");

        let exposition = gather();
        assert!(exposition.contains("backend_requests_total"));
    }
}
