//! Prometheus metrics for gemini-relay.
//!
//! Request outcomes per route plus provider latency, errors and tokens.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static RELAY_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static RELAY_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Provider metrics
pub static GENAI_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GENAI_PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENAI_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("relay_requests_total", "Total number of relay requests"),
        &["route", "status"],
    )
    .expect("Failed to create relay_requests_total metric");

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "relay_request_duration_seconds",
            "Relay request duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["route"],
    )
    .expect("Failed to create relay_request_duration_seconds metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "genai_provider_latency_seconds",
            "AI provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )
    .expect("Failed to create genai_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("genai_provider_errors_total", "Total AI provider errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create genai_provider_errors_total metric");

    let tokens = IntCounterVec::new(
        Opts::new("genai_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create genai_tokens_total metric");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register relay_requests_total");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("Failed to register relay_request_duration_seconds");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register genai_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register genai_provider_errors_total");
    registry
        .register(Box::new(tokens.clone()))
        .expect("Failed to register genai_tokens_total");

    let _ = REGISTRY.set(registry);
    let _ = RELAY_REQUESTS_TOTAL.set(requests_total);
    let _ = RELAY_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = GENAI_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = GENAI_PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = GENAI_TOKENS_TOTAL.set(tokens);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed relay request.
pub fn record_request(route: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = RELAY_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[route, status]).inc();
    }
    if let Some(histogram) = RELAY_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&[route]).observe(duration_secs);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = GENAI_PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = GENAI_PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record token usage for one generation.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = GENAI_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_requests_show_up_in_exposition() {
        init_metrics();
        record_request("generate-text", "200", 0.2);
        record_provider_error("mock", "api_error");

        let text = get_metrics();
        assert!(text.contains("relay_requests_total"));
        assert!(text.contains("route=\"generate-text\""));
        assert!(text.contains("genai_provider_errors_total"));
    }
}
