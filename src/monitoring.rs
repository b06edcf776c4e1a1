//! Prometheus metrics: request counts and latencies, status cache hits, and
//! document and verification outcomes. Rendered on the admin `/metrics`
//! endpoint.

use axum::{
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "api_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "api_request_duration_seconds";
pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
pub const DOCUMENTS_PROCESSED_TOTAL: &str = "documents_processed_total";
pub const VERIFICATION_REQUESTS_TOTAL: &str = "verification_requests_total";
pub const ERRORS_TOTAL: &str = "error_total";

/// Cache label for the document status summaries
const STATUS_CACHE: &str = "document_status";

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the process-wide Prometheus recorder on first call and returns
/// a handle for rendering. Later calls return the same handle.
pub fn install_recorder() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let builder = match builder.set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                DURATION_BUCKETS,
            ) {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::warn!("Falling back to summary latencies: {}", e);
                    PrometheusBuilder::new()
                }
            };

            let recorder = builder.build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("A metrics recorder was already installed");
            }
            handle
        })
        .clone()
}

/// Middleware counting every request by method, route template and status
pub async fn track_requests<B>(req: Request<B>, next: Next<B>) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    let status = response.status();

    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "endpoint" => endpoint.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method,
        "endpoint" => endpoint.clone()
    )
    .record(started.elapsed().as_secs_f64());

    if status.is_client_error() || status.is_server_error() {
        let kind = if status.is_server_error() {
            "server_error"
        } else {
            "client_error"
        };
        metrics::counter!(ERRORS_TOTAL, "type" => kind, "endpoint" => endpoint).increment(1);
    }

    response
}

pub fn record_cache_lookup(hit: bool) {
    let name = if hit { CACHE_HITS_TOTAL } else { CACHE_MISSES_TOTAL };
    metrics::counter!(name, "cache_type" => STATUS_CACHE).increment(1);
}

/// Counts a document lifecycle event such as `uploaded` or a new status
pub fn record_document(status: impl Into<String>) {
    metrics::counter!(DOCUMENTS_PROCESSED_TOTAL, "status" => status.into()).increment(1);
}

pub fn record_verification(status: impl Into<String>) {
    metrics::counter!(VERIFICATION_REQUESTS_TOTAL, "status" => status.into()).increment(1);
}

/// Prometheus text exposition
pub struct Exposition(pub String);

impl IntoResponse for Exposition {
    fn into_response(self) -> Response {
        (
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            self.0,
        )
            .into_response()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Reads the sample of `name` whose labels include every pair in `labels`
    pub(crate) fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> f64 {
        rendered
            .lines()
            .filter(|line| line.starts_with(&format!("{}{{", name)))
            .filter(|line| {
                labels
                    .iter()
                    .all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v)))
            })
            .filter_map(|line| line.rsplit(' ').next()?.parse::<f64>().ok())
            .sum()
    }

    #[test]
    fn test_install_recorder_is_idempotent() {
        let _ = install_recorder();
        record_document("uploaded");
        let rendered = install_recorder().render();
        assert!(sample(&rendered, DOCUMENTS_PROCESSED_TOTAL, &[("status", "uploaded")]) >= 1.0);
    }

    #[test]
    fn test_cache_counters_move() {
        let handle = install_recorder();
        let labels = [("cache_type", STATUS_CACHE)];
        let hits = sample(&handle.render(), CACHE_HITS_TOTAL, &labels);
        let misses = sample(&handle.render(), CACHE_MISSES_TOTAL, &labels);

        record_cache_lookup(true);
        record_cache_lookup(false);
        record_cache_lookup(false);

        let rendered = handle.render();
        assert!(sample(&rendered, CACHE_HITS_TOTAL, &labels) >= hits + 1.0);
        assert!(sample(&rendered, CACHE_MISSES_TOTAL, &labels) >= misses + 2.0);
    }

    #[test]
    fn test_outcome_counters_move() {
        let handle = install_recorder();
        let before = sample(
            &handle.render(),
            VERIFICATION_REQUESTS_TOTAL,
            &[("status", "rejected")],
        );

        record_verification("rejected");

        let after = sample(
            &handle.render(),
            VERIFICATION_REQUESTS_TOTAL,
            &[("status", "rejected")],
        );
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_sample_matches_all_labels() {
        let rendered = "# TYPE x counter\nx{a=\"1\",b=\"2\"} 3\nx{a=\"1\",b=\"9\"} 4\ny{a=\"1\"} 7\n";
        assert_eq!(sample(rendered, "x", &[("a", "1"), ("b", "2")]), 3.0);
        assert_eq!(sample(rendered, "x", &[("a", "1")]), 7.0);
        assert_eq!(sample(rendered, "x", &[("a", "5")]), 0.0);
    }
}
