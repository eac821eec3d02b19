//! Prometheus metrics endpoint.

use crate::server::{PushRelay, RelayMetrics};
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
pub async fn metrics_handler(Extension(relay): Extension<Arc<PushRelay>>) -> impl IntoResponse {
    let body = render(relay.metrics(), relay.manager().len());

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

fn render(m: &RelayMetrics, providers: usize) -> String {
    let batches = m.batches_total.load(Ordering::Relaxed);
    let received = m.pushes_received.load(Ordering::Relaxed);
    let delivered = m.pushes_delivered.load(Ordering::Relaxed);
    let unknown_destination = m.unknown_destination_errors.load(Ordering::Relaxed);
    let unknown_provider = m.unknown_provider_errors.load(Ordering::Relaxed);
    let provider = m.provider_errors.load(Ordering::Relaxed);
    let invalid = m.invalid_requests.load(Ordering::Relaxed);
    let internal = m.internal_errors.load(Ordering::Relaxed);

    format!(
        r#"# HELP zeropush_providers Number of configured push providers
# TYPE zeropush_providers gauge
zeropush_providers {providers}

# HELP zeropush_info Server information
# TYPE zeropush_info gauge
zeropush_info{{version="{version}"}} 1

# HELP zeropush_batches_total Total push batches received
# TYPE zeropush_batches_total counter
zeropush_batches_total {batches}

# HELP zeropush_pushes_received_total Total pushes received
# TYPE zeropush_pushes_received_total counter
zeropush_pushes_received_total {received}

# HELP zeropush_pushes_delivered_total Total pushes delivered to a provider
# TYPE zeropush_pushes_delivered_total counter
zeropush_pushes_delivered_total {delivered}

# HELP zeropush_failures_total Aborted batches by failure kind
# TYPE zeropush_failures_total counter
zeropush_failures_total{{kind="unknown_destination"}} {unknown_destination}
zeropush_failures_total{{kind="unknown_provider"}} {unknown_provider}
zeropush_failures_total{{kind="provider"}} {provider}
zeropush_failures_total{{kind="invalid_request"}} {invalid}
zeropush_failures_total{{kind="internal"}} {internal}
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use push_types::ErrorKind;

    #[test]
    fn render_includes_counters() {
        let metrics = RelayMetrics::default();
        metrics.pushes_delivered.fetch_add(5, Ordering::Relaxed);
        metrics.record_failure(ErrorKind::Provider);

        let body = render(&metrics, 2);
        assert!(body.contains("zeropush_providers 2"));
        assert!(body.contains("zeropush_pushes_delivered_total 5"));
        assert!(body.contains("zeropush_failures_total{kind=\"provider\"} 1"));
    }

    #[test]
    fn internal_failures_have_their_own_series() {
        let metrics = RelayMetrics::default();
        metrics.record_failure(ErrorKind::Internal);

        let body = render(&metrics, 1);
        assert!(body.contains("zeropush_failures_total{kind=\"internal\"} 1"));
        assert!(body.contains("zeropush_failures_total{kind=\"invalid_request\"} 0"));
    }
}
