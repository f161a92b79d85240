//! # Prometheus Metrics
//!
//! Request and ledger counters recorded through the `metrics` facade and
//! exported in Prometheus text format at `/metrics`.
//!
//! | Metric | Labels |
//! |---|---|
//! | `certreg_http_requests_total` | `method`, `status` |
//! | `certreg_certificates_issued_total` | |
//! | `certreg_certificates_revoked_total` | |
//! | `certreg_admins_added_total` | |
//! | `certreg_mutations_rejected_total` | `reason` |

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use certreg_ledger::{LedgerError, LedgerEvent};

/// Install the global Prometheus recorder. Fails if a recorder is
/// already installed in this process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Count every request by method and status code.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!("certreg_http_requests_total", "method" => method, "status" => status)
        .increment(1);

    response
}

/// Count a committed ledger mutation.
pub fn record_commit(event: &LedgerEvent) {
    match event {
        LedgerEvent::CertificateIssued { .. } => {
            metrics::counter!("certreg_certificates_issued_total").increment(1)
        }
        LedgerEvent::CertificateRevoked { .. } => {
            metrics::counter!("certreg_certificates_revoked_total").increment(1)
        }
        LedgerEvent::AdminAdded { .. } => {
            metrics::counter!("certreg_admins_added_total").increment(1)
        }
        LedgerEvent::Bootstrap { .. } => {}
    }
}

/// Count a mutation the ledger refused.
pub fn record_rejection(err: &LedgerError) {
    metrics::counter!("certreg_mutations_rejected_total", "reason" => rejection_reason(err))
        .increment(1);
}

fn rejection_reason(err: &LedgerError) -> &'static str {
    match err {
        LedgerError::Unauthorized { .. } => "unauthorized",
        LedgerError::NotFound(_) => "not_found",
        LedgerError::InvalidArgument(_) => "invalid_argument",
        LedgerError::CapacityExhausted => "capacity_exhausted",
        LedgerError::AlreadyBootstrapped => "already_bootstrapped",
        LedgerError::Journal(_) => "journal",
    }
}
