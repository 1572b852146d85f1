use std::fmt;
use std::time::Duration;

use tokio::time::{timeout, Instant};

use crate::observer::ProbeObserver;
use crate::targets::HostTarget;
use crate::util::duration_to_millis;

pub mod classify;
pub mod http;
pub mod transport;

use classify::classify;
use transport::{FailureKind, Transport, TransportFailure};

/// Classification of one request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failed,
    ConnectionFailure,
    Timeout,
    ProtocolError,
    TlsError,
    InvalidRequest,
    DecodingError,
    TooManyRedirects,
    UnknownError,
    /// A status outside both the success (2xx) and failed (4xx/5xx) ranges.
    Unclassified(u16),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, Outcome::Success | Outcome::Failed | Outcome::Unclassified(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
            Outcome::ConnectionFailure => "connection_failure",
            Outcome::Timeout => "timeout",
            Outcome::ProtocolError => "protocol_error",
            Outcome::TlsError => "tls_error",
            Outcome::InvalidRequest => "invalid_request",
            Outcome::DecodingError => "decoding_error",
            Outcome::TooManyRedirects => "too_many_redirects",
            Outcome::UnknownError => "unknown_error",
            Outcome::Unclassified(_) => "unclassified",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unclassified(status) => write!(f, "unclassified ({status})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One timed request against one host.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub outcome: Outcome,
    pub elapsed_ms: Option<f64>,
}

/// Run `count` GET attempts against `host`, one after the other.
///
/// Every attempt yields an [`Attempt`], whatever happened on the wire; a
/// failing attempt never cuts the remaining ones short. Failed and errored
/// attempts are reported to `observer` as they happen.
pub async fn probe_host(
    transport: &dyn Transport,
    host: &HostTarget,
    count: u32,
    request_timeout: Duration,
    observer: &dyn ProbeObserver,
) -> Vec<Attempt> {
    let mut attempts = Vec::with_capacity(count as usize);

    for seq in 1..=count {
        let start = Instant::now();
        let result = match timeout(request_timeout, transport.fetch(host.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::new(
                FailureKind::Timeout,
                format!("no response within {} ms", request_timeout.as_millis()),
            )),
        };
        let attempt = Attempt {
            outcome: classify(&result),
            elapsed_ms: Some(duration_to_millis(start.elapsed())),
        };

        observer.attempt_finished(host, seq, &attempt);
        match (&result, attempt.outcome) {
            (Err(failure), _) => observer.attempt_failed(host, seq, &attempt, &failure.message),
            (Ok(status), Outcome::Failed) => {
                observer.attempt_failed(host, seq, &attempt, &format!("HTTP status {status}"))
            }
            _ => {}
        }

        attempts.push(attempt);
    }

    attempts
}
