use super::transport::{FailureKind, TransportFailure};
use super::Outcome;

/// Map one exchange result onto exactly one outcome.
pub fn classify(result: &Result<u16, TransportFailure>) -> Outcome {
    match result {
        Ok(status) => classify_status(*status),
        Err(failure) => classify_failure(failure.kind),
    }
}

pub fn classify_status(status: u16) -> Outcome {
    match status {
        200..=299 => Outcome::Success,
        400..=599 => Outcome::Failed,
        // 1xx and unfollowed 3xx land in neither bucket.
        other => Outcome::Unclassified(other),
    }
}

pub fn classify_failure(kind: FailureKind) -> Outcome {
    match kind {
        FailureKind::Connect => Outcome::ConnectionFailure,
        FailureKind::Timeout => Outcome::Timeout,
        FailureKind::Protocol => Outcome::ProtocolError,
        FailureKind::Tls => Outcome::TlsError,
        FailureKind::InvalidRequest => Outcome::InvalidRequest,
        FailureKind::Decode => Outcome::DecodingError,
        FailureKind::Redirect => Outcome::TooManyRedirects,
        FailureKind::Other => Outcome::UnknownError,
    }
}
