use thiserror::Error;

/// Errors that stop a probe run before or while hosts are probed.
///
/// Individual request failures never show up here; they are recorded as
/// attempt outcomes.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no hosts to probe")]
    EmptyTargets,
    #[error("request count must be at least 1")]
    ZeroCount,
    #[error("probe task for {host} did not complete: {source}")]
    TaskFailed {
        host: String,
        #[source]
        source: tokio::task::JoinError,
    },
}
