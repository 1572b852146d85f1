use std::error::Error as _;
use std::io;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{redirect, Client};

use super::transport::{FailureKind, Transport, TransportFailure};

/// reqwest-backed transport sharing one client across all hosts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, request_timeout: Duration, max_redirects: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(max_redirects))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<u16, TransportFailure> {
        let resp = self.client.get(url).send().await.map_err(|e| normalize(&e))?;
        let status = resp.status().as_u16();
        // Timing covers the whole body, not just the headers.
        resp.text().await.map_err(|e| normalize(&e))?;
        Ok(status)
    }
}

/// Fold a reqwest error into a client-independent failure.
///
/// reqwest's own flags are consulted first, then the source chain, then
/// the coarse connect/body flags.
pub fn normalize(error: &reqwest::Error) -> TransportFailure {
    let kind = categorize(error);
    TransportFailure::new(kind, describe(error))
}

fn categorize(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        return FailureKind::Timeout;
    }
    if error.is_redirect() {
        return FailureKind::Redirect;
    }
    if error.is_builder() {
        return FailureKind::InvalidRequest;
    }
    // reqwest flags a body cut short as a decode error too.
    if is_incomplete_message(error) {
        return FailureKind::Protocol;
    }
    if error.is_decode() {
        return FailureKind::Decode;
    }
    if let Some(kind) = categorize_source_chain(error) {
        return kind;
    }
    if error.is_connect() {
        return FailureKind::Connect;
    }
    if error.is_body() {
        return FailureKind::Protocol;
    }
    FailureKind::Other
}

fn categorize_source_chain(error: &reqwest::Error) -> Option<FailureKind> {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io_error) = err.downcast_ref::<io::Error>() {
            if let Some(kind) = categorize_io_error(io_error) {
                return Some(kind);
            }
        }
        if err.downcast_ref::<url::ParseError>().is_some() {
            return Some(FailureKind::InvalidRequest);
        }
        if let Some(kind) = categorize_message(&err.to_string()) {
            return Some(kind);
        }
        source = err.source();
    }
    None
}

fn is_incomplete_message(error: &reqwest::Error) -> bool {
    const MARKERS: [&str; 3] = [
        "end of file before message length reached",
        "connection closed before message completed",
        "incomplete message",
    ];
    let mut source = error.source();
    while let Some(err) = source {
        if err
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
        {
            return true;
        }
        let msg = err.to_string().to_lowercase();
        if MARKERS.iter().any(|m| msg.contains(m)) {
            return true;
        }
        source = err.source();
    }
    false
}

fn categorize_io_error(io_error: &io::Error) -> Option<FailureKind> {
    use io::ErrorKind as K;
    match io_error.kind() {
        K::ConnectionRefused
        | K::ConnectionReset
        | K::ConnectionAborted
        | K::NotConnected
        | K::NotFound
        | K::NetworkUnreachable
        | K::HostUnreachable
        | K::AddrNotAvailable => Some(FailureKind::Connect),
        K::TimedOut => Some(FailureKind::Timeout),
        K::InvalidData | K::UnexpectedEof | K::BrokenPipe => Some(FailureKind::Protocol),
        // TLS stacks surface their errors as `Other`; let the message decide.
        _ => None,
    }
}

fn categorize_message(message: &str) -> Option<FailureKind> {
    let msg = message.to_lowercase();
    if ["certificate", "tls", "ssl", "handshake", "corrupt message"].iter().any(|p| msg.contains(p)) {
        return Some(FailureKind::Tls);
    }
    if msg.contains("dns error") || msg.contains("failed to lookup address") {
        return Some(FailureKind::Connect);
    }
    if ["invalid http", "invalid status", "invalid header", "parse error", "unexpected message"]
        .iter()
        .any(|p| msg.contains(p))
    {
        return Some(FailureKind::Protocol);
    }
    None
}

/// The error followed by its innermost cause, which is usually the useful part.
fn describe(error: &reqwest::Error) -> String {
    let mut root = None;
    let mut source = error.source();
    while let Some(err) = source {
        root = Some(err.to_string());
        source = err.source();
    }
    match root {
        Some(cause) => format!("{error}: {cause}"),
        None => error.to_string(),
    }
}
