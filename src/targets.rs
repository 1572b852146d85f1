use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// An absolute http(s) URL that passed validation. Probers only read it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HostTarget(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("`{0}` is not a valid URL: {1}")]
    Malformed(String, url::ParseError),
    #[error("`{0}` must use http or https")]
    UnsupportedScheme(String),
    #[error("`{0}` has no host")]
    MissingHost(String),
}

impl HostTarget {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|e| TargetError::Malformed(raw.to_string(), e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TargetError::UnsupportedScheme(raw.to_string()));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(TargetError::MissingHost(raw.to_string()));
        }
        // Keep the user's spelling so results are keyed by what was asked for.
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a comma separated `--hosts` value.
pub fn parse_host_list(raw: &str) -> Result<Vec<HostTarget>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| HostTarget::parse(s).map_err(anyhow::Error::from))
        .collect()
}

/// Read a host list file: one URL per line, blank lines and `#` comments skipped.
pub async fn load_host_file(path: &Path) -> Result<Vec<HostTarget>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading host file {}", path.display()))?;

    let mut targets = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let target = HostTarget::parse(line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        targets.push(target);
    }

    if targets.is_empty() {
        anyhow::bail!("host file {} contains no hosts", path.display());
    }
    Ok(targets)
}

/// Drop repeated targets, keeping the first occurrence.
pub fn dedup(targets: Vec<HostTarget>) -> Vec<HostTarget> {
    let mut seen = HashSet::new();
    targets.into_iter().filter(|t| seen.insert(t.clone())).collect()
}
