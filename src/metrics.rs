use anyhow::{Context, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::path::Path;

use crate::observer::ProbeObserver;
use crate::prober::Attempt;
use crate::targets::HostTarget;

/// Prometheus view of a probe run.
#[derive(Clone)]
pub struct ProbeMetrics {
    registry: Registry,
    attempts: IntCounterVec,
    latency: HistogramVec,
}

impl ProbeMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let attempts = IntCounterVec::new(
            Opts::new("probe_attempts_total", "Probe attempts by outcome"),
            &["host", "outcome"],
        )?;
        registry.register(Box::new(attempts.clone()))?;

        let latency = HistogramVec::new(
            HistogramOpts::new("probe_latency_milliseconds", "Probe attempt latency in milliseconds")
                .buckets(vec![
                    1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
                ]),
            &["host"],
        )?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            attempts,
            latency,
        })
    }

    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write the current metrics for a node-exporter textfile collector.
    pub async fn write_textfile(&self, path: &Path) -> Result<()> {
        let body = self.render()?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}

impl ProbeObserver for ProbeMetrics {
    fn attempt_finished(&self, host: &HostTarget, _seq: u32, attempt: &Attempt) {
        self.attempts
            .with_label_values(&[host.as_str(), attempt.outcome.as_str()])
            .inc();
        if let Some(ms) = attempt.elapsed_ms {
            self.latency.with_label_values(&[host.as_str()]).observe(ms);
        }
    }

    fn attempt_failed(&self, _host: &HostTarget, _seq: u32, _attempt: &Attempt, _reason: &str) {}
}
