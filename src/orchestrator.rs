use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, Instrument};

use crate::error::ProbeError;
use crate::observer::ProbeObserver;
use crate::prober::probe_host;
use crate::prober::transport::Transport;
use crate::stats::{reduce, HostStats};
use crate::targets::{dedup, HostTarget};

/// Per-host stats of a completed run, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    entries: Vec<(HostTarget, HostStats)>,
}

impl ResultsTable {
    pub fn get(&self, host: &str) -> Option<&HostStats> {
        self.entries
            .iter()
            .find(|(target, _)| target.as_str() == host)
            .map(|(_, stats)| stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HostTarget, &HostStats)> {
        self.entries.iter().map(|(t, s)| (t, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResultsTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (target, stats) in &self.entries {
            map.serialize_entry(target.as_str(), stats)?;
        }
        map.end()
    }
}

/// Fans out one sequential prober per host and collects their stats.
#[derive(Clone)]
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    observer: Arc<dyn ProbeObserver>,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        observer: Arc<dyn ProbeObserver>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            observer,
            request_timeout,
        }
    }

    /// Probe every target `count` times and wait for all of them.
    ///
    /// Either every host gets an entry or an error is returned. Dropping
    /// the returned future aborts all in-flight probes.
    pub async fn run(&self, targets: &[HostTarget], count: u32) -> Result<ResultsTable, ProbeError> {
        if count == 0 {
            return Err(ProbeError::ZeroCount);
        }
        let targets = dedup(targets.to_vec());
        if targets.is_empty() {
            return Err(ProbeError::EmptyTargets);
        }

        info!(hosts = targets.len(), count, "starting probe run");

        let mut tasks = JoinSet::new();
        let mut slots = HashMap::with_capacity(targets.len());
        for (idx, host) in targets.iter().enumerate() {
            let transport = self.transport.clone();
            let observer = self.observer.clone();
            let request_timeout = self.request_timeout;
            let host = host.clone();
            let span = info_span!("probe", host = %host);

            let handle = tasks.spawn(
                async move {
                    let attempts =
                        probe_host(transport.as_ref(), &host, count, request_timeout, observer.as_ref()).await;
                    let stats = reduce(&attempts);
                    debug_assert_eq!(stats.total(), count);
                    debug!(?stats, "host done");
                    (idx, stats)
                }
                .instrument(span),
            );
            slots.insert(handle.id(), idx);
        }

        let mut collected: Vec<Option<HostStats>> = vec![None; targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, stats)) => collected[idx] = Some(stats),
                Err(source) => {
                    let host = slots
                        .get(&source.id())
                        .map(|idx| targets[*idx].to_string())
                        .unwrap_or_default();
                    // Returning drops `tasks`, which aborts whatever is still running.
                    return Err(ProbeError::TaskFailed { host, source });
                }
            }
        }

        let entries: Vec<_> = targets
            .into_iter()
            .zip(collected)
            .filter_map(|(target, stats)| stats.map(|s| (target, s)))
            .collect();
        info!(hosts = entries.len(), "probe run complete");
        Ok(ResultsTable { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use crate::prober::testing::{Reply, ScriptedTransport};
    use crate::prober::transport::{FailureKind, TransportFailure};
    use async_trait::async_trait;

    fn targets(urls: &[&str]) -> Vec<HostTarget> {
        urls.iter().map(|u| HostTarget::parse(u).unwrap()).collect()
    }

    fn orchestrator(transport: ScriptedTransport) -> (Orchestrator, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let orch = Orchestrator::new(Arc::new(transport), observer.clone(), Duration::from_secs(5));
        (orch, observer)
    }

    #[tokio::test]
    async fn healthy_and_timing_out_hosts() {
        let transport = ScriptedTransport::new()
            .host("http://a.test", vec![Reply::Status(200)])
            .host("http://b.test", vec![Reply::Fail(FailureKind::Timeout)]);
        let (orch, observer) = orchestrator(transport);

        let table = orch.run(&targets(&["http://a.test", "http://b.test"]), 3).await.unwrap();

        assert_eq!(table.len(), 2);
        let a = table.get("http://a.test").unwrap();
        assert_eq!((a.success, a.failed, a.errors), (3, 0, 0));
        assert!(a.min_ms.is_some() && a.max_ms.is_some() && a.avg_ms.is_some());

        let b = table.get("http://b.test").unwrap();
        assert_eq!((b.success, b.failed, b.errors), (0, 0, 3));
        assert!(b.min_ms.is_some() && b.max_ms.is_some() && b.avg_ms.is_some());

        assert_eq!(observer.failures().len(), 3);
        assert!(observer.failures().iter().all(|f| f.0 == "http://b.test"));
    }

    #[tokio::test]
    async fn connection_failures_become_errors() {
        // Unscripted hosts refuse connections.
        let (orch, _) = orchestrator(ScriptedTransport::new());

        let table = orch.run(&targets(&["http://gone.test"]), 4).await.unwrap();

        let stats = table.get("http://gone.test").unwrap();
        assert_eq!((stats.success, stats.failed, stats.errors), (0, 0, 4));
    }

    #[tokio::test]
    async fn gap_status_counts_in_no_bucket() {
        let transport = ScriptedTransport::new().host("http://cache.test", vec![Reply::Status(304)]);
        let (orch, _) = orchestrator(transport);

        let table = orch.run(&targets(&["http://cache.test"]), 3).await.unwrap();

        let stats = table.get("http://cache.test").unwrap();
        assert_eq!((stats.success, stats.failed, stats.errors), (0, 0, 0));
        assert_eq!(stats.unclassified, 3);
        assert!(stats.min_ms.is_some() && stats.avg_ms.is_some());
    }

    #[tokio::test]
    async fn one_entry_per_distinct_host_in_input_order() {
        let mut transport = ScriptedTransport::new().with_delay(Duration::from_millis(2));
        let urls: Vec<String> = (0..20).map(|i| format!("http://h{i}.test")).collect();
        for (i, url) in urls.iter().enumerate() {
            let reply = if i % 3 == 0 { Reply::Status(500) } else { Reply::Status(200) };
            transport = transport.host(url, vec![reply]);
        }
        let mut input: Vec<&str> = urls.iter().map(String::as_str).collect();
        input.push("http://h0.test");
        let (orch, _) = orchestrator(transport);

        let count = 5;
        let table = orch.run(&targets(&input), count).await.unwrap();

        assert_eq!(table.len(), 20);
        let order: Vec<_> = table.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(order, urls);
        for (_, stats) in table.iter() {
            assert_eq!(stats.success + stats.failed + stats.errors, count);
        }
        assert_eq!(table.get("http://h0.test").unwrap().failed, count);
    }

    #[tokio::test]
    async fn each_host_probed_exactly_count_times() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .host("http://a.test", vec![Reply::Status(200)])
                .host("http://b.test", vec![Reply::Status(404)]),
        );
        let orch = Orchestrator::new(
            transport.clone(),
            Arc::new(RecordingObserver::default()),
            Duration::from_secs(5),
        );

        orch.run(&targets(&["http://a.test", "http://b.test", "http://a.test"]), 7)
            .await
            .unwrap();

        assert_eq!(transport.calls("http://a.test"), 7);
        assert_eq!(transport.calls("http://b.test"), 7);
    }

    #[tokio::test]
    async fn rejects_bad_configuration() {
        let (orch, _) = orchestrator(ScriptedTransport::new());
        assert!(matches!(orch.run(&targets(&["http://a.test"]), 0).await, Err(ProbeError::ZeroCount)));
        assert!(matches!(orch.run(&[], 1).await, Err(ProbeError::EmptyTargets)));
    }

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn fetch(&self, url: &str) -> Result<u16, TransportFailure> {
            if url.contains("bad") {
                panic!("transport blew up");
            }
            Ok(200)
        }
    }

    #[tokio::test]
    async fn task_failure_aborts_the_whole_run() {
        let orch = Orchestrator::new(
            Arc::new(PanickingTransport),
            Arc::new(RecordingObserver::default()),
            Duration::from_secs(5),
        );

        let err = orch
            .run(&targets(&["http://ok.test", "http://bad.test"]), 2)
            .await
            .unwrap_err();

        match err {
            ProbeError::TaskFailed { host, .. } => assert_eq!(host, "http://bad.test"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_run_abandons_in_flight_probes() {
        let transport = ScriptedTransport::new().host("http://stuck.test", vec![Reply::Hang]);
        let observer = Arc::new(RecordingObserver::default());
        let orch = Orchestrator::new(Arc::new(transport), observer.clone(), Duration::from_secs(3600));

        let stuck = targets(&["http://stuck.test"]);
        let run = orch.run(&stuck, 1);
        let cancelled = tokio::time::timeout(Duration::from_millis(20), run).await;

        assert!(cancelled.is_err());
        assert_eq!(observer.finished(), 0);
    }
}
