// Console and file output for a finished run.

use std::path::Path;

use anyhow::{Context, Result};

use crate::orchestrator::ResultsTable;

fn fmt_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |ms| format!("{ms:.2}"))
}

pub fn render_table(table: &ResultsTable) -> String {
    let width = table
        .iter()
        .map(|(host, _)| host.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = format!(
        "{:<width$}  {:>7}  {:>6}  {:>6}  {:>5}  {:>10}  {:>10}  {:>10}\n",
        "Host", "Success", "Failed", "Errors", "Other", "Min ms", "Max ms", "Avg ms"
    );
    for (host, stats) in table.iter() {
        out.push_str(&format!(
            "{:<width$}  {:>7}  {:>6}  {:>6}  {:>5}  {:>10}  {:>10}  {:>10}\n",
            host.as_str(),
            stats.success,
            stats.failed,
            stats.errors,
            stats.unclassified,
            fmt_ms(stats.min_ms),
            fmt_ms(stats.max_ms),
            fmt_ms(stats.avg_ms),
        ));
    }
    out
}

/// Persist the table as a JSON object keyed by host.
pub async fn write_json(table: &ResultsTable, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(table)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("writing results to {}", path.display()))
}
