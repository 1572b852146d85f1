use std::path::PathBuf;

use clap::{ArgGroup, Parser};

/// Probe HTTP(S) hosts and report availability and latency.
#[derive(Debug, Parser)]
#[command(name = "host-probe", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["hosts", "file"])))]
pub struct Args {
    /// Comma separated list of host URLs
    #[arg(short = 'H', long)]
    pub hosts: Option<String>,

    /// File with one host URL per line
    #[arg(short = 'F', long)]
    pub file: Option<PathBuf>,

    /// Requests per host
    #[arg(short = 'C', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Write the results table as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Per-request timeout in milliseconds (overrides config)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Repeat the run every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub every: Option<u64>,

    /// Stop after this many rounds when repeating
    #[arg(long, requires = "every")]
    pub rounds: Option<u32>,

    /// Write Prometheus text metrics to this path after each round
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn hosts_with_count() {
        let args = Args::try_parse_from(["host-probe", "-H", "http://a.test,http://b.test", "-C", "3"]).unwrap();
        assert_eq!(args.hosts.as_deref(), Some("http://a.test,http://b.test"));
        assert_eq!(args.count, 3);
        assert!(args.file.is_none());
    }

    #[test]
    fn count_defaults_to_one() {
        let args = Args::try_parse_from(["host-probe", "--file", "hosts.txt"]).unwrap();
        assert_eq!(args.count, 1);
    }

    #[test]
    fn hosts_and_file_are_exclusive_and_one_is_required() {
        assert!(Args::try_parse_from(["host-probe", "-H", "http://a.test", "-F", "hosts.txt"]).is_err());
        assert!(Args::try_parse_from(["host-probe", "-C", "2"]).is_err());
    }

    #[test]
    fn non_positive_count_is_rejected() {
        assert!(Args::try_parse_from(["host-probe", "-H", "http://a.test", "-C", "0"]).is_err());
        assert!(Args::try_parse_from(["host-probe", "-H", "http://a.test", "-C", "-1"]).is_err());
    }

    #[test]
    fn rounds_need_every() {
        assert!(Args::try_parse_from(["host-probe", "-H", "http://a.test", "--rounds", "2"]).is_err());
        let args =
            Args::try_parse_from(["host-probe", "-H", "http://a.test", "--every", "30", "--rounds", "2"]).unwrap();
        assert_eq!((args.every, args.rounds), (Some(30), Some(2)));
    }
}
