use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use anyhow::Result;

pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            anyhow::bail!("repeat interval must be greater than zero");
        }
        Ok(Self { interval })
    }

    /// Await `job` once per tick until `rounds` are done (forever when `None`).
    ///
    /// Ticks are anchored to the start instant. A round that overruns the
    /// interval delays the next one instead of overlapping it.
    pub async fn run<J, F>(&self, rounds: Option<u32>, mut job: J) -> Result<()>
    where
        J: FnMut(u32) -> F,
        F: std::future::Future<Output = Result<()>>,
    {
        let mut next = Instant::now();
        let mut round = 0u32;
        loop {
            round += 1;
            next += self.interval;
            job(round).await?;
            if rounds.is_some_and(|max| round >= max) {
                return Ok(());
            }
            sleep_until(next).await;
        }
    }
}
