use crate::domain::ports::Scheduler;
use async_trait::async_trait;
use std::time::Duration;

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Runs every stage back to back.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantScheduler;

#[async_trait]
impl Scheduler for InstantScheduler {
    async fn sleep(&self, _delay: Duration) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_waits_for_delay() {
        let started = Instant::now();
        TokioScheduler.sleep(Duration::from_millis(1500)).await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_scheduler_does_not_wait() {
        let started = Instant::now();
        InstantScheduler.sleep(Duration::from_secs(60)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
