// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Fixed-period cycle scheduler
//!
//! Cycles run inline in the scheduler loop, so a new cycle never starts
//! while the previous one is still in progress. Ticks that come due during
//! a long cycle are skipped rather than queued up.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Work done once per scheduler tick
#[async_trait]
pub trait CycleTask: Send {
    async fn run_cycle(&mut self);
}

/// Timing counters for a scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub total_cycles: u64,
    /// Cycles that took longer than one period
    pub deadline_misses: u64,
    /// Ticks that fell inside an overrunning cycle and were not run
    pub skipped_ticks: u64,
    pub worst_case: Duration,
}

pub struct FrameScheduler {
    period: Duration,
    stats: SchedulerStats,
}

impl FrameScheduler {
    pub fn new(period: Duration) -> Self {
        // tokio intervals reject a zero period
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            stats: SchedulerStats::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run `task` every period until `shutdown` fires or its sender is dropped.
    ///
    /// A cycle already in progress is allowed to finish before the loop exits.
    pub async fn run<T>(&mut self, task: &mut T, mut shutdown: broadcast::Receiver<()>)
    where
        T: CycleTask + ?Sized,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Frame scheduler started with period {:?}", self.period);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => self.tick(task).await,
            }
        }

        info!(
            "Frame scheduler stopped after {} cycles ({} deadline misses, worst {:?})",
            self.stats.total_cycles, self.stats.deadline_misses, self.stats.worst_case
        );
    }

    /// Run a single cycle and account for its duration
    pub async fn tick<T>(&mut self, task: &mut T)
    where
        T: CycleTask + ?Sized,
    {
        let start = Instant::now();

        task.run_cycle().await;

        let elapsed = start.elapsed();

        if elapsed > self.period {
            let skipped = (elapsed.as_nanos() / self.period.as_nanos()) as u64;
            self.stats.deadline_misses += 1;
            self.stats.skipped_ticks += skipped;
            warn!(
                "Cycle took {:?} (period {:?}), skipping {} ticks",
                elapsed, self.period, skipped
            );
        } else {
            debug!("Cycle took {:?}", elapsed);
        }

        if elapsed > self.stats.worst_case {
            self.stats.worst_case = elapsed;
        }

        self.stats.total_cycles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct SlowCycle {
        work: Duration,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        runs: usize,
    }

    impl SlowCycle {
        fn new(work: Duration) -> Self {
            Self {
                work,
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
                runs: 0,
            }
        }
    }

    #[async_trait]
    impl CycleTask for SlowCycle {
        async fn run_cycle(&mut self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.work).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.runs += 1;
        }
    }

    #[tokio::test]
    async fn test_tick_updates_metrics() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(100));
        let mut task = SlowCycle::new(Duration::ZERO);

        scheduler.tick(&mut task).await;

        let stats = scheduler.stats();
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.deadline_misses, 0);
        assert_eq!(task.runs, 1);
    }

    #[tokio::test]
    async fn test_overrun_counts_miss_and_skips() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(10));
        let mut task = SlowCycle::new(Duration::from_millis(35));

        scheduler.tick(&mut task).await;

        let stats = scheduler.stats();
        assert_eq!(stats.deadline_misses, 1);
        assert!(stats.skipped_ticks >= 3);
        assert!(stats.worst_case >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn test_cycles_never_overlap() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(10));
        let mut task = SlowCycle::new(Duration::from_millis(25));
        let max_in_flight = task.max_in_flight.clone();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = shutdown_tx.send(());
        });

        scheduler.run(&mut task, shutdown_rx).await;
        stopper.await.unwrap();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        // 200ms of 25ms cycles cannot fit more than 8 runs
        assert!(task.runs <= 9);
        assert!(task.runs >= 2);
        assert!(scheduler.stats().deadline_misses >= 1);
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_loop() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(5));
        let mut task = SlowCycle::new(Duration::ZERO);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        drop(shutdown_tx);

        scheduler.run(&mut task, shutdown_rx).await;
        assert_eq!(scheduler.stats().total_cycles, 0);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let scheduler = FrameScheduler::new(Duration::ZERO);
        assert_eq!(scheduler.period(), Duration::from_millis(1));
    }
}
