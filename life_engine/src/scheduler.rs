// scheduler.rs - Fixed-cadence step timer and the snapshot observer seam

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::engine::Engine;
use crate::transport::Snapshot;

/// Receives the age map after every step. Publishing must never wait on the consumer.
pub trait SnapshotSink: Send {
    fn publish(&mut self, snapshot: Snapshot);
}

/// Latest-wins: a slow reader only ever sees the newest snapshot.
impl SnapshotSink for watch::Sender<Arc<Snapshot>> {
    fn publish(&mut self, snapshot: Snapshot) {
        self.send_replace(Arc::new(snapshot));
    }
}

/// Every snapshot, in order. A dropped receiver is ignored.
impl SnapshotSink for mpsc::UnboundedSender<Snapshot> {
    fn publish(&mut self, snapshot: Snapshot) {
        let _ = self.send(snapshot);
    }
}

/// Repeating step timer. Stopped until `start`; `tick` never resolves while stopped.
pub struct TickScheduler {
    period: Duration,
    interval: Option<Interval>,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Arm the timer; the first tick lands one period from now. Returns false
    /// if it was already running, in which case the cadence is untouched.
    pub fn start(&mut self) -> bool {
        if self.interval.is_some() {
            return false;
        }
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        log::debug!("scheduler started ({:?} period)", self.period);
        true
    }

    /// Cancel the timer. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.interval.take().is_some();
        if was_running {
            log::debug!("scheduler stopped");
        }
        was_running
    }

    /// Wait for the next tick. Cancel-safe, so it can sit in a `select!`.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}

/// One scheduled beat: advance the engine and hand its age map to the observer.
pub fn fire(engine: &mut Engine, sink: &mut impl SnapshotSink) {
    engine.step();
    sink.publish(engine.snapshot());
}
