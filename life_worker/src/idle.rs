// idle.rs - Decides when the background should pulse idle waves

use std::future;
use std::time::Duration;

use life_engine::{Inbound, InteractionConfig};
use tokio::time::{self, Instant};

/// Fires a wave after `timeout` without pointer activity, then every `interval`
/// until activity resumes.
pub struct IdleDetector {
    timeout: Duration,
    interval: Duration,
    enabled: bool,
    next_wave: Instant,
}

impl IdleDetector {
    pub fn new(config: &InteractionConfig) -> Self {
        let timeout = config.wave_timeout();
        Self {
            timeout,
            interval: config.wave_interval().max(Duration::from_millis(1)),
            enabled: config.idle_waves,
            next_wave: Instant::now() + timeout,
        }
    }

    /// Pointer activity and re-initialisation push the next wave back.
    pub fn observe(&mut self, message: &Inbound) {
        if matches!(message, Inbound::Activate { .. } | Inbound::Init { .. }) {
            self.next_wave = Instant::now() + self.timeout;
        }
    }

    /// Resolves when a wave is due. Never resolves when disabled.
    pub async fn wait(&mut self) {
        if !self.enabled {
            return future::pending().await;
        }
        time::sleep_until(self.next_wave).await;
        self.next_wave = Instant::now() + self.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool) -> InteractionConfig {
        InteractionConfig {
            wave_timeout_ms: 10_000,
            wave_interval_ms: 2_000,
            idle_waves: enabled,
            ..InteractionConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waves_after_timeout_then_every_interval() {
        let mut idle = IdleDetector::new(&config(true));
        let started = Instant::now();
        idle.wait().await;
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        idle.wait().await;
        idle.wait().await;
        assert_eq!(started.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_timeout() {
        let mut idle = IdleDetector::new(&config(true));
        let started = Instant::now();
        time::sleep(Duration::from_secs(8)).await;
        idle.observe(&Inbound::Activate { center_x: 1, center_y: 1, radius: 4 });
        idle.observe(&Inbound::Wave);
        idle.wait().await;
        assert_eq!(started.elapsed(), Duration::from_secs(18));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_never_fires() {
        let mut idle = IdleDetector::new(&config(false));
        assert!(time::timeout(Duration::from_secs(60), idle.wait()).await.is_err());
    }
}
