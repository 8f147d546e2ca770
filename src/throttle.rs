use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces out provider calls issued from concurrent tasks.
///
/// Each `acquire` reserves the next free slot and waits for it. Slots are at
/// least `spacing` apart, no matter how many tasks ask at once. A throttle
/// with zero spacing never waits.
#[derive(Debug)]
pub struct Throttle {
    spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next slot.
    pub async fn acquire(&self) {
        if self.spacing.is_zero() {
            return;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            *next_slot = Some(slot + self.spacing);
            slot
        };

        sleep_until(slot).await;
    }
}
