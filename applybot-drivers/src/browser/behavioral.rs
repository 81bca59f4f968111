use applybot_common::BrowserSettings;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
/// Produces human‑like delays and typing behavior to reduce automation signals.
pub struct BehavioralEngine {
    fidget_ms: (u64, u64),
    keystroke_ms: (u64, u64),
}

impl Default for BehavioralEngine {
    fn default() -> Self {
        Self::from_settings(&BrowserSettings::default())
    }
}

impl BehavioralEngine {
    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self {
            fidget_ms: ordered(settings.fidget_ms),
            keystroke_ms: ordered(settings.keystroke_ms),
        }
    }

    /// No pauses at all; for tests and replay.
    pub fn instant() -> Self {
        Self {
            fidget_ms: (0, 0),
            keystroke_ms: (0, 0),
        }
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        let ms = pick(min, max);
        if ms > 0 {
            sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Pause after a pointer action, as a person settling on the page.
    pub async fn fidget(&self) {
        self.random_delay(self.fidget_ms.0, self.fidget_ms.1).await;
    }

    /// Pause between two keystrokes.
    pub async fn keystroke_pause(&self) {
        self.random_delay(self.keystroke_ms.0, self.keystroke_ms.1)
            .await;
    }
}

fn ordered((a, b): (u64, u64)) -> (u64, u64) {
    (a.min(b), a.max(b))
}

fn pick(min: u64, max: u64) -> u64 {
    let (min, max) = ordered((min, max));
    if min == max {
        return min;
    }
    OsRng.gen_range(min..=max)
}
