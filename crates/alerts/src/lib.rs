//! DOWN-machine alert banner: stable ordering, per-machine snooze, and a wrapping carousel.

use serde::{Deserialize, Serialize};

pub mod board;
pub mod carousel;

pub use board::{AlertBoard, PollOutcome};
pub use carousel::Carousel;
pub use fw_views::AlertKey;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub poll_ms: u64,
    /// Upper bound on a single fleet fetch.
    pub poll_timeout_ms: u64,
    pub snooze_ms: u64,
    /// Cadence of the snooze re-evaluation.
    pub clock_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { poll_ms: 5_000, poll_timeout_ms: 3_000, snooze_ms: 60_000, clock_ms: 1_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CarouselConfig {
    pub advance_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self { advance_ms: 10_000 }
    }
}
