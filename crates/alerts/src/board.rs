use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use fw_core::{CoreError, MachineRef, Timestamp};
use fw_views::{alert_items, AlertItem, AlertKey};

use crate::carousel::Carousel;
use crate::AlertConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Updated { down: usize, visible: usize, newly_down: usize },
    /// The fetch failed; the previous alerts stay on screen.
    Retained,
}

/// Alert banner state. Machines are `ACTIVE` while DOWN and not snoozed, `SNOOZED` until their
/// deadline passes, and forgotten as soon as they stop being DOWN.
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    cfg: AlertConfig,
    down: Vec<AlertItem>,
    snoozed_until: HashMap<AlertKey, Timestamp>,
    visible: Vec<AlertItem>,
    carousel: Carousel,
}

impl AlertBoard {
    pub fn new(cfg: AlertConfig) -> Self {
        Self { cfg, ..Self::default() }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.cfg
    }

    /// Every DOWN machine, oldest alert first.
    pub fn down(&self) -> &[AlertItem] {
        &self.down
    }

    pub fn visible(&self) -> &[AlertItem] {
        &self.visible
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    /// The alert the banner is showing, if any.
    pub fn current(&self) -> Option<&AlertItem> {
        self.visible.get(self.carousel.position())
    }

    pub fn snoozed_until(&self, key: &AlertKey) -> Option<Timestamp> {
        self.snoozed_until.get(key).copied()
    }

    pub fn apply_poll(
        &mut self,
        result: Result<Vec<MachineRef>, CoreError>,
        now: Timestamp,
    ) -> PollOutcome {
        match result {
            Ok(snapshot) => self.apply_snapshot(&snapshot, now),
            Err(err) => {
                warn!(error = %err, "alert poll failed, keeping previous alerts");
                PollOutcome::Retained
            }
        }
    }

    /// Merges a fresh fleet snapshot: machines still DOWN keep their slot, newly DOWN machines
    /// are appended, recovered machines are dropped along with their snooze.
    pub fn apply_snapshot(&mut self, snapshot: &[MachineRef], now: Timestamp) -> PollOutcome {
        let fresh = alert_items(snapshot);
        let mut by_key: HashMap<AlertKey, AlertItem> =
            fresh.iter().map(|a| (a.key(), a.clone())).collect();

        let mut merged = Vec::with_capacity(fresh.len());
        for prior in &self.down {
            if let Some(item) = by_key.remove(&prior.key()) {
                merged.push(item);
            }
        }
        let kept = merged.len();
        for item in fresh {
            if by_key.remove(&item.key()).is_some() {
                merged.push(item);
            }
        }
        let newly_down = merged.len() - kept;

        let still_down: HashSet<AlertKey> = merged.iter().map(AlertItem::key).collect();
        self.snoozed_until.retain(|key, _| still_down.contains(key));
        self.down = merged;
        self.refresh(now);

        debug!(down = self.down.len(), visible = self.visible.len(), newly_down, "alerts merged");
        PollOutcome::Updated { down: self.down.len(), visible: self.visible.len(), newly_down }
    }

    /// Hides a DOWN machine for the snooze window. Returns false if it is not currently DOWN.
    pub fn dismiss(&mut self, key: &AlertKey, now: Timestamp) -> bool {
        if !self.down.iter().any(|a| a.key() == *key) {
            return false;
        }
        let until = now.saturating_add(self.cfg.snooze_ms);
        self.snoozed_until.insert(key.clone(), until);
        self.refresh(now);
        true
    }

    /// Re-evaluates snoozes so expired ones come back without waiting for a poll.
    pub fn clock_tick(&mut self, now: Timestamp) {
        self.refresh(now);
    }

    pub fn advance_carousel(&mut self) -> bool {
        self.carousel.advance()
    }

    pub fn settle_carousel(&mut self) {
        self.carousel.settle();
    }

    fn refresh(&mut self, now: Timestamp) {
        let snoozed = &self.snoozed_until;
        self.visible = self
            .down
            .iter()
            .filter(|a| snoozed.get(&a.key()).map_or(true, |until| *until <= now))
            .cloned()
            .collect();
        self.carousel.sync(self.visible.len());
    }
}
