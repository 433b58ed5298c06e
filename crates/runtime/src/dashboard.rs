//! The cooperative live loop.
//!
//! One task multiplexes four fixed-rate timers (simulator, alert poll, carousel, snooze clock),
//! the in-flight fleet fetch, and a shutdown signal. Each callback runs to completion before the
//! next is picked, so the fleet has a single writer and the alert board is never touched
//! concurrently. A slow fetch never holds up the other timers; at most one fetch is in flight.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use fw_alerts::{AlertBoard, AlertKey, PollOutcome};
use fw_core::{now_ms, CoreError, FleetSource, MachineRef, Timestamp};
use fw_scenarios::LiveFleet;

use crate::config::DashboardConfig;
use crate::metrics::MetricsRegistry;

type Fetch = Pin<Box<dyn Future<Output = Result<Vec<MachineRef>, CoreError>> + Send>>;

/// Wall-clock milliseconds derived from the runtime's monotonic clock, so paused test time
/// drives snooze deadlines as well as the timers.
#[derive(Debug, Clone, Copy)]
struct Clock {
    wall_start: Timestamp,
    start: Instant,
}

impl Clock {
    fn start() -> Self {
        Self { wall_start: now_ms(), start: Instant::now() }
    }

    fn now(&self) -> Timestamp {
        self.wall_start.saturating_add(self.start.elapsed().as_millis() as Timestamp)
    }
}

pub struct Dashboard {
    cfg: DashboardConfig,
    live: LiveFleet,
    source: Arc<dyn FleetSource>,
    board: AlertBoard,
    metrics: MetricsRegistry,
    clock: Clock,
}

impl Dashboard {
    /// Polls the same fleet the simulator mutates.
    pub fn simulated(cfg: DashboardConfig, live: LiveFleet) -> Self {
        let source: Arc<dyn FleetSource> = Arc::new(live.clone());
        Self::new(cfg, live, source)
    }

    pub fn new(cfg: DashboardConfig, live: LiveFleet, source: Arc<dyn FleetSource>) -> Self {
        Self {
            board: AlertBoard::new(cfg.alerts.clone()),
            cfg,
            live,
            source,
            metrics: MetricsRegistry::default(),
            clock: Clock::start(),
        }
    }

    pub fn board(&self) -> &AlertBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut AlertBoard {
        &mut self.board
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Milliseconds since the epoch, continuous across runs.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Snoozes an alert at the current time.
    pub fn dismiss(&mut self, key: &AlertKey) -> bool {
        let now = self.now();
        self.board.dismiss(key, now)
    }

    /// Runs until `shutdown` flips to true or its sender is dropped. A fetch still in flight at
    /// that point is dropped and its result never reaches the board.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let started = Instant::now();
        let mut sim = ticker(self.cfg.simulator.tick_ms, true);
        let mut poll = ticker(self.cfg.alerts.poll_ms, true);
        let mut carousel = ticker(self.cfg.carousel.advance_ms, false);
        let mut clock = ticker(self.cfg.alerts.clock_ms, true);
        let mut in_flight: Option<Fetch> = None;
        info!(
            sim_ms = self.cfg.simulator.tick_ms,
            poll_ms = self.cfg.alerts.poll_ms,
            carousel_ms = self.cfg.carousel.advance_ms,
            "dashboard loop starting"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                Some(result) = next_result(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    if *shutdown.borrow() {
                        break;
                    }
                    self.on_poll_result(result);
                }
                _ = sim.tick() => self.on_sim_tick(),
                _ = poll.tick() => {
                    if in_flight.is_some() {
                        debug!("previous fetch still in flight, skipping poll");
                    } else {
                        in_flight = Some(self.start_fetch());
                    }
                }
                _ = carousel.tick() => self.on_carousel_tick(),
                _ = clock.tick() => {
                    let now = self.now();
                    self.board.clock_tick(now);
                }
            }
        }
        if in_flight.is_some() {
            debug!("shutdown during poll, discarding fetch");
        }

        let line = self.metrics.snapshot().to_json_line("dashboard", Some(started.elapsed()));
        info!(metrics = %line, "dashboard loop stopped");
        Ok(())
    }

    fn on_sim_tick(&mut self) {
        let report = self.live.tick(self.now());
        self.metrics.inc_sim_ticks(1);
        self.metrics.inc_machines_advanced(report.advanced.len() as u64);
        debug!(epoch = report.epoch, advanced = report.advanced.len(), "fleet advanced");
    }

    /// Owned fetch future bounded by the poll timeout; a timeout reads as a source failure.
    fn start_fetch(&self) -> Fetch {
        let source = Arc::clone(&self.source);
        let limit = Duration::from_millis(self.cfg.alerts.poll_timeout_ms.max(1));
        Box::pin(async move {
            match tokio::time::timeout(limit, source.machines_snapshot()).await {
                Ok(result) => result,
                Err(_) => Err(CoreError::Source(format!("fetch exceeded {} ms", limit.as_millis()))),
            }
        })
    }

    fn on_poll_result(&mut self, result: Result<Vec<MachineRef>, CoreError>) {
        self.metrics.inc_polls(1);
        if result.is_err() {
            self.metrics.inc_poll_failures(1);
        }
        let now = self.now();
        if let PollOutcome::Updated { down, visible, newly_down } = self.board.apply_poll(result, now) {
            self.metrics.record_visible_peak(visible as u64);
            if newly_down > 0 {
                info!(down, visible, newly_down, "machines went down");
            }
        }
    }

    fn on_carousel_tick(&mut self) {
        if self.board.advance_carousel() {
            // Headless: there is no slide animation to wait for.
            self.board.settle_carousel();
            self.metrics.inc_carousel_advances(1);
            if let Some(current) = self.board.current() {
                debug!(machine = %current.machine.id, "{}", current.message);
            }
        }
    }
}

async fn next_result(in_flight: &mut Option<Fetch>) -> Option<Result<Vec<MachineRef>, CoreError>> {
    match in_flight.as_mut() {
        Some(fetch) => Some(fetch.await),
        None => None,
    }
}

fn ticker(period_ms: u64, immediate: bool) -> Interval {
    let period = Duration::from_millis(period_ms.max(1));
    let mut timer = if immediate { interval(period) } else { interval_at(Instant::now() + period, period) };
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fw_core::entity::{Department, Factory, Machine, MachineStatus, Plant, Zone};
    use fw_core::{DepartmentLayout, Fleet};
    use fw_scenarios::{generate_fleet, FleetStore};

    fn live(seed: u64) -> LiveFleet {
        let cfg = DashboardConfig::default();
        let mut sim = cfg.simulator.clone();
        sim.seed = Some(seed);
        LiveFleet::new(FleetStore::new(generate_fleet(&cfg.seed), sim))
    }

    async fn run_for(dashboard: &mut Dashboard, millis: u64) {
        let (tx, rx) = watch::channel(false);
        let stopper = async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            let _ = tx.send(true);
        };
        let (res, _) = tokio::join!(dashboard.run(rx), stopper);
        res.unwrap();
    }

    struct FailingSource;

    #[async_trait]
    impl FleetSource for FailingSource {
        async fn machines_snapshot(&self) -> Result<Vec<MachineRef>, CoreError> {
            Err(CoreError::Source("database unreachable".into()))
        }

        async fn department_layout(&self, id: &str) -> Result<DepartmentLayout, CoreError> {
            Err(CoreError::not_found("department", id))
        }
    }

    struct SlowSource {
        delay: Duration,
        inner: LiveFleet,
    }

    #[async_trait]
    impl FleetSource for SlowSource {
        async fn machines_snapshot(&self) -> Result<Vec<MachineRef>, CoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.machines_snapshot().await
        }

        async fn department_layout(&self, id: &str) -> Result<DepartmentLayout, CoreError> {
            self.inner.department_layout(id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timers_fire_at_their_configured_rates() {
        let mut dashboard = Dashboard::simulated(DashboardConfig::default(), live(1));
        run_for(&mut dashboard, 10_500).await;
        let snap = dashboard.metrics().snapshot();
        assert_eq!(snap.sim_ticks, 6);
        assert_eq!(snap.polls, 3);
        assert_eq!(snap.poll_failures, 0);
        assert_eq!(snap.machines_advanced, 6 * 12);
    }

    #[tokio::test(start_paused = true)]
    async fn board_tracks_down_machines_in_the_live_fleet() {
        let live = live(2);
        let mut dashboard = Dashboard::simulated(DashboardConfig::default(), live.clone());
        run_for(&mut dashboard, 5_500).await;

        // Last poll at t=5s came after the last simulator tick at t=4s.
        let down: Vec<_> = live
            .snapshot()
            .machines_snapshot()
            .into_iter()
            .filter(|r| r.machine.status == MachineStatus::Down)
            .map(|r| r.machine.id)
            .collect();
        let mut shown: Vec<_> = dashboard.board().down().iter().map(|a| a.machine.id.clone()).collect();
        let mut expected = down.clone();
        shown.sort();
        expected.sort();
        assert_eq!(shown, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_source_is_counted_and_loop_keeps_running() {
        let mut dashboard = Dashboard::new(DashboardConfig::default(), live(3), Arc::new(FailingSource));
        run_for(&mut dashboard, 10_500).await;
        let snap = dashboard.metrics().snapshot();
        assert_eq!(snap.polls, 3);
        assert_eq!(snap.poll_failures, 3);
        assert_eq!(snap.sim_ticks, 6);
        assert!(dashboard.board().visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let source = SlowSource { delay: Duration::from_secs(30), inner: live(4) };
        let mut dashboard = Dashboard::new(DashboardConfig::default(), live(4), Arc::new(source));
        run_for(&mut dashboard, 4_000).await;
        let snap = dashboard.metrics().snapshot();
        assert_eq!(snap.polls, 1);
        assert_eq!(snap.poll_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_resolving_after_shutdown_is_discarded() {
        let mut cfg = DashboardConfig::default();
        cfg.alerts.poll_timeout_ms = 120_000;
        let source = SlowSource { delay: Duration::from_secs(5), inner: live(5) };
        let mut dashboard = Dashboard::new(cfg, live(5), Arc::new(source));
        run_for(&mut dashboard, 1_000).await;
        assert_eq!(dashboard.metrics().snapshot().polls, 0);
        assert!(dashboard.board().down().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_does_not_hold_up_the_other_timers() {
        let source = SlowSource { delay: Duration::from_millis(2_900), inner: live(7) };
        let mut dashboard = Dashboard::new(DashboardConfig::default(), live(7), Arc::new(source));
        run_for(&mut dashboard, 23_000).await;
        let snap = dashboard.metrics().snapshot();
        // Fetches start at 0/5/10/15/20 s and land 2.9 s later; ticks every 2 s through 22 s.
        assert_eq!(snap.polls, 5);
        assert_eq!(snap.poll_failures, 0);
        assert_eq!(snap.sim_ticks, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_tick_is_skipped_while_a_fetch_is_in_flight() {
        let mut cfg = DashboardConfig::default();
        cfg.alerts.poll_timeout_ms = 120_000;
        let source = SlowSource { delay: Duration::from_secs(7), inner: live(8) };
        let mut dashboard = Dashboard::new(cfg, live(8), Arc::new(source));
        run_for(&mut dashboard, 11_000).await;
        let snap = dashboard.metrics().snapshot();
        // The 5 s tick finds the first fetch pending; the 10 s fetch is still out at shutdown.
        assert_eq!(snap.polls, 1);
        assert_eq!(snap.sim_ticks, 6);
    }

    fn one_down_fleet() -> Fleet {
        Fleet::new(vec![Factory {
            id: "F1".into(),
            name: "North Works".into(),
            plants: vec![Plant {
                id: "P1".into(),
                name: "Body".into(),
                departments: vec![Department {
                    id: "D1".into(),
                    name: "Press".into(),
                    zones: vec![Zone {
                        id: "Z1".into(),
                        name: "Line 1".into(),
                        machines: vec![
                            Machine::new("M1", "Press 1", MachineStatus::Down),
                            Machine::new("M2", "Press 2", MachineStatus::Running),
                        ],
                    }],
                }],
            }],
        }])
    }

    #[tokio::test(start_paused = true)]
    async fn dismissed_alert_returns_on_the_clock_after_the_snooze_window() {
        let mut cfg = DashboardConfig::default();
        cfg.simulator.sample_ratio = 0.0;
        cfg.simulator.min_sample = 0;
        cfg.alerts.poll_ms = 3_600_000;
        let live = LiveFleet::new(FleetStore::new(one_down_fleet(), cfg.simulator.clone()));
        let mut dashboard = Dashboard::simulated(cfg, live);
        let key = AlertKey::new("F1", "P1", "D1", "M1");

        run_for(&mut dashboard, 100).await;
        let visible: Vec<_> = dashboard.board().visible().iter().map(|a| a.key()).collect();
        assert_eq!(visible, vec![key.clone()]);

        assert!(dashboard.dismiss(&key));
        assert!(dashboard.board().visible().is_empty());
        assert!(dashboard.board().snoozed_until(&key).is_some());

        run_for(&mut dashboard, 59_000).await;
        assert!(dashboard.board().visible().is_empty());

        run_for(&mut dashboard, 2_500).await;
        assert_eq!(dashboard.board().visible().len(), 1);
        assert_eq!(dashboard.board().visible()[0].key(), key);
        // One immediate poll per run, all before the deadline: the clock brought it back.
        assert_eq!(dashboard.metrics().snapshot().polls, 3);
    }
}
