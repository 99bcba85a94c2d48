//! The dashboard session: one cluster bake, its poll loop and its pull loop.
//!
//! A [`Dashboard`] owns everything a control panel instance needs: the
//! active cluster id, both loop timers, the pull counter, the status color
//! toggle and the display buffer. It is generic over the backend
//! [`Transport`] and the [`Clock`], so the same code drives the terminal,
//! the web page and the tests.
//!
//! # Lifecycle
//!
//! ```text
//! bake ──► poll every check_interval ──► status WAITING/RUNNING ──► pull every pull_interval
//!              │   (other status: append payload)                        │ (max_pull_count rounds)
//!              └─◄──────────────────────────┘                            └──► stop, counter = 0
//! ```
//!
//! Nothing here runs on its own: a driver calls [`Dashboard::run_due`]
//! whenever [`Dashboard::time_until_next`] has elapsed.

pub mod clock;
pub mod display;
pub mod poller;
pub mod puller;
pub mod timer;

use std::time::Duration;

use serde::Serialize;

use crate::cluster::{ClusterApi, ClusterHandle, DashboardError, Transport};
use crate::config::OvenConfig;
use crate::ui::Action;

use clock::Clock;
use display::{DisplayBuffer, Entry, Region};
use poller::{ColorToggle, PollStep};
use puller::{PullCounter, TableBinding};
use timer::{TimerId, Timers};

pub const BAKE_STARTING_MSG: &str = "Starting cluster...stand by for reporting";
pub const BAKE_COMPLETE_MSG: &str = "CLUSTER IS FULLY BAKED. DATA COMING.";
pub const CHECKING_MSG: &str = "Just a moment!...checking";
pub const PULL_PLACEHOLDER: &str = "Working backwards from latest:";
pub const NO_RECORDS_MSG: &str = "no records yet";
pub const NO_CLUSTER_MSG: &str = "No active cluster to terminate";
pub const NO_TABLES_MSG: &str = "No tables configured to pull";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Loop timing and table bindings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub check_interval: Duration,
    pub pull_interval: Duration,
    pub max_pull_count: u32,
    pub tables: Vec<TableBinding>,
}

impl SessionSettings {
    pub fn from_config(config: &OvenConfig) -> Self {
        Self {
            check_interval: Duration::from_millis(config.polling.check_interval_ms),
            pull_interval: Duration::from_millis(config.polling.pull_interval_ms),
            max_pull_count: config.polling.max_pull_count,
            tables: config.tables.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&OvenConfig::default())
    }
}

/// Serializable view of the session for the web page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub cluster_id: Option<String>,
    pub polling: Option<String>,
    pub pulling: bool,
    pub pull_count: u32,
    pub max_pull_count: u32,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// The running poll loop and the cluster it watches.
#[derive(Debug, Clone)]
struct PollLoop {
    timer: TimerId,
    cluster: ClusterHandle,
}

pub struct Dashboard<T, C> {
    api: ClusterApi<T>,
    clock: C,
    settings: SessionSettings,
    timers: Timers,
    display: DisplayBuffer,
    cluster_id: Option<ClusterHandle>,
    poll: Option<PollLoop>,
    pull_timer: Option<TimerId>,
    pull_count: PullCounter,
    color: ColorToggle,
}

impl<T: Transport, C: Clock> Dashboard<T, C> {
    pub fn new(transport: T, clock: C, settings: SessionSettings) -> Self {
        let pull_count = PullCounter::new(settings.max_pull_count);
        Self {
            api: ClusterApi::new(transport),
            clock,
            settings,
            timers: Timers::new(),
            display: DisplayBuffer::new(),
            cluster_id: None,
            poll: None,
            pull_timer: None,
            pull_count,
            color: ColorToggle::new(),
        }
    }

    // -- UI entry point --

    /// Run the operation a control asked for.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Bake => {
                let _ = self.bake();
            }
            Action::Pull => {
                self.pull();
            }
            Action::Check(cluster) => self.check(cluster),
            Action::TerminateCurrent => self.terminate_current(),
            Action::Terminate(cluster) => {
                let _ = self.terminate(cluster);
            }
        }
    }

    // -- Bake / poll --

    /// Request a new cluster and start polling it.
    ///
    /// On failure the bake report shows the error and no poll loop starts.
    pub fn bake(&mut self) -> Result<ClusterHandle, DashboardError> {
        match self.api.bake() {
            Ok(cluster) => {
                self.cluster_id = Some(cluster.clone());
                self.display
                    .replace(Region::BakeReport, Entry::notice(BAKE_STARTING_MSG));
                self.start_polling(cluster.clone());
                Ok(cluster)
            }
            Err(e) => {
                self.display
                    .replace(Region::BakeReport, Entry::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Poll a cluster that was not baked by this session.
    pub fn check(&mut self, cluster: ClusterHandle) {
        self.cluster_id = Some(cluster.clone());
        self.display
            .replace(Region::BakeReport, Entry::notice(CHECKING_MSG));
        self.start_polling(cluster);
    }

    /// Start the status poll loop, cancelling any loop already running.
    pub fn start_polling(&mut self, cluster: ClusterHandle) -> TimerId {
        self.stop_polling();
        self.color = ColorToggle::new();
        let timer = self
            .timers
            .start(self.clock.now(), self.settings.check_interval);
        self.poll = Some(PollLoop { timer, cluster });
        timer
    }

    /// Stop the status poll loop. Returns `false` if none was running.
    pub fn stop_polling(&mut self) -> bool {
        match self.poll.take() {
            Some(poll) => self.timers.cancel(poll.timer),
            None => false,
        }
    }

    fn poll_tick(&mut self) {
        let Some(cluster) = self.poll.as_ref().map(|p| p.cluster.clone()) else {
            return;
        };

        let result = self.api.check(&cluster);
        match poller::next_step(result, &mut self.color) {
            PollStep::Ready => {
                self.stop_polling();
                self.pull();
                self.display
                    .append(Region::BakeReport, Entry::notice(BAKE_COMPLETE_MSG));
            }
            PollStep::Baking { payload, tone } => {
                self.display
                    .append(Region::BakeReport, Entry::new(payload, tone));
            }
            PollStep::Failed(e) => {
                self.display
                    .append(Region::BakeReport, Entry::error(e.to_string()));
            }
        }
    }

    // -- Pull --

    /// Start the data pull loop over the configured tables, cancelling any
    /// pull loop already running. Returns `None` when there is nothing to
    /// pull.
    pub fn pull(&mut self) -> Option<TimerId> {
        self.stop_pulling();

        if self.settings.tables.is_empty() {
            self.display
                .append(Region::BakeReport, Entry::notice(NO_TABLES_MSG));
            return None;
        }

        for binding in &self.settings.tables {
            self.display
                .replace(binding.region, Entry::notice(PULL_PLACEHOLDER));
        }

        let timer = self
            .timers
            .start(self.clock.now(), self.settings.pull_interval);
        self.pull_timer = Some(timer);
        Some(timer)
    }

    /// Stop the pull loop and reset the round counter.
    pub fn stop_pulling(&mut self) -> bool {
        self.pull_count.reset();
        match self.pull_timer.take() {
            Some(timer) => self.timers.cancel(timer),
            None => false,
        }
    }

    fn pull_tick(&mut self) {
        if !self.pull_count.begin_round() {
            self.stop_pulling();
            return;
        }

        for binding in &self.settings.tables {
            let entry = match self.api.pull(&binding.table) {
                Ok(records) => match puller::latest_record(&records) {
                    Some(record) => Entry::plain(record.to_string()),
                    None => Entry::notice(NO_RECORDS_MSG),
                },
                Err(e) => Entry::error(e.to_string()),
            };
            self.display.append(binding.region, entry);
        }

        if self.pull_count.is_exhausted() {
            self.stop_pulling();
        }
    }

    // -- Terminate --

    /// Terminate a cluster, which also becomes the active one.
    pub fn terminate(&mut self, cluster: ClusterHandle) -> Result<String, DashboardError> {
        self.cluster_id = Some(cluster.clone());
        let result = self.api.terminate(&cluster);
        let entry = match &result {
            // Shown as a JSON string literal, whatever the backend sent.
            Ok(body) => Entry::plain(serde_json::Value::String(body.clone()).to_string()),
            Err(e) => Entry::error(e.to_string()),
        };
        self.display.replace(Region::TerminateReport, entry);
        result
    }

    pub fn terminate_current(&mut self) {
        match self.cluster_id.clone() {
            Some(cluster) => {
                let _ = self.terminate(cluster);
            }
            None => self
                .display
                .replace(Region::TerminateReport, Entry::notice(NO_CLUSTER_MSG)),
        }
    }

    // -- Driving --

    /// Fire every timer due at the current time. Returns the number of
    /// ticks run.
    ///
    /// The time is read once, so a tick that outlasts its interval cannot
    /// keep this call from returning.
    pub fn run_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(id) = self.timers.pop_due(now) {
            fired += 1;
            if self.poll.as_ref().is_some_and(|p| p.timer == id) {
                self.poll_tick();
            } else if self.pull_timer == Some(id) {
                self.pull_tick();
            } else {
                self.timers.cancel(id);
            }
        }
        fired
    }

    /// Time left until the next tick, or `None` when both loops are stopped.
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.timers.next_deadline()?;
        Some(deadline.saturating_sub(self.clock.now()))
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    // -- Accessors --

    pub fn cluster_id(&self) -> Option<&ClusterHandle> {
        self.cluster_id.as_ref()
    }

    pub fn polled_cluster(&self) -> Option<&ClusterHandle> {
        self.poll.as_ref().map(|p| &p.cluster)
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn is_pulling(&self) -> bool {
        self.pull_timer.is_some()
    }

    pub fn pull_count(&self) -> u32 {
        self.pull_count.count()
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn api(&self) -> &ClusterApi<T> {
        &self.api
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayBuffer {
        &mut self.display
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            cluster_id: self.cluster_id.as_ref().map(ToString::to_string),
            polling: self.polled_cluster().map(ToString::to_string),
            pulling: self.is_pulling(),
            pull_count: self.pull_count.count(),
            max_pull_count: self.pull_count.max(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    use super::clock::ManualClock;
    use super::display::Tone;
    use super::*;

    /// Scripted transport: each path answers from its own queue, repeating
    /// the last answer once the queue runs dry.
    #[derive(Default)]
    struct Scripted {
        answers: RefCell<HashMap<String, VecDeque<Result<String, DashboardError>>>>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn on(self, path: &str, body: &str) -> Self {
            self.answers
                .borrow_mut()
                .entry(path.to_string())
                .or_default()
                .push_back(Ok(body.to_string()));
            self
        }

        fn calls_to(&self, path: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == path).count()
        }
    }

    impl Transport for Scripted {
        fn get(&self, path: &str) -> Result<String, DashboardError> {
            self.calls.borrow_mut().push(path.to_string());
            let mut answers = self.answers.borrow_mut();
            let Some(queue) = answers.get_mut(path) else {
                return Err(DashboardError::request_failed(path, "HTTP 404 Not Found"));
            };
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            check_interval: Duration::from_secs(30),
            pull_interval: Duration::from_secs(5),
            max_pull_count: 3,
            tables: vec![TableBinding::new("tweettest", Region::Tweet)],
        }
    }

    #[test]
    fn bake_failure_shows_error_and_starts_nothing() {
        let clock = ManualClock::new();
        let mut dash = Dashboard::new(Scripted::default(), clock, settings());
        assert!(dash.bake().is_err());
        assert!(dash.is_idle());
        let entries = dash.display().entries(Region::BakeReport);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tone, Tone::Error);
    }

    #[test]
    fn restarting_poll_cancels_previous_loop() {
        let clock = ManualClock::new();
        let mut dash = Dashboard::new(Scripted::default(), clock, settings());
        dash.check(ClusterHandle::new("j-1"));
        dash.check(ClusterHandle::new("j-2"));
        assert_eq!(dash.active_timers(), 1);
        assert_eq!(dash.polled_cluster().map(|c| c.as_str()), Some("j-2"));
    }

    #[test]
    fn pull_stops_after_cap_and_resets_counter() {
        let clock = ManualClock::new();
        let transport = Scripted::default().on("/pull/tweettest", r#"{"a": 1, "b": 2}"#);
        let mut dash = Dashboard::new(transport, clock.clone(), settings());

        dash.pull();
        for round in 1..=3 {
            clock.advance(Duration::from_secs(5));
            assert_eq!(dash.run_due(), 1);
            if round < 3 {
                assert_eq!(dash.pull_count(), round);
            }
        }
        assert!(!dash.is_pulling());
        assert_eq!(dash.pull_count(), 0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(dash.run_due(), 0);
        assert_eq!(dash.api().transport().calls_to("/pull/tweettest"), 3);

        let texts: Vec<&str> = dash
            .display()
            .entries(Region::Tweet)
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(texts, [PULL_PLACEHOLDER, "2", "2", "2"]);
    }

    #[test]
    fn empty_table_appends_notice() {
        let clock = ManualClock::new();
        let transport = Scripted::default().on("/pull/tweettest", "{}");
        let mut dash = Dashboard::new(transport, clock.clone(), settings());
        dash.pull();
        clock.advance(Duration::from_secs(5));
        dash.run_due();
        let last = dash.display().entries(Region::Tweet).last().cloned();
        assert_eq!(last, Some(Entry::notice(NO_RECORDS_MSG)));
    }

    #[test]
    fn no_tables_means_no_pull_loop() {
        let clock = ManualClock::new();
        let mut config = settings();
        config.tables.clear();
        let mut dash = Dashboard::new(Scripted::default(), clock, config);
        assert_eq!(dash.pull(), None);
        assert!(dash.is_idle());
    }

    #[test]
    fn terminate_without_cluster_writes_notice() {
        let clock = ManualClock::new();
        let transport = Scripted::default();
        let mut dash = Dashboard::new(transport, clock, settings());
        dash.terminate_current();
        assert_eq!(
            dash.display().entries(Region::TerminateReport),
            &[Entry::notice(NO_CLUSTER_MSG)]
        );
        assert!(dash.api().transport().calls.borrow().is_empty());
    }

    #[test]
    fn terminate_shows_body_as_json_string() {
        let clock = ManualClock::new();
        let transport = Scripted::default().on("/terminate/j-9", "terminated\n");
        let mut dash = Dashboard::new(transport, clock, settings());
        dash.dispatch(Action::Terminate(ClusterHandle::new("j-9")));
        assert_eq!(
            dash.display().entries(Region::TerminateReport),
            &[Entry::plain(r#""terminated\n""#)]
        );
        assert_eq!(dash.cluster_id().map(|c| c.as_str()), Some("j-9"));
    }

    #[test]
    fn summary_reflects_loops() {
        let clock = ManualClock::new();
        let mut dash = Dashboard::new(Scripted::default(), clock, settings());
        dash.check(ClusterHandle::new("j-5"));
        let summary = dash.summary();
        assert_eq!(summary.cluster_id.as_deref(), Some("j-5"));
        assert_eq!(summary.polling.as_deref(), Some("j-5"));
        assert!(!summary.pulling);
        assert_eq!(summary.max_pull_count, 3);
        assert_eq!(dash.time_until_next(), Some(Duration::from_secs(30)));
    }
}
