// ABOUTME: Deployment monitor that polls a probe target until deployed or timed out.
// ABOUTME: Delivers exactly one terminal notification to its listeners, in registration order.

mod listener;

pub use listener::MonitorListener;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::probe::{ProbeTarget, Prober};

/// Default time to wait for a deployment before declaring it undeployed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Default pause between two probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal outcome of a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The target answers and matches the content check.
    Deployed,
    /// The target does not answer, or answers without the expected content.
    Undeployed,
}

impl MonitorEvent {
    fn opposite(self) -> Self {
        match self {
            MonitorEvent::Deployed => MonitorEvent::Undeployed,
            MonitorEvent::Undeployed => MonitorEvent::Deployed,
        }
    }
}

/// Lifecycle of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    NotStarted,
    Polling,
    Terminated(MonitorEvent),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("listeners must be registered before the monitor starts polling")]
    AlreadyStarted,
}

/// Polls a [`ProbeTarget`] to find out whether an artifact is deployed.
///
/// A monitor is single-use: [`run`](Self::run) and [`spawn`](Self::spawn)
/// consume it, so listeners can only be registered while it has not started
/// and no probe can happen after the terminal notification.
pub struct DeploymentMonitor {
    target: ProbeTarget,
    timeout: Duration,
    poll_interval: Duration,
    probe_timeout: Option<Duration>,
    expected: MonitorEvent,
    listeners: Vec<Arc<dyn MonitorListener>>,
    state: MonitorState,
}

impl std::fmt::Debug for DeploymentMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentMonitor")
            .field("target", &self.target.to_string())
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("expected", &self.expected)
            .field("listeners", &self.listeners.len())
            .field("state", &self.state)
            .finish()
    }
}

impl DeploymentMonitor {
    pub fn new(target: ProbeTarget) -> Self {
        Self {
            target,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: None,
            expected: MonitorEvent::Deployed,
            listeners: Vec::new(),
            state: MonitorState::NotStarted,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Cap a single probe below the overall timeout.
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = Some(probe_timeout);
        self
    }

    /// Watch for the target to go away instead of coming up.
    ///
    /// With `Undeployed` the loop ends as soon as a probe fails, and a target
    /// still answering at the deadline is reported as `Deployed`.
    pub fn expecting(mut self, expected: MonitorEvent) -> Self {
        self.expected = expected;
        self
    }

    /// Add a listener. Listeners are notified in the order they were registered.
    ///
    /// Fails with `AlreadyStarted` once polling has begun. Through the public
    /// API that cannot happen, since polling consumes the monitor; the check
    /// keeps the invariant local to this type.
    pub fn register_listener(
        &mut self,
        listener: Arc<dyn MonitorListener>,
    ) -> Result<(), MonitorError> {
        if self.state != MonitorState::NotStarted {
            return Err(MonitorError::AlreadyStarted);
        }
        self.listeners.push(listener);
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.target
    }

    /// Name of the monitored deployable: the probed address.
    pub fn name(&self) -> String {
        self.target.to_string()
    }

    /// Lifecycle state as seen by the owner of the monitor.
    ///
    /// `run` and `spawn` take the monitor by value, so a caller holding it
    /// always observes `NotStarted`. `Polling` and `Terminated` are only held
    /// while the loop owns the monitor, which logs them at debug and trace level.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn expected(&self) -> MonitorEvent {
        self.expected
    }

    /// Poll until the expected state is observed or the timeout elapses, then notify.
    ///
    /// When waiting for a deployment, Undeployed is never reported before
    /// `timeout` has elapsed. Probe and sleep durations are clamped to the
    /// remaining budget, so the report arrives within one poll interval of
    /// the deadline.
    pub async fn run<P: Prober + ?Sized>(mut self, prober: &P) -> MonitorEvent {
        self.state = MonitorState::Polling;
        tracing::debug!(
            "Checking URL [{}] for status using a timeout of [{}] ms...",
            self.target,
            self.timeout.as_millis()
        );
        tracing::trace!("{:?}", self);

        let deadline = deadline_after(self.timeout);
        let mut attempts: u32 = 0;

        let event = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break self.expected.opposite();
            }

            let probe_timeout = self
                .probe_timeout
                .map_or(remaining, |cap| cap.min(remaining));
            let result = prober.probe(&self.target, probe_timeout).await;
            attempts += 1;

            let observed = if self.target.is_satisfied_by(&result) {
                tracing::debug!("URL [{}] is responding...", self.target);
                MonitorEvent::Deployed
            } else {
                tracing::debug!(
                    "URL [{}] is not responding: {} {}",
                    self.target,
                    result.status_code,
                    result.status_message
                );
                MonitorEvent::Undeployed
            };
            if observed == self.expected {
                break observed;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        };

        self.state = MonitorState::Terminated(event);
        tracing::debug!("{:?} finished after {} probe(s)", self, attempts);
        self.notify(event);
        event
    }

    /// Run the poll loop on its own task.
    ///
    /// Dropping the handle detaches the task; the loop still ends on its own
    /// once the timeout elapses.
    pub fn spawn<P>(self, prober: Arc<P>) -> JoinHandle<MonitorEvent>
    where
        P: Prober + ?Sized + 'static,
    {
        tokio::spawn(async move { self.run(prober.as_ref()).await })
    }

    fn notify(&self, event: MonitorEvent) {
        for listener in &self.listeners {
            tracing::debug!("Notifying monitor listener for [{}]", self.target);
            match event {
                MonitorEvent::Deployed => listener.on_deployed(),
                MonitorEvent::Undeployed => listener.on_undeployed(),
            }
        }
    }
}

/// Roughly thirty years; stands in for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Prober answering from a script; the last entry repeats forever.
    struct ScriptedProber {
        script: Vec<ProbeResult>,
        calls: AtomicU32,
    }

    impl ScriptedProber {
        fn new(script: Vec<ProbeResult>) -> Self {
            Self {
                script,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, _target: &ProbeTarget, _timeout: Duration) -> ProbeResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.script[n.min(self.script.len() - 1)].clone()
        }
    }

    fn up(body: &str) -> ProbeResult {
        ProbeResult {
            success: true,
            status_code: 200,
            status_message: "OK".to_string(),
            body: Some(body.to_string()),
        }
    }

    fn refused() -> ProbeResult {
        ProbeResult::unreachable("connection refused")
    }

    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<(usize, MonitorEvent)>>>,
    }

    impl MonitorListener for Recorder {
        fn on_deployed(&self) {
            self.log.lock().push((self.id, MonitorEvent::Deployed));
        }

        fn on_undeployed(&self) {
            self.log.lock().push((self.id, MonitorEvent::Undeployed));
        }
    }

    fn target() -> ProbeTarget {
        ProbeTarget::parse("http://host/app").unwrap()
    }

    #[test]
    fn default_timeout_is_twenty_seconds() {
        let monitor = DeploymentMonitor::new(target());
        assert_eq!(monitor.timeout(), Duration::from_millis(20_000));
        assert_eq!(monitor.state(), MonitorState::NotStarted);
        assert_eq!(monitor.name(), "http://host/app");
    }

    #[tokio::test(start_paused = true)]
    async fn always_up_is_deployed_after_one_poll() {
        let prober = ScriptedProber::new(vec![up("")]);
        let monitor = DeploymentMonitor::new(target()).with_timeout(Duration::from_millis(5000));

        let event = monitor.run(&prober).await;

        assert_eq!(event, MonitorEvent::Deployed);
        assert_eq!(prober.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_beyond_instant_range_still_polls() {
        let prober = ScriptedProber::new(vec![refused(), refused(), up("")]);
        let monitor = DeploymentMonitor::new(target()).with_timeout(Duration::MAX);

        let event = monitor.run(&prober).await;

        assert_eq!(event, MonitorEvent::Deployed);
        assert_eq!(prober.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_saturates_instead_of_overflowing() {
        let now = Instant::now();
        assert!(deadline_after(Duration::MAX) >= now + FAR_FUTURE);
        assert_eq!(deadline_after(Duration::from_secs(2)), now + Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn always_refused_is_undeployed_no_earlier_than_timeout() {
        let prober = ScriptedProber::new(vec![refused()]);
        let timeout = Duration::from_millis(5000);
        let monitor = DeploymentMonitor::new(target()).with_timeout(timeout);
        let interval = monitor.poll_interval();

        let start = Instant::now();
        let event = monitor.run(&prober).await;
        let elapsed = start.elapsed();

        assert_eq!(event, MonitorEvent::Undeployed);
        assert!(elapsed >= timeout, "reported after {:?}", elapsed);
        assert!(elapsed <= timeout + interval, "reported after {:?}", elapsed);
        assert!(prober.calls() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_polling_until_content_matches() {
        let prober = ScriptedProber::new(vec![refused(), up("starting"), up("ready")]);
        let monitor = DeploymentMonitor::new(target().containing("ready"));

        let event = monitor.run(&prober).await;

        assert_eq!(event, MonitorEvent::Deployed);
        assert_eq!(prober.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn notifies_every_listener_once_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = DeploymentMonitor::new(target());
        for id in 0..3 {
            monitor
                .register_listener(Arc::new(Recorder {
                    id,
                    log: log.clone(),
                }))
                .unwrap();
        }

        let prober = ScriptedProber::new(vec![refused(), up("")]);
        monitor.run(&prober).await;

        assert_eq!(
            *log.lock(),
            vec![
                (0, MonitorEvent::Deployed),
                (1, MonitorEvent::Deployed),
                (2, MonitorEvent::Deployed),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn undeployed_is_delivered_to_listeners() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = DeploymentMonitor::new(target()).with_timeout(Duration::from_secs(1));
        monitor
            .register_listener(Arc::new(Recorder {
                id: 7,
                log: log.clone(),
            }))
            .unwrap();

        monitor.run(&ScriptedProber::new(vec![refused()])).await;

        assert_eq!(*log.lock(), vec![(7, MonitorEvent::Undeployed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_never_probes() {
        let prober = ScriptedProber::new(vec![up("")]);
        let monitor = DeploymentMonitor::new(target()).with_timeout(Duration::ZERO);

        assert_eq!(monitor.run(&prober).await, MonitorEvent::Undeployed);
        assert_eq!(prober.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expecting_undeployed_stops_at_first_failed_probe() {
        let prober = ScriptedProber::new(vec![up(""), up(""), refused()]);
        let monitor = DeploymentMonitor::new(target()).expecting(MonitorEvent::Undeployed);

        assert_eq!(monitor.run(&prober).await, MonitorEvent::Undeployed);
        assert_eq!(prober.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn expecting_undeployed_reports_deployed_if_still_up_at_deadline() {
        let prober = ScriptedProber::new(vec![up("")]);
        let monitor = DeploymentMonitor::new(target())
            .with_timeout(Duration::from_secs(2))
            .expecting(MonitorEvent::Undeployed);

        let start = Instant::now();
        assert_eq!(monitor.run(&prober).await, MonitorEvent::Deployed);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_monitor_reports_through_join_handle() {
        let prober = Arc::new(ScriptedProber::new(vec![refused(), refused(), up("")]));
        let handle = DeploymentMonitor::new(target()).spawn(prober.clone());

        assert_eq!(handle.await.unwrap(), MonitorEvent::Deployed);
        assert_eq!(prober.calls(), 3);
    }
}
