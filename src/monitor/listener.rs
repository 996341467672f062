// ABOUTME: Listener capability notified when a monitor reaches its terminal state.
// ABOUTME: Closures taking a MonitorEvent implement it directly.

use super::MonitorEvent;

/// Receives the single terminal notification of a [`super::DeploymentMonitor`].
///
/// Listeners do not own the monitor. They must return quickly since they
/// run on the monitor's task.
pub trait MonitorListener: Send + Sync {
    fn on_deployed(&self);

    fn on_undeployed(&self);
}

impl<F> MonitorListener for F
where
    F: Fn(MonitorEvent) + Send + Sync,
{
    fn on_deployed(&self) {
        self(MonitorEvent::Deployed)
    }

    fn on_undeployed(&self) {
        self(MonitorEvent::Undeployed)
    }
}
