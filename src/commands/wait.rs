// ABOUTME: Wait command implementation.
// ABOUTME: Runs a standalone deployment monitor and fails if the target never answers.

use std::time::Duration;

use stevedore::config::MonitorConfig;
use stevedore::error::{Error, Result};
use stevedore::monitor::MonitorEvent;
use stevedore::output::Output;
use stevedore::probe::{HttpProber, ProbeTarget};

pub async fn wait(
    url: &str,
    contains: Option<String>,
    timeout: Option<Duration>,
    settings: &MonitorConfig,
    mut output: Output,
) -> Result<()> {
    let mut target = ProbeTarget::parse(url)?;
    if let Some(needle) = contains {
        target = target.containing(needle);
    }

    let mut monitor = settings.monitor_for(target);
    if let Some(timeout) = timeout {
        monitor = monitor.with_timeout(timeout);
    }
    let timeout = monitor.timeout();

    output.start_timer();
    output.progress(&format!(
        "Waiting up to {} ms for {}",
        timeout.as_millis(),
        url
    ));

    match monitor.run(&HttpProber::new()).await {
        MonitorEvent::Deployed => {
            output.success(&format!("{} is deployed", url));
            Ok(())
        }
        MonitorEvent::Undeployed => Err(Error::NotDeployed {
            target: url.to_string(),
            timeout,
        }),
    }
}
