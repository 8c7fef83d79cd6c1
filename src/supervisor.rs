//! Restart long-lived background tasks when they stop.

use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Run `task` forever, restarting it `restart_delay` after each exit or panic.
pub async fn supervise<F, Fut>(name: &'static str, restart_delay: Duration, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut restarts: u64 = 0;
    loop {
        match tokio::spawn(task()).await {
            Ok(()) => error!("{name} stopped unexpectedly"),
            Err(e) => error!("{name} crashed: {e}"),
        }
        restarts += 1;
        info!("Restarting {name} in {restart_delay:?} (restart #{restarts})");
        tokio::time::sleep(restart_delay).await;
    }
}
