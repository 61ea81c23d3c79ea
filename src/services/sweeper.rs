use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{info, warn};

use super::sessions::SessionManager;

/// Periodically deletes expired session rows. Storage hygiene only: expired
/// sessions are already rejected by `validate`.
pub fn spawn(sessions: SessionManager, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "removed expired sessions"),
                Err(err) => warn!("session sweep failed: {err}"),
            }
        }
    })
}
