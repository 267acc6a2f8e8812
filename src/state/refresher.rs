use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Periodic resync: re-reads both store nodes every 30 seconds so a change
/// missed during a reconnect still shows up.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self { network_requests }
    }

    pub async fn run(self) {
        let mut resync_interval = interval(Duration::from_secs(30));
        // The subscriptions deliver the first full snapshot themselves.
        resync_interval.tick().await;

        loop {
            resync_interval.tick().await;
            if self.network_requests.send(NetworkRequest::Resync).await.is_err() {
                break;
            }
        }
    }
}
