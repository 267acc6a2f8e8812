use crate::state::messages::{StoreEvent, StorePath};
use groupstage_core::store::RealtimeDb;
use log::{info, warn};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Follows one store node and forwards its full value after every change.
/// Reconnects after a short pause whenever the stream drops.
#[derive(Debug)]
pub struct SubscriptionWorker {
    pub db: RealtimeDb,
    pub path: StorePath,
    pub events: mpsc::Sender<StoreEvent>,
}

impl SubscriptionWorker {
    pub async fn run(self) {
        loop {
            match self.db.subscribe(self.path.as_str()).await {
                Ok(mut subscription) => {
                    info!("subscribed to {}", self.path.as_str());
                    if !self.emit(StoreEvent::Connected(self.path)).await {
                        return;
                    }
                    loop {
                        match subscription.next_value().await {
                            Ok(Some(value)) => {
                                if !self.emit(StoreEvent::Changed { path: self.path, value }).await {
                                    return;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                warn!("{} stream failed: {e}", self.path.as_str());
                                if !self.emit(StoreEvent::Error(e.to_string())).await {
                                    return;
                                }
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    if !self
                        .emit(StoreEvent::Error(format!("{} subscribe failed: {e}", self.path.as_str())))
                        .await
                    {
                        return;
                    }
                }
            }

            if !self.emit(StoreEvent::Disconnected(self.path)).await {
                return;
            }
            sleep(RECONNECT_DELAY).await;
        }
    }

    /// Returns false once the UI loop has gone away.
    async fn emit(&self, event: StoreEvent) -> bool {
        self.events.send(event).await.is_ok()
    }
}
