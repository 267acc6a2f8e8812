use crate::state::messages::{NetworkRequest, NetworkResponse, StorePath};
use groupstage_core::Write;
use groupstage_core::auth::AuthClient;
use groupstage_core::store::RealtimeDb;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Runs store writes and sign-in requests one at a time, in the order they
/// were queued.
pub struct NetworkWorker {
    db: Option<RealtimeDb>,
    auth: Option<AuthClient>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        db: Option<RealtimeDb>,
        auth: Option<AuthClient>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            db,
            auth,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let result = match request {
                NetworkRequest::Persist { writes } => self.handle_persist(writes).await,
                NetworkRequest::SignIn { email, password } => self.handle_sign_in(email, password).await,
                NetworkRequest::SignOut => Ok(self.handle_sign_out()),
                NetworkRequest::Resync => self.handle_resync().await,
            };

            debug!("network request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|message| NetworkResponse::Error { message });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    /// Stops at the first failed write; nothing is retried.
    async fn handle_persist(&self, writes: Vec<Write>) -> Result<NetworkResponse, String> {
        let Some(db) = &self.db else {
            return Ok(NetworkResponse::Persisted { count: 0 });
        };
        let mut count = 0;
        for write in writes.iter().filter(|w| w.is_remote()) {
            if let Err(e) = db.apply(write).await {
                warn!("write to {} failed: {e}", write.path().unwrap_or_default());
                return Err(format!("Could not save: {e}"));
            }
            count += 1;
        }
        Ok(NetworkResponse::Persisted { count })
    }

    async fn handle_sign_in(&mut self, email: String, password: String) -> Result<NetworkResponse, String> {
        let Some(auth) = &self.auth else {
            return Err("Auth not ready".to_string());
        };
        let session = auth.sign_in(&email, &password).await.map_err(|e| e.to_string())?;
        if let Some(db) = self.db.as_mut() {
            db.set_auth_token(Some(session.id_token.clone()));
        }
        Ok(NetworkResponse::SignedIn { session })
    }

    fn handle_sign_out(&mut self) -> NetworkResponse {
        if let Some(db) = self.db.as_mut() {
            db.set_auth_token(None);
        }
        info!("signed out");
        NetworkResponse::SignedOut
    }

    async fn handle_resync(&self) -> Result<NetworkResponse, String> {
        let Some(db) = &self.db else {
            return Ok(NetworkResponse::Persisted { count: 0 });
        };
        debug!("resyncing groups and matches");
        let groups = db.get(StorePath::Groups.as_str()).await.map_err(|e| e.to_string())?;
        let matches = db.get(StorePath::Matches.as_str()).await.map_err(|e| e.to_string())?;
        Ok(NetworkResponse::Resynced { groups, matches })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
