use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use groupstage_core::Write;
use groupstage_core::auth::Session;
use serde_json::Value;

/// The two nodes the scoreboard follows below the database root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePath {
    Groups,
    Matches,
}

impl StorePath {
    pub fn as_str(self) -> &'static str {
        match self {
            StorePath::Groups => "groups",
            StorePath::Matches => "matches",
        }
    }
}

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    /// Remote writes produced by one admin action, applied in order.
    Persist { writes: Vec<Write> },
    SignIn { email: String, password: String },
    SignOut,
    /// Re-read both nodes in case a change was missed while disconnected.
    Resync,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    Persisted { count: usize },
    SignedIn { session: Session },
    SignedOut,
    Resynced { groups: Value, matches: Value },
    Error { message: String },
}

/// Pushed by the change-subscription workers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Connected(StorePath),
    Changed { path: StorePath, value: Value },
    Disconnected(StorePath),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
