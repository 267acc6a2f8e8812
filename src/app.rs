use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, StatusLine};
use crate::state::messages::{NetworkRequest, StoreEvent, StorePath};
use crate::state::prompt::{ConfirmAction, Prompt, PromptInput, PromptKind};
use chrono::Utc;
use crossterm::event::KeyEvent;
use groupstage_core::auth::Session;
use groupstage_core::local::{self, FileStorage, LocalStorage, MemoryStorage};
use groupstage_core::roster::{Confirmed, StatAdjustment};
use groupstage_core::{Access, Group, Scoreboard, ScoreboardError, StandingsMode, TeamId, Write};
use log::{debug, info, warn};
use serde_json::Value;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Fixtures,
    Admin,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub board: Scoreboard,
    pub session: Option<Session>,
    storage: Box<dyn LocalStorage + Send>,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let storage: Box<dyn LocalStorage + Send> =
            match settings.data_dir.clone().or_else(FileStorage::default_dir) {
                Some(dir) => Box::new(FileStorage::new(dir)),
                None => {
                    warn!("no config directory found; local cache kept in memory only");
                    Box::new(MemoryStorage::new())
                }
            };
        Self::with_storage(settings, storage)
    }

    pub fn with_storage(settings: AppSettings, storage: Box<dyn LocalStorage + Send>) -> Self {
        let table = local::load_groups(&*storage);
        let board = Scoreboard::new(table, settings.mode, settings.access());
        let mut app = Self {
            settings,
            state: AppState::new(),
            board,
            session: None,
            storage,
        };
        app.refresh_selection(None);
        app
    }

    // -----------------------------------------------------------------------
    // Worker events: called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Connected(path) => self.state.connection.set(path, true),
            StoreEvent::Disconnected(path) => self.state.connection.set(path, false),
            StoreEvent::Changed { path, value } => self.apply_remote(path, &value),
            StoreEvent::Error(message) => self.set_error(message),
        }
    }

    pub fn on_resynced(&mut self, groups: Value, matches: Value) {
        self.apply_remote(StorePath::Groups, &groups);
        self.apply_remote(StorePath::Matches, &matches);
    }

    pub fn on_signed_in(&mut self, session: Session) {
        self.board.sign_in_as(Some(session.email.clone()));
        self.set_status(format!("Signed in as {}", session.email));
        self.session = Some(session);
    }

    pub fn on_signed_out(&mut self) {
        self.session = None;
        self.board.sign_in_as(None);
    }

    pub fn on_persisted(&mut self, count: usize) {
        debug!("{count} remote writes applied");
    }

    pub fn on_error(&mut self, message: String) {
        self.set_error(message);
    }

    fn apply_remote(&mut self, path: StorePath, value: &Value) {
        let previous = self.selected_team_index();
        match path {
            StorePath::Groups => {
                if self.board.apply_remote_groups(value)
                    && let Err(e) = local::save_groups(&mut *self.storage, self.board.table())
                {
                    warn!("could not cache pushed table: {e}");
                }
            }
            StorePath::Matches => self.board.apply_remote_matches(value),
        }
        self.refresh_selection(previous);
    }

    // -----------------------------------------------------------------------
    // Tabs, groups and selection
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn next_group(&mut self) {
        self.select_group(self.state.group.next());
    }

    pub fn prev_group(&mut self) {
        self.select_group(self.state.group.prev());
    }

    fn select_group(&mut self, group: Group) {
        self.state.group = group;
        self.state.team.id = None;
        self.state.fixture.id = None;
        self.refresh_selection(None);
    }

    pub fn team_down(&mut self) {
        self.state.team.step(self.board.table(), self.state.group, true);
    }

    pub fn team_up(&mut self) {
        self.state.team.step(self.board.table(), self.state.group, false);
    }

    pub fn fixture_down(&mut self) {
        self.state.fixture.step(self.board.ledger(), self.state.group, true);
    }

    pub fn fixture_up(&mut self) {
        self.state.fixture.step(self.board.ledger(), self.state.group, false);
    }

    pub fn selected_team_index(&self) -> Option<usize> {
        self.state.team.index(self.board.table(), self.state.group)
    }

    fn selected_team(&self) -> Option<(TeamId, String)> {
        let index = self.selected_team_index()?;
        let team = self.board.table().team(self.state.group, index)?;
        Some((team.id.clone(), team.name.clone()))
    }

    fn refresh_selection(&mut self, previous_team_index: Option<usize>) {
        let group = self.state.group;
        self.state.team.refresh(self.board.table(), group, previous_team_index);
        self.state.fixture.refresh(self.board.ledger(), group);
    }

    // -----------------------------------------------------------------------
    // Admin actions: each returns the request the network worker should run
    // -----------------------------------------------------------------------

    pub fn open_add_team(&mut self) {
        self.state.prompt = Some(Prompt::add_team(self.state.group.label()));
    }

    pub fn open_rename_team(&mut self) {
        match self.selected_team() {
            Some((id, name)) => self.state.prompt = Some(Prompt::rename_team(id, &name)),
            None => self.set_error("Select a team first."),
        }
    }

    pub fn open_remove_team(&mut self) {
        let Some((id, _)) = self.selected_team() else {
            self.set_error("Select a team first.");
            return;
        };
        match self.board.removable_team(self.state.group, &id) {
            Ok(team) => {
                let name = team.name.clone();
                self.state.prompt = Some(Prompt::confirm(ConfirmAction::RemoveTeam { id, name }));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub fn adjust_selected(&mut self, adjustment: StatAdjustment) -> Option<NetworkRequest> {
        let Some((id, name)) = self.selected_team() else {
            self.set_error("Select a team first.");
            return None;
        };
        let group = self.state.group;
        self.run(
            |board| board.adjust_team(group, &id, adjustment),
            format!("{name}: {} recorded", adjustment.label()),
        )
    }

    pub fn open_record_result(&mut self) {
        if self.board.mode() != StandingsMode::Manual {
            self.set_error("Direct result entry is only available in manual mode.");
            return;
        }
        let name = self.selected_team().map(|(_, name)| name).unwrap_or_default();
        self.state.prompt = Some(Prompt::record_result(self.state.group.label(), &name));
    }

    pub fn open_add_match(&mut self) {
        let name = self.selected_team().map(|(_, name)| name).unwrap_or_default();
        self.state.prompt = Some(Prompt::add_match(self.state.group.label(), &name));
    }

    pub fn open_save_score(&mut self) {
        match self.state.fixture.selected(self.board.ledger(), self.state.group) {
            Some(m) => {
                let prompt = Prompt::save_score(m.id.clone(), &m.team_a, &m.team_b);
                self.state.prompt = Some(prompt);
            }
            None => self.set_error("Select a fixture first."),
        }
    }

    pub fn open_delete_match(&mut self) {
        match self.state.fixture.selected(self.board.ledger(), self.state.group) {
            Some(m) => {
                let action = ConfirmAction::DeleteMatch {
                    id: m.id.clone(),
                    label: format!("{} v {}", m.team_a, m.team_b),
                };
                self.state.prompt = Some(Prompt::confirm(action));
            }
            None => self.set_error("Select a fixture first."),
        }
    }

    pub fn undo(&mut self) -> Option<NetworkRequest> {
        self.run(|board| board.undo(), "Undid the last change")
    }

    pub fn open_reset(&mut self) {
        self.state.prompt = Some(Prompt::confirm(ConfirmAction::Reset));
    }

    pub fn open_sign_in(&mut self) {
        match self.board.access() {
            Access::LocalOnly => self.set_error("No database configured; nothing to sign in to."),
            Access::Remote { auth_ready: false, .. } => self.set_error("Auth not ready"),
            Access::Remote { .. } => self.state.prompt = Some(Prompt::sign_in()),
        }
    }

    pub fn sign_out(&mut self) -> Option<NetworkRequest> {
        if self.session.is_none() {
            self.set_status("Not signed in");
            return None;
        }
        self.on_signed_out();
        self.set_status("Signed out");
        Some(NetworkRequest::SignOut)
    }

    pub fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<NetworkRequest> {
        let prompt = self.state.prompt.as_mut()?;
        match prompt.handle_key(key) {
            PromptInput::Pending => None,
            PromptInput::Cancelled => {
                self.state.prompt = None;
                None
            }
            PromptInput::Submitted => {
                let prompt = self.state.prompt.take()?;
                self.submit_prompt(prompt)
            }
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) -> Option<NetworkRequest> {
        let group = self.state.group;
        match &prompt.kind {
            PromptKind::AddTeam => {
                let name = prompt.value(0).trim();
                self.run(
                    |board| board.add_team(group, name),
                    format!("Added {name} to {}", group.label()),
                )
            }
            PromptKind::RenameTeam { id } => {
                let name = prompt.value(0).trim();
                self.run(|board| board.rename_team(group, id, name), format!("Renamed to {name}"))
            }
            PromptKind::AddMatch => self.run(
                |board| {
                    board.add_match(group, prompt.value(0), prompt.value(1), prompt.value(2), prompt.value(3))
                },
                "Fixture added",
            ),
            PromptKind::SaveScore { id } => self.run(
                |board| board.save_score(group, id, prompt.value(0), prompt.value(1)),
                "Score saved",
            ),
            PromptKind::RecordResult => {
                let team_a = self.team_id_by_name(group, prompt.value(0))?;
                let team_b = self.team_id_by_name(group, prompt.value(1))?;
                self.run(
                    |board| board.record_result(group, &team_a, &team_b, prompt.value(2), prompt.value(3)),
                    "Result recorded",
                )
            }
            PromptKind::SignIn => {
                let email = prompt.value(0).trim().to_string();
                let password = prompt.value(1).to_string();
                if email.is_empty() || password.is_empty() {
                    self.set_error("Enter email and password");
                    return None;
                }
                self.set_status("Signing in...");
                Some(NetworkRequest::SignIn { email, password })
            }
            PromptKind::Confirm(ConfirmAction::RemoveTeam { id, name }) => self.run(
                |board| board.remove_team(group, id, Confirmed::by_user()),
                format!("Removed {name}"),
            ),
            PromptKind::Confirm(ConfirmAction::DeleteMatch { id, .. }) => self.run(
                |board| board.delete_match(group, id, Confirmed::by_user()),
                "Fixture deleted",
            ),
            PromptKind::Confirm(ConfirmAction::Reset) => {
                self.run(|board| board.reset(Confirmed::by_user()), "Tournament reset")
            }
        }
    }

    fn team_id_by_name(&mut self, group: Group, name: &str) -> Option<TeamId> {
        let name = name.trim();
        let found = self
            .board
            .table()
            .teams(group)
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id.clone());
        if found.is_none() {
            self.set_error(format!("No team called {name:?} in {}.", group.label()));
        }
        found
    }

    /// Runs one scoreboard action: checks the session, applies the action,
    /// caches the table locally and hands back the remote writes.
    fn run(
        &mut self,
        action: impl FnOnce(&mut Scoreboard) -> Result<Vec<Write>, ScoreboardError>,
        done: impl Into<String>,
    ) -> Option<NetworkRequest> {
        if let Some(request) = self.expire_session() {
            return Some(request);
        }
        let previous = self.selected_team_index();
        match action(&mut self.board) {
            Ok(writes) => {
                self.refresh_selection(previous);
                self.set_status(done);
                self.persist(writes)
            }
            Err(e) => {
                self.set_error(e.to_string());
                None
            }
        }
    }

    fn persist(&mut self, writes: Vec<Write>) -> Option<NetworkRequest> {
        for write in &writes {
            let result = match write {
                Write::Groups(table) => local::save_groups(&mut *self.storage, table),
                Write::ClearLocal => local::clear_groups(&mut *self.storage),
                _ => Ok(()),
            };
            if let Err(e) = result {
                warn!("local cache update failed: {e}");
            }
        }
        let remote: Vec<Write> = writes.into_iter().filter(Write::is_remote).collect();
        if remote.is_empty() || !self.settings.remote_enabled() {
            return None;
        }
        Some(NetworkRequest::Persist { writes: remote })
    }

    /// Drops a session whose token has run out, so the next write is refused
    /// locally instead of by the database.
    fn expire_session(&mut self) -> Option<NetworkRequest> {
        let expired = self.session.as_ref().is_some_and(|s| s.is_expired(Utc::now()));
        if !expired {
            return None;
        }
        info!("session expired");
        self.on_signed_out();
        self.set_error("Session expired; sign in again.");
        Some(NetworkRequest::SignOut)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.state.status = Some(StatusLine {
            message: message.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state.status = Some(StatusLine {
            message: message.into(),
            is_error: true,
        });
    }
}
