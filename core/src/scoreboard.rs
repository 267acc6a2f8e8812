//! The coordinating object: owns the table, the fixture mirror and the undo
//! history, and turns admin actions into state changes plus store writes.

use crate::error::ScoreboardError;
use crate::ledger::parse_score;
use crate::normalize::{normalize_groups, normalize_matches};
use crate::push_id::PushIdGenerator;
use crate::roster::{Confirmed, StatAdjustment};
use crate::standings::{display_rows, recalculate_in_place};
use crate::undo::UndoStack;
use crate::{DisplayRow, Group, GroupTable, MatchLedger, MatchRecord, TeamId, TeamRecord};
use log::{debug, info};
use serde_json::Value;

/// How a deployment keeps its standings. The two must not be mixed in one dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StandingsMode {
    /// Standings are rebuilt from the fixture results after every change.
    #[default]
    Matches,
    /// Legacy direct entry: stats are edited by hand and fixtures are off.
    Manual,
}

impl StandingsMode {
    pub fn from_setting(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "matches" => Some(StandingsMode::Matches),
            "manual" => Some(StandingsMode::Manual),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StandingsMode::Matches => "matches",
            StandingsMode::Manual => "manual",
        }
    }

    pub fn uses_fixtures(self) -> bool {
        self == StandingsMode::Matches
    }
}

/// Who may change what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No remote store configured. The roster is edited locally, fixtures are unavailable.
    LocalOnly,
    Remote {
        auth_ready: bool,
        /// Email of the signed-in admin.
        admin: Option<String>,
    },
}

/// A change the caller must persist after a successful action.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Set `<root>/groups` and refresh the local cache.
    Groups(GroupTable),
    SetMatch {
        group: Group,
        id: String,
        record: MatchRecord,
    },
    /// Partial update of the two score fields.
    UpdateScore {
        group: Group,
        id: String,
        score_a: u32,
        score_b: u32,
    },
    RemoveMatch {
        group: Group,
        id: String,
    },
    /// Drop the local cache entry.
    ClearLocal,
}

impl Write {
    /// Store path below the database root, or `None` for local-only writes.
    pub fn path(&self) -> Option<String> {
        match self {
            Write::Groups(_) => Some("groups".to_string()),
            Write::SetMatch { group, id, .. }
            | Write::UpdateScore { group, id, .. }
            | Write::RemoveMatch { group, id } => Some(format!("matches/{}/{id}", group.key())),
            Write::ClearLocal => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.path().is_some()
    }
}

pub struct Scoreboard {
    table: GroupTable,
    ledger: MatchLedger,
    undo: UndoStack,
    mode: StandingsMode,
    access: Access,
    ids: PushIdGenerator,
}

impl Scoreboard {
    /// Starts from `table` as loaded; stats are left as they are until the first
    /// fixture push arrives.
    pub fn new(table: GroupTable, mode: StandingsMode, access: Access) -> Self {
        Self {
            table,
            ledger: MatchLedger::new(),
            undo: UndoStack::new(),
            mode,
            access,
            ids: PushIdGenerator::new(),
        }
    }

    pub fn table(&self) -> &GroupTable {
        &self.table
    }

    pub fn ledger(&self) -> &MatchLedger {
        &self.ledger
    }

    pub fn mode(&self) -> StandingsMode {
        self.mode
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn team(&self, group: Group, id: &TeamId) -> Option<&TeamRecord> {
        let index = self.table.position_of(group, id)?;
        self.table.team(group, index)
    }

    /// Records the outcome of a sign-in or sign-out. No effect in local-only mode.
    pub fn sign_in_as(&mut self, email: Option<String>) {
        if let Access::Remote { admin, .. } = &mut self.access {
            *admin = email;
        }
    }

    pub fn admin(&self) -> Option<&str> {
        match &self.access {
            Access::Remote { admin, .. } => admin.as_deref(),
            Access::LocalOnly => None,
        }
    }

    pub fn auth_status(&self) -> String {
        match &self.access {
            Access::LocalOnly => "Local only".to_string(),
            Access::Remote { auth_ready: false, .. } => "Auth not ready".to_string(),
            Access::Remote { admin: Some(email), .. } => format!("Signed in as {email}"),
            Access::Remote { admin: None, .. } => "Not signed in".to_string(),
        }
    }

    // -- produced surface --

    pub fn display_rows(&self, group: Group) -> Vec<DisplayRow> {
        display_rows(self.table.teams(group))
    }

    pub fn upcoming(&self, group: Group) -> Vec<&MatchRecord> {
        self.ledger.upcoming(group)
    }

    pub fn results(&self, group: Group) -> Vec<&MatchRecord> {
        self.ledger.results(group)
    }

    // -- remote pushes --

    /// Replaces the table with a pushed `groups` value. Values that are neither an
    /// object nor an array are ignored and `false` is returned.
    pub fn apply_remote_groups(&mut self, raw: &Value) -> bool {
        if !(raw.is_object() || raw.is_array()) {
            debug!("ignoring groups push of unexpected shape");
            return false;
        }
        self.table = normalize_groups(raw);
        self.recalculate_if_matches();
        true
    }

    /// Replaces the fixture mirror with a pushed `matches` value; `null` empties it.
    pub fn apply_remote_matches(&mut self, raw: &Value) {
        self.ledger = normalize_matches(raw);
        self.recalculate_if_matches();
    }

    // -- roster actions --

    pub fn add_team(&mut self, group: Group, name: &str) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        let id = TeamId(self.ids.next_id());
        self.commit_roster(|table| table.add_team(group, id, name).map(|_| ()))?;
        Ok(self.groups_written())
    }

    pub fn rename_team(&mut self, group: Group, id: &TeamId, new_name: &str) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        let index = self.resolve(group, id)?;
        self.commit_roster(|table| table.rename_team(group, index, new_name))?;
        Ok(self.groups_written())
    }

    /// The team a removal would take out, for the confirmation prompt.
    pub fn removable_team(&self, group: Group, id: &TeamId) -> Result<&TeamRecord, ScoreboardError> {
        self.authorize()?;
        let index = self.resolve(group, id)?;
        self.table.removable(group, index)
    }

    pub fn remove_team(
        &mut self,
        group: Group,
        id: &TeamId,
        confirmed: Confirmed,
    ) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        let index = self.resolve(group, id)?;
        let removed = self.commit_roster(|table| table.remove_team(group, index, confirmed))?;
        info!("removed {} from {}", removed.name, group.label());
        Ok(self.groups_written())
    }

    pub fn adjust_team(
        &mut self,
        group: Group,
        id: &TeamId,
        adjustment: StatAdjustment,
    ) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        self.require_manual()?;
        let index = self.resolve(group, id)?;
        self.commit_roster(|table| table.adjust(group, index, adjustment))?;
        Ok(self.groups_written())
    }

    /// Legacy direct result entry, applied to the two teams without a fixture.
    pub fn record_result(
        &mut self,
        group: Group,
        team_a: &TeamId,
        team_b: &TeamId,
        score_a: &str,
        score_b: &str,
    ) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        self.require_manual()?;
        let index_a = self.resolve(group, team_a)?;
        let index_b = self.resolve(group, team_b)?;
        let score_a = parse_score(score_a)?;
        let score_b = parse_score(score_b)?;
        self.commit_roster(|table| table.record_result(group, index_a, index_b, score_a, score_b))?;
        Ok(self.groups_written())
    }

    // -- fixture actions --

    pub fn add_match(
        &mut self,
        group: Group,
        team_a: &str,
        team_b: &str,
        time: &str,
        pitch: &str,
    ) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize_ledger()?;
        let id = self.ids.next_id();
        let record = self.ledger.add_match(group, id.clone(), team_a, team_b, time, pitch)?.clone();
        debug!("added fixture {id} to {}", group.label());
        Ok(vec![Write::SetMatch { group, id, record }])
    }

    pub fn save_score(
        &mut self,
        group: Group,
        id: &str,
        score_a: &str,
        score_b: &str,
    ) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize_ledger()?;
        let (score_a, score_b) = self.ledger.update_score(group, id, score_a, score_b)?;
        self.recalculate_if_matches();
        Ok(vec![
            Write::UpdateScore {
                group,
                id: id.to_string(),
                score_a,
                score_b,
            },
            Write::Groups(self.table.clone()),
        ])
    }

    /// Deleting a fixture that is already gone succeeds with nothing to write.
    pub fn delete_match(&mut self, group: Group, id: &str, _confirmed: Confirmed) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize_ledger()?;
        let Some(removed) = self.ledger.delete_match(group, id) else {
            return Ok(Vec::new());
        };
        let mut writes = vec![Write::RemoveMatch {
            group,
            id: id.to_string(),
        }];
        if removed.is_result() {
            self.recalculate_if_matches();
            writes.push(Write::Groups(self.table.clone()));
        }
        Ok(writes)
    }

    // -- history --

    /// Restores the table as it was before the last roster action. Fixture
    /// actions never push a snapshot, so they are neither undone nor counted.
    pub fn undo(&mut self) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        let previous = self
            .undo
            .undo()
            .ok_or_else(|| ScoreboardError::not_found("No actions to undo!"))?;
        self.table = previous;
        self.recalculate_if_matches();
        Ok(self.groups_written())
    }

    /// Back to the seed table with an empty history.
    pub fn reset(&mut self, _confirmed: Confirmed) -> Result<Vec<Write>, ScoreboardError> {
        self.authorize()?;
        self.undo.clear();
        self.table = GroupTable::with_defaults();
        self.recalculate_if_matches();
        info!("tournament reset to the default table");
        Ok(vec![Write::ClearLocal, Write::Groups(self.table.clone())])
    }

    // -- helpers --

    fn authorize(&self) -> Result<(), ScoreboardError> {
        match &self.access {
            Access::LocalOnly => Ok(()),
            Access::Remote { auth_ready: false, .. } => Err(ScoreboardError::not_ready("Auth not ready")),
            Access::Remote { admin: None, .. } => Err(ScoreboardError::Unauthorized),
            Access::Remote { admin: Some(_), .. } => Ok(()),
        }
    }

    fn authorize_ledger(&self) -> Result<(), ScoreboardError> {
        if self.access == Access::LocalOnly {
            return Err(ScoreboardError::not_ready("No database configured; fixtures are unavailable."));
        }
        self.authorize()?;
        if self.mode == StandingsMode::Manual {
            return Err(ScoreboardError::validation("Fixtures are disabled in manual mode."));
        }
        Ok(())
    }

    fn require_manual(&self) -> Result<(), ScoreboardError> {
        match self.mode {
            StandingsMode::Manual => Ok(()),
            StandingsMode::Matches => Err(ScoreboardError::validation(
                "Standings come from match results; edit the fixtures instead.",
            )),
        }
    }

    fn resolve(&self, group: Group, id: &TeamId) -> Result<usize, ScoreboardError> {
        self.table
            .position_of(group, id)
            .ok_or_else(|| ScoreboardError::not_found(format!("That team is no longer in {}.", group.label())))
    }

    /// Runs a roster mutation. On success the prior table goes onto the undo
    /// stack; on failure the table is put back untouched.
    fn commit_roster<T>(
        &mut self,
        mutate: impl FnOnce(&mut GroupTable) -> Result<T, ScoreboardError>,
    ) -> Result<T, ScoreboardError> {
        let before = self.table.clone();
        match mutate(&mut self.table) {
            Ok(out) => {
                self.undo.push(before);
                self.recalculate_if_matches();
                Ok(out)
            }
            Err(e) => {
                self.table = before;
                Err(e)
            }
        }
    }

    /// Standings are only rebuilt when fixtures can exist, so a local-only table
    /// keeps the stats it was loaded with.
    fn recalculate_if_matches(&mut self) {
        if self.mode == StandingsMode::Matches && self.access != Access::LocalOnly {
            let summary = recalculate_in_place(&mut self.table, &self.ledger);
            debug!(
                "recalculated standings: {} results applied, {} skipped",
                summary.applied, summary.skipped
            );
        }
    }

    fn groups_written(&self) -> Vec<Write> {
        vec![Write::Groups(self.table.clone())]
    }
}
