use crate::app::MenuItem;
use crate::state::messages::StorePath;
use crate::state::prompt::Prompt;
use groupstage_core::{Group, GroupTable, MatchLedger, MatchRecord, TeamId};

// ---------------------------------------------------------------------------
// Selection: held by stable id, turned into a position only when needed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TeamSelection {
    pub id: Option<TeamId>,
}

impl TeamSelection {
    pub fn index(&self, table: &GroupTable, group: Group) -> Option<usize> {
        self.id.as_ref().and_then(|id| table.position_of(group, id))
    }

    /// Keeps the selection on the same team when it still exists; otherwise
    /// falls back to the team now at the old position, or the last one.
    pub fn refresh(&mut self, table: &GroupTable, group: Group, previous_index: Option<usize>) {
        if self.index(table, group).is_some() {
            return;
        }
        let teams = table.teams(group);
        let fallback = previous_index.unwrap_or(0).min(teams.len().saturating_sub(1));
        self.id = teams.get(fallback).map(|t| t.id.clone());
    }

    pub fn step(&mut self, table: &GroupTable, group: Group, down: bool) {
        let teams = table.teams(group);
        if teams.is_empty() {
            self.id = None;
            return;
        }
        let next = match self.index(table, group) {
            Some(i) if down => (i + 1).min(teams.len() - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.id = Some(teams[next].id.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchSelection {
    pub id: Option<String>,
}

impl MatchSelection {
    /// Fixtures in the order the admin panel lists them: upcoming, then results.
    pub fn listed(ledger: &MatchLedger, group: Group) -> Vec<&MatchRecord> {
        let mut all = ledger.upcoming(group);
        all.extend(ledger.results(group));
        all
    }

    pub fn index(&self, ledger: &MatchLedger, group: Group) -> Option<usize> {
        let id = self.id.as_deref()?;
        Self::listed(ledger, group).iter().position(|m| m.id == id)
    }

    pub fn selected<'a>(&self, ledger: &'a MatchLedger, group: Group) -> Option<&'a MatchRecord> {
        ledger.get(group, self.id.as_deref()?)
    }

    pub fn refresh(&mut self, ledger: &MatchLedger, group: Group) {
        if self.index(ledger, group).is_none() {
            self.id = Self::listed(ledger, group).first().map(|m| m.id.clone());
        }
    }

    pub fn step(&mut self, ledger: &MatchLedger, group: Group, down: bool) {
        let listed = Self::listed(ledger, group);
        if listed.is_empty() {
            self.id = None;
            return;
        }
        let next = match self.index(ledger, group) {
            Some(i) if down => (i + 1).min(listed.len() - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.id = Some(listed[next].id.clone());
    }
}

// ---------------------------------------------------------------------------
// Status line and store connection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionState {
    pub groups_live: bool,
    pub matches_live: bool,
}

impl ConnectionState {
    pub fn set(&mut self, path: StorePath, live: bool) {
        match path {
            StorePath::Groups => self.groups_live = live,
            StorePath::Matches => self.matches_live = live,
        }
    }

    pub fn is_live(&self) -> bool {
        self.groups_live && self.matches_live
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub group: Group,
    pub team: TeamSelection,
    pub fixture: MatchSelection,
    pub prompt: Option<Prompt>,
    pub status: Option<StatusLine>,
    pub connection: ConnectionState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupstage_core::roster::Confirmed;

    #[test]
    fn team_selection_follows_the_team_not_the_position() {
        let mut table = GroupTable::with_defaults();
        table.add_team(Group::A, TeamId::from("owls"), "Owls").unwrap();
        let mut selection = TeamSelection {
            id: Some(TeamId::from("owls")),
        };
        assert_eq!(selection.index(&table, Group::A), Some(2));

        table.remove_team(Group::A, 0, Confirmed::by_user()).unwrap();
        selection.refresh(&table, Group::A, Some(2));
        assert_eq!(selection.id, Some(TeamId::from("owls")));
        assert_eq!(selection.index(&table, Group::A), Some(1));
    }

    #[test]
    fn removed_team_selection_falls_back_to_a_neighbour() {
        let mut table = GroupTable::with_defaults();
        table.add_team(Group::B, TeamId::from("owls"), "Owls").unwrap();
        let mut selection = TeamSelection {
            id: Some(TeamId::from("owls")),
        };
        table.remove_team(Group::B, 2, Confirmed::by_user()).unwrap();
        selection.refresh(&table, Group::B, Some(2));
        assert_eq!(selection.index(&table, Group::B), Some(1));
    }

    #[test]
    fn stepping_stops_at_the_ends() {
        let table = GroupTable::with_defaults();
        let mut selection = TeamSelection::default();
        selection.step(&table, Group::C, true);
        assert_eq!(selection.index(&table, Group::C), Some(0));
        selection.step(&table, Group::C, true);
        selection.step(&table, Group::C, true);
        assert_eq!(selection.index(&table, Group::C), Some(1));
        selection.step(&table, Group::C, false);
        selection.step(&table, Group::C, false);
        assert_eq!(selection.index(&table, Group::C), Some(0));
    }

    #[test]
    fn fixture_list_puts_upcoming_before_results() {
        let mut ledger = MatchLedger::new();
        ledger.add_match(Group::A, "m1".into(), "Lions", "Tigers", "", "").unwrap();
        ledger.add_match(Group::A, "m2".into(), "Tigers", "Lions", "", "").unwrap();
        ledger.update_score(Group::A, "m1", "1", "0").unwrap();

        let ids: Vec<&str> = MatchSelection::listed(&ledger, Group::A).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);

        let mut selection = MatchSelection::default();
        selection.refresh(&ledger, Group::A);
        assert_eq!(selection.id.as_deref(), Some("m2"));
        selection.step(&ledger, Group::A, true);
        assert_eq!(selection.selected(&ledger, Group::A).map(|m| m.id.as_str()), Some("m1"));
    }
}
