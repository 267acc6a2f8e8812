use crate::error::ScoreboardError;
use crate::{Group, GroupTable, TeamId, TeamRecord};

/// A group never drops below this many teams.
pub const MIN_TEAMS_PER_GROUP: usize = 2;

/// Proof that the user acknowledged a destructive action (remove, delete, reset).
///
/// The front end builds one only after asking.
#[derive(Debug, Clone, Copy)]
pub struct Confirmed(());

impl Confirmed {
    pub fn by_user() -> Self {
        Confirmed(())
    }
}

/// Manual stat entry, used when standings are kept by hand instead of from fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAdjustment {
    Win,
    Draw,
    Loss,
    GoalFor,
    GoalAgainst,
}

impl StatAdjustment {
    pub fn label(self) -> &'static str {
        match self {
            StatAdjustment::Win => "win",
            StatAdjustment::Draw => "draw",
            StatAdjustment::Loss => "loss",
            StatAdjustment::GoalFor => "goal",
            StatAdjustment::GoalAgainst => "goal removed",
        }
    }
}

impl GroupTable {
    pub fn team(&self, group: Group, index: usize) -> Option<&TeamRecord> {
        self.teams(group).get(index)
    }

    pub fn position_of(&self, group: Group, id: &TeamId) -> Option<usize> {
        self.teams(group).iter().position(|t| &t.id == id)
    }

    pub fn add_team(&mut self, group: Group, id: TeamId, name: &str) -> Result<&TeamRecord, ScoreboardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScoreboardError::validation("Type a team name first."));
        }
        let teams = self.teams_mut(group);
        teams.push(TeamRecord::new(id, name));
        Ok(&teams[teams.len() - 1])
    }

    pub fn rename_team(&mut self, group: Group, index: usize, new_name: &str) -> Result<(), ScoreboardError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ScoreboardError::validation("Type a new team name first."));
        }
        let team = self
            .teams_mut(group)
            .get_mut(index)
            .ok_or_else(|| missing_team(group))?;
        team.name = new_name.to_string();
        Ok(())
    }

    /// Checks that the team at `index` may be removed, without removing it.
    pub fn removable(&self, group: Group, index: usize) -> Result<&TeamRecord, ScoreboardError> {
        let teams = self.teams(group);
        let team = teams.get(index).ok_or_else(|| missing_team(group))?;
        if teams.len() <= MIN_TEAMS_PER_GROUP {
            return Err(ScoreboardError::validation(format!(
                "You must have at least {MIN_TEAMS_PER_GROUP} teams in a group."
            )));
        }
        Ok(team)
    }

    /// Removes the team at `index`; later teams shift down one position.
    pub fn remove_team(
        &mut self,
        group: Group,
        index: usize,
        _confirmed: Confirmed,
    ) -> Result<TeamRecord, ScoreboardError> {
        self.removable(group, index)?;
        Ok(self.teams_mut(group).remove(index))
    }

    pub fn adjust(&mut self, group: Group, index: usize, adjustment: StatAdjustment) -> Result<(), ScoreboardError> {
        let team = self
            .teams_mut(group)
            .get_mut(index)
            .ok_or_else(|| missing_team(group))?;
        match adjustment {
            StatAdjustment::Win => {
                team.p = team.p.saturating_add(1);
                team.w = team.w.saturating_add(1);
                team.points = team.points.saturating_add(3);
            }
            StatAdjustment::Draw => {
                team.p = team.p.saturating_add(1);
                team.d = team.d.saturating_add(1);
                team.points = team.points.saturating_add(1);
            }
            StatAdjustment::Loss => {
                team.p = team.p.saturating_add(1);
                team.l = team.l.saturating_add(1);
            }
            StatAdjustment::GoalFor => team.gd = team.gd.saturating_add(1),
            StatAdjustment::GoalAgainst => team.gd = team.gd.saturating_sub(1),
        }
        Ok(())
    }

    pub fn add_win(&mut self, group: Group, index: usize) -> Result<(), ScoreboardError> {
        self.adjust(group, index, StatAdjustment::Win)
    }

    pub fn add_draw(&mut self, group: Group, index: usize) -> Result<(), ScoreboardError> {
        self.adjust(group, index, StatAdjustment::Draw)
    }

    pub fn add_loss(&mut self, group: Group, index: usize) -> Result<(), ScoreboardError> {
        self.adjust(group, index, StatAdjustment::Loss)
    }

    pub fn add_goal(&mut self, group: Group, index: usize) -> Result<(), ScoreboardError> {
        self.adjust(group, index, StatAdjustment::GoalFor)
    }

    pub fn remove_goal(&mut self, group: Group, index: usize) -> Result<(), ScoreboardError> {
        self.adjust(group, index, StatAdjustment::GoalAgainst)
    }

    /// Applies one result straight to two roster entries, bypassing the ledger.
    pub fn record_result(
        &mut self,
        group: Group,
        index_a: usize,
        index_b: usize,
        score_a: u32,
        score_b: u32,
    ) -> Result<(), ScoreboardError> {
        if index_a == index_b {
            return Err(ScoreboardError::validation("A team cannot play itself"));
        }
        let teams = self.teams_mut(group);
        if index_a >= teams.len() || index_b >= teams.len() {
            return Err(missing_team(group));
        }
        teams[index_a].apply_result(score_a, score_b);
        teams[index_b].apply_result(score_b, score_a);
        Ok(())
    }
}

fn missing_team(group: Group) -> ScoreboardError {
    ScoreboardError::not_found(format!("That team is no longer in {}.", group.label()))
}
