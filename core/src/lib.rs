pub mod auth;
pub mod error;
pub mod ledger;
pub mod local;
pub mod normalize;
pub mod push_id;
pub mod roster;
pub mod scoreboard;
pub mod sse;
pub mod standings;
pub mod store;
pub mod undo;
pub mod wire;

pub use error::ScoreboardError;
pub use scoreboard::{Access, Scoreboard, StandingsMode, Write};

use chrono::NaiveDateTime;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Domain types: the in-memory model, independent of the stored JSON shape
// ---------------------------------------------------------------------------

/// One of the four fixed round-robin groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    #[default]
    A,
    B,
    C,
    D,
}

impl Group {
    pub const ALL: [Group; 4] = [Group::A, Group::B, Group::C, Group::D];

    /// Key used for this group in stored JSON and store paths.
    pub fn key(self) -> &'static str {
        match self {
            Group::A => "A",
            Group::B => "B",
            Group::C => "C",
            Group::D => "D",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Group::ALL.into_iter().find(|g| g.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Group::A => "Group A",
            Group::B => "Group B",
            Group::C => "Group C",
            Group::D => "Group D",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Self {
        Group::ALL[(self.index() + 1) % Group::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Group::ALL[(self.index() + Group::ALL.len() - 1) % Group::ALL.len()]
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Stable identity of a team, independent of its position in the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for TeamId {
    fn from(value: String) -> Self {
        TeamId(value)
    }
}

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        TeamId(value.to_string())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    pub p: u32,
    pub w: u32,
    pub d: u32,
    pub l: u32,
    pub points: u32,
    pub gd: i32,
}

impl TeamRecord {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn reset_stats(&mut self) {
        self.p = 0;
        self.w = 0;
        self.d = 0;
        self.l = 0;
        self.points = 0;
        self.gd = 0;
    }

    /// Folds one finished match into this team's line: 3 points a win, 1 a draw.
    pub(crate) fn apply_result(&mut self, scored: u32, conceded: u32) {
        let margin = (i64::from(scored) - i64::from(conceded)).clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        self.p = self.p.saturating_add(1);
        self.gd = self.gd.saturating_add(margin as i32);
        if scored > conceded {
            self.w = self.w.saturating_add(1);
            self.points = self.points.saturating_add(3);
        } else if scored < conceded {
            self.l = self.l.saturating_add(1);
        } else {
            self.d = self.d.saturating_add(1);
            self.points = self.points.saturating_add(1);
        }
    }
}

/// All four groups with their rosters in stored (insertion) order.
///
/// Serializes as `{"A": [...], "B": [...], "C": [...], "D": [...]}`. Deserializing
/// goes through the normalizer, so any JSON value decodes to a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    groups: [Vec<TeamRecord>; 4],
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed table used on first start and after a reset.
    pub fn with_defaults() -> Self {
        let seed = [
            (Group::A, ["Lions", "Tigers"]),
            (Group::B, ["Eagles", "Sharks"]),
            (Group::C, ["Bears", "Spiders"]),
            (Group::D, ["Monkeys", "Fishes"]),
        ];
        let mut table = Self::new();
        for (group, names) in seed {
            *table.teams_mut(group) = names
                .iter()
                .enumerate()
                .map(|(index, name)| TeamRecord::new(normalize::fallback_team_id(group, index), *name))
                .collect();
        }
        table
    }

    pub fn teams(&self, group: Group) -> &[TeamRecord] {
        &self.groups[group.index()]
    }

    pub fn teams_mut(&mut self, group: Group) -> &mut Vec<TeamRecord> {
        &mut self.groups[group.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Group, &[TeamRecord])> + '_ {
        Group::ALL.into_iter().map(|g| (g, self.teams(g)))
    }

    pub fn team_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for GroupTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Group::ALL.len()))?;
        for (group, teams) in self.iter() {
            map.serialize_entry(group.key(), teams)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GroupTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(normalize::normalize_groups(&raw))
    }
}

/// A fixture within one group. A match is a result once both scores are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Child key under the group's ledger node; not part of the stored body.
    #[serde(skip)]
    pub id: String,
    pub team_a: String,
    pub team_b: String,
    /// ISO-8601 kick-off as entered, or empty.
    pub time: String,
    pub pitch: String,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
}

impl MatchRecord {
    pub fn is_result(&self) -> bool {
        self.score_a.is_some() && self.score_b.is_some()
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        self.score_a.zip(self.score_b)
    }

    pub fn kickoff(&self) -> Option<NaiveDateTime> {
        ledger::parse_kickoff(&self.time)
    }
}

/// Per-group fixtures keyed by match id. Mirror of the store's `matches` node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchLedger {
    groups: [BTreeMap<String, MatchRecord>; 4],
}

impl Serialize for MatchLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Group::ALL.len()))?;
        for group in Group::ALL {
            map.serialize_entry(group.key(), self.matches(group))?;
        }
        map.end()
    }
}

/// Top/bottom marker for teams tied on the highest or lowest points in a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Band {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// One ranked line of a group table, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: TeamId,
    pub name: String,
    pub p: u32,
    pub w: u32,
    pub d: u32,
    pub l: u32,
    pub points: u32,
    pub gd: i32,
    pub band: Band,
}
