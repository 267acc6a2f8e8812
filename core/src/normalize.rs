//! Decoding of externally sourced values into the canonical table shapes.
//!
//! The realtime store hands lists back in two encodings: a dense JSON array, or an
//! object keyed by `"0"`, `"1"`, ... once an entry has been deleted out of the
//! middle (`{"0": .., "2": ..}`). Anything else counts as an empty list. Nothing in
//! this module fails; malformed entries are dropped and logged.

use crate::{Group, GroupTable, MatchLedger, MatchRecord, TeamId, TeamRecord};
use log::warn;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Shape of a list-like node as it arrives from the store.
enum RawList<'a> {
    Dense(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Missing,
}

impl<'a> RawList<'a> {
    fn classify(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Array(items)) => RawList::Dense(items),
            Some(Value::Object(map)) => RawList::Keyed(map),
            _ => RawList::Missing,
        }
    }

    /// Entries in list order. Keyed entries follow their numeric key ("10" after
    /// "2"); keys that are not numbers go last, in text order.
    fn entries(self) -> Vec<(String, &'a Value)> {
        match self {
            RawList::Dense(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            RawList::Keyed(map) => {
                let mut keyed: Vec<(Option<u64>, &String, &Value)> = map
                    .iter()
                    .map(|(k, v)| (k.trim().parse::<u64>().ok(), k, v))
                    .collect();
                keyed.sort_by(|a, b| match (a.0, b.0) {
                    (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(b.1)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => a.1.cmp(b.1),
                });
                keyed.into_iter().map(|(_, k, v)| (k.clone(), v)).collect()
            }
            RawList::Missing => Vec::new(),
        }
    }
}

/// Builds a full group table from whatever the store or the local cache returned.
///
/// Always yields all four groups. Idempotent: normalizing the serialized output
/// again gives the same table.
pub fn normalize_groups(raw: &Value) -> GroupTable {
    let mut table = GroupTable::new();
    for group in Group::ALL {
        let entries = RawList::classify(raw.get(group.key())).entries();
        let total = entries.len();
        let mut teams: Vec<TeamRecord> = entries.into_iter().filter_map(|(_, v)| decode_team(v)).collect();
        if teams.len() < total {
            warn!(
                "dropped {} malformed team entries in group {group}",
                total - teams.len()
            );
        }
        assign_missing_ids(group, &mut teams);
        *table.teams_mut(group) = teams;
    }
    table
}

/// Builds the match ledger mirror from the store's `matches` node.
pub fn normalize_matches(raw: &Value) -> MatchLedger {
    let mut ledger = MatchLedger::new();
    for group in Group::ALL {
        let entries = RawList::classify(raw.get(group.key())).entries();
        let total = entries.len();
        let matches: BTreeMap<String, MatchRecord> = entries
            .into_iter()
            .filter_map(|(id, v)| decode_match(&id, v).map(|m| (id, m)))
            .collect();
        if matches.len() < total {
            warn!(
                "dropped {} malformed match entries in group {group}",
                total - matches.len()
            );
        }
        *ledger.matches_mut(group) = matches;
    }
    ledger
}

/// Id given to a team record that arrived without one.
pub fn fallback_team_id(group: Group, index: usize) -> TeamId {
    TeamId(format!("{}{}", group.key(), index))
}

fn assign_missing_ids(group: Group, teams: &mut [TeamRecord]) {
    let mut seen: HashSet<TeamId> = HashSet::new();
    for (index, team) in teams.iter_mut().enumerate() {
        if team.id.is_empty() || seen.contains(&team.id) {
            let base = fallback_team_id(group, index);
            let mut candidate = base.clone();
            let mut n = 1;
            while seen.contains(&candidate) {
                candidate = TeamId(format!("{base}-{n}"));
                n += 1;
            }
            team.id = candidate;
        }
        seen.insert(team.id.clone());
    }
}

fn decode_team(value: &Value) -> Option<TeamRecord> {
    let obj = value.as_object()?;
    Some(TeamRecord {
        id: obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .into(),
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        p: count(obj, "p"),
        w: count(obj, "w"),
        d: count(obj, "d"),
        l: count(obj, "l"),
        points: count(obj, "points"),
        gd: signed(obj, "gd"),
    })
}

fn decode_match(id: &str, value: &Value) -> Option<MatchRecord> {
    let obj = value.as_object()?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(MatchRecord {
        id: id.to_string(),
        team_a: text("teamA"),
        team_b: text("teamB"),
        time: text("time"),
        pitch: text("pitch"),
        score_a: score(obj.get("scoreA")),
        score_b: score(obj.get("scoreB")),
    })
}

fn number(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn count(obj: &Map<String, Value>, key: &str) -> u32 {
    number(obj.get(key))
        .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

fn signed(obj: &Map<String, Value>, key: &str) -> i32 {
    number(obj.get(key))
        .map(|n| n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        .unwrap_or(0)
}

fn score(value: Option<&Value>) -> Option<u32> {
    let n = number(value)?;
    let score = u32::try_from(n).ok();
    if score.is_none() {
        warn!("dropping out-of-range score {n}");
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(table: &GroupTable, group: Group) -> Vec<&str> {
        table.teams(group).iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn dense_lists_are_kept_in_order() {
        let raw = json!({
            "A": [{"name": "Lions", "p": 1, "w": 1, "points": 3, "gd": 2}, {"name": "Tigers"}],
        });
        let table = normalize_groups(&raw);
        assert_eq!(names(&table, Group::A), vec!["Lions", "Tigers"]);
        let lions = &table.teams(Group::A)[0];
        assert_eq!((lions.p, lions.w, lions.points, lions.gd), (1, 1, 3, 2));
    }

    #[test]
    fn sparse_keys_sort_numerically_and_ignore_gaps() {
        let raw = json!({
            "A": {"0": {"name": "first"}, "2": {"name": "third"}},
            "B": {"10": {"name": "ten"}, "2": {"name": "two"}, "1": {"name": "one"}},
        });
        let table = normalize_groups(&raw);
        assert_eq!(names(&table, Group::A), vec!["first", "third"]);
        assert_eq!(names(&table, Group::B), vec!["one", "two", "ten"]);
    }

    #[test]
    fn any_shape_yields_four_lists() {
        for raw in [
            Value::Null,
            json!(42),
            json!("groups"),
            json!([1, 2, 3]),
            json!({"A": null, "B": 7, "C": "x", "E": [{"name": "stray"}]}),
        ] {
            let table = normalize_groups(&raw);
            for group in Group::ALL {
                assert!(table.teams(group).is_empty(), "{raw} group {group}");
            }
        }
    }

    #[test]
    fn non_object_entries_are_dropped() {
        let raw = json!({"C": [null, {"name": "Bears"}, 5, "Spiders"]});
        let table = normalize_groups(&raw);
        assert_eq!(names(&table, Group::C), vec!["Bears"]);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let raw = json!({
            "A": {"0": {"name": "Lions", "gd": -3}, "3": {"name": "Tigers", "id": "t1"}},
            "B": [{"name": "Eagles", "id": "dup"}, {"name": "Sharks", "id": "dup"}],
            "D": {"x": {"name": "odd key"}, "1": {"name": "Monkeys", "points": "4"}},
        });
        let once = normalize_groups(&raw);
        let twice = normalize_groups(&once.to_value());
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_and_duplicate_ids_are_filled_deterministically() {
        let raw = json!({"B": [{"name": "Eagles", "id": "dup"}, {"name": "Sharks", "id": "dup"}, {"name": "Owls"}]});
        let table = normalize_groups(&raw);
        let ids: Vec<&str> = table.teams(Group::B).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "B1", "B2"]);
    }

    #[test]
    fn negative_counters_clamp_to_zero_but_goal_difference_keeps_sign() {
        let raw = json!({"A": [{"name": "Lions", "p": -2, "gd": -4}]});
        let table = normalize_groups(&raw);
        let lions = &table.teams(Group::A)[0];
        assert_eq!(lions.p, 0);
        assert_eq!(lions.gd, -4);
    }

    #[test]
    fn matches_decode_with_optional_scores() {
        let raw = json!({
            "A": {
                "-Nabc": {"teamA": "Lions", "teamB": "Tigers", "time": "2026-06-14T15:00", "pitch": "North", "scoreA": 3, "scoreB": 1},
                "-Nabd": {"teamA": "Tigers", "teamB": "Lions", "scoreA": null},
                "-Nabe": {"teamA": "Lions", "teamB": "Tigers", "scoreA": "2", "scoreB": "2"},
                "-Nbad": "not a match",
            },
            "B": null,
        });
        let ledger = normalize_matches(&raw);
        let a = ledger.matches(Group::A);
        assert_eq!(a.len(), 3);
        assert_eq!(a["-Nabc"].score(), Some((3, 1)));
        assert_eq!(a["-Nabc"].pitch, "North");
        assert!(!a["-Nabd"].is_result());
        assert_eq!(a["-Nabe"].score(), Some((2, 2)));
        assert!(ledger.matches(Group::B).is_empty());
    }

    #[test]
    fn large_scores_keep_the_match_a_result() {
        let raw = json!({"B": {"m1": {"teamA": "Eagles", "teamB": "Sharks", "scoreA": 70000, "scoreB": 0}}});
        let ledger = normalize_matches(&raw);
        let m = ledger.get(Group::B, "m1").unwrap();
        assert!(m.is_result());
        assert_eq!(m.score(), Some((70000, 0)));

        let raw = json!({"B": {"m1": {"teamA": "Eagles", "teamB": "Sharks", "scoreA": -1, "scoreB": 0}}});
        assert!(!normalize_matches(&raw).get(Group::B, "m1").unwrap().is_result());
    }

    #[test]
    fn match_ledger_normalization_is_idempotent() {
        let raw = json!({"C": {"m1": {"teamA": "Bears", "teamB": "Spiders", "scoreA": 0, "scoreB": 4}}});
        let once = normalize_matches(&raw);
        let twice = normalize_matches(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
