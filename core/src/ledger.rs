use crate::error::ScoreboardError;
use crate::{Group, MatchLedger, MatchRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Accepted kick-off layouts, tried after RFC 3339.
const KICKOFF_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches(&self, group: Group) -> &BTreeMap<String, MatchRecord> {
        &self.groups[group.index()]
    }

    pub(crate) fn matches_mut(&mut self, group: Group) -> &mut BTreeMap<String, MatchRecord> {
        &mut self.groups[group.index()]
    }

    pub fn get(&self, group: Group, id: &str) -> Option<&MatchRecord> {
        self.matches(group).get(id)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a new fixture with no score under a freshly generated `id`.
    pub fn add_match(
        &mut self,
        group: Group,
        id: String,
        team_a: &str,
        team_b: &str,
        time: &str,
        pitch: &str,
    ) -> Result<&MatchRecord, ScoreboardError> {
        let team_a = team_a.trim();
        let team_b = team_b.trim();
        if team_a.is_empty() || team_b.is_empty() {
            return Err(ScoreboardError::validation("Pick both teams first."));
        }
        if team_a == team_b {
            return Err(ScoreboardError::validation("A team cannot play itself"));
        }
        let time = time.trim();
        if !time.is_empty() && parse_kickoff(time).is_none() {
            return Err(ScoreboardError::validation(
                "Kick-off time must look like 2026-06-14T15:00",
            ));
        }

        let record = MatchRecord {
            id: id.clone(),
            team_a: team_a.to_string(),
            team_b: team_b.to_string(),
            time: time.to_string(),
            pitch: pitch.trim().to_string(),
            score_a: None,
            score_b: None,
        };
        let slot = self.matches_mut(group);
        slot.insert(id.clone(), record);
        Ok(&slot[&id])
    }

    /// Sets both scores of a fixture, or neither.
    pub fn update_score(
        &mut self,
        group: Group,
        id: &str,
        score_a: &str,
        score_b: &str,
    ) -> Result<(u32, u32), ScoreboardError> {
        let score_a = parse_score(score_a)?;
        let score_b = parse_score(score_b)?;
        let record = self
            .matches_mut(group)
            .get_mut(id)
            .ok_or_else(|| ScoreboardError::not_found("That match no longer exists."))?;
        record.score_a = Some(score_a);
        record.score_b = Some(score_b);
        Ok((score_a, score_b))
    }

    /// Removes a fixture. Deleting an unknown id is a no-op and returns `None`.
    pub fn delete_match(&mut self, group: Group, id: &str) -> Option<MatchRecord> {
        self.matches_mut(group).remove(id)
    }

    /// Fixtures still to be played, earliest kick-off first.
    pub fn upcoming(&self, group: Group) -> Vec<&MatchRecord> {
        self.sorted(group, |m| !m.is_result())
    }

    /// Finished fixtures, earliest kick-off first.
    pub fn results(&self, group: Group) -> Vec<&MatchRecord> {
        self.sorted(group, MatchRecord::is_result)
    }

    fn sorted(&self, group: Group, keep: impl Fn(&MatchRecord) -> bool) -> Vec<&MatchRecord> {
        let mut out: Vec<&MatchRecord> = self.matches(group).values().filter(|&m| keep(m)).collect();
        out.sort_by(|a, b| by_kickoff(a, b));
        out
    }
}

/// Untimed fixtures sort after timed ones; ties fall back to the id, which is
/// time-ordered for generated ids.
fn by_kickoff(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    match (a.kickoff(), b.kickoff()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

pub fn parse_score(raw: &str) -> Result<u32, ScoreboardError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ScoreboardError::validation("Enter both scores"))
}

pub fn parse_kickoff(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    KICKOFF_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_fixtures() -> MatchLedger {
        let mut ledger = MatchLedger::new();
        ledger
            .add_match(Group::A, "m3".into(), "Lions", "Tigers", "", "")
            .unwrap();
        ledger
            .add_match(Group::A, "m2".into(), "Tigers", "Owls", "2026-06-15T10:00", "South")
            .unwrap();
        ledger
            .add_match(Group::A, "m1".into(), "Owls", "Lions", "2026-06-14T18:30", "North")
            .unwrap();
        ledger
    }

    #[test]
    fn add_match_stores_fixture_without_score() {
        let ledger = ledger_with_fixtures();
        let m = ledger.get(Group::A, "m2").unwrap();
        assert_eq!(m.team_a, "Tigers");
        assert_eq!(m.pitch, "South");
        assert!(!m.is_result());
        assert!(ledger.matches(Group::B).is_empty());
    }

    #[test]
    fn add_match_rejects_self_match_and_leaves_ledger_unchanged() {
        let mut ledger = ledger_with_fixtures();
        let before = ledger.clone();
        let err = ledger
            .add_match(Group::A, "m9".into(), "Lions", " Lions ", "", "")
            .unwrap_err();
        assert!(matches!(err, ScoreboardError::Validation(_)));
        assert_eq!(ledger, before);
    }

    #[test]
    fn add_match_rejects_missing_team_or_bad_time() {
        let mut ledger = MatchLedger::new();
        assert!(ledger.add_match(Group::B, "x".into(), "", "Sharks", "", "").is_err());
        assert!(
            ledger
                .add_match(Group::B, "x".into(), "Eagles", "Sharks", "next tuesday", "")
                .is_err()
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn update_score_sets_both_or_neither() {
        let mut ledger = ledger_with_fixtures();
        assert!(ledger.update_score(Group::A, "m1", "3", "abc").is_err());
        assert!(ledger.update_score(Group::A, "m1", "-1", "0").is_err());
        assert!(!ledger.get(Group::A, "m1").unwrap().is_result());

        assert_eq!(ledger.update_score(Group::A, "m1", " 3", "1 ").unwrap(), (3, 1));
        assert_eq!(ledger.get(Group::A, "m1").unwrap().score(), Some((3, 1)));
    }

    #[test]
    fn update_score_on_unknown_match_is_not_found() {
        let mut ledger = ledger_with_fixtures();
        let err = ledger.update_score(Group::A, "nope", "1", "1").unwrap_err();
        assert!(matches!(err, ScoreboardError::NotFound(_)));
    }

    #[test]
    fn delete_of_absent_match_is_a_no_op() {
        let mut ledger = ledger_with_fixtures();
        let before = ledger.clone();
        assert!(ledger.delete_match(Group::A, "nope").is_none());
        assert_eq!(ledger, before);
        assert!(ledger.delete_match(Group::A, "m3").is_some());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn upcoming_and_results_are_split_and_ordered_by_time() {
        let mut ledger = ledger_with_fixtures();
        ledger.update_score(Group::A, "m2", "0", "0").unwrap();

        let upcoming: Vec<&str> = ledger.upcoming(Group::A).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(upcoming, vec!["m1", "m3"]);

        let results: Vec<&str> = ledger.results(Group::A).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(results, vec!["m2"]);
    }

    #[test]
    fn kickoff_accepts_common_iso_layouts() {
        assert!(parse_kickoff("2026-06-14T15:00").is_some());
        assert!(parse_kickoff("2026-06-14T15:00:30").is_some());
        assert!(parse_kickoff("2026-06-14T15:00:00Z").is_some());
        assert!(parse_kickoff("2026-06-14 15:00").is_some());
        assert!(parse_kickoff("2026-06-14").is_some());
        assert!(parse_kickoff("").is_none());
        assert!(parse_kickoff("soon").is_none());
    }
}
