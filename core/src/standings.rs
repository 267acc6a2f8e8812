//! Standings: rebuilds every team's line from the finished fixtures, then ranks.

use crate::{Band, DisplayRow, Group, GroupTable, MatchLedger, TeamRecord};
use log::debug;

/// What one recalculation pass did with the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recalculation {
    pub applied: usize,
    /// Results naming a team that is not in the group (renamed or removed).
    pub skipped: usize,
}

/// Returns a copy of `table` with every team's stats rebuilt from `ledger`.
pub fn recalculate(table: &GroupTable, ledger: &MatchLedger) -> GroupTable {
    let mut out = table.clone();
    recalculate_in_place(&mut out, ledger);
    out
}

/// Resets every team to zero and folds in each finished match of its group.
///
/// Teams are joined to matches by exact name; the first roster entry with the
/// name wins. The outcome depends only on the set of results, not their order.
pub fn recalculate_in_place(table: &mut GroupTable, ledger: &MatchLedger) -> Recalculation {
    let mut summary = Recalculation::default();
    for group in Group::ALL {
        let teams = table.teams_mut(group);
        teams.iter_mut().for_each(TeamRecord::reset_stats);

        for m in ledger.matches(group).values() {
            let Some((score_a, score_b)) = m.score() else {
                continue;
            };
            let (Some(a), Some(b)) = (position_by_name(teams, &m.team_a), position_by_name(teams, &m.team_b))
            else {
                debug!(
                    "skipping result {} in group {group}: {} v {} not both on the roster",
                    m.id, m.team_a, m.team_b
                );
                summary.skipped += 1;
                continue;
            };
            teams[a].apply_result(score_a, score_b);
            teams[b].apply_result(score_b, score_a);
            summary.applied += 1;
        }
    }
    summary
}

fn position_by_name(teams: &[TeamRecord], name: &str) -> Option<usize> {
    teams.iter().position(|t| t.name == name)
}

/// Display order: points, then goal difference, both descending. Equal teams keep
/// their stored order.
pub fn rank(teams: &[TeamRecord]) -> Vec<&TeamRecord> {
    let mut ranked: Vec<&TeamRecord> = teams.iter().collect();
    ranked.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| b.gd.cmp(&a.gd)));
    ranked
}

pub fn display_rows(teams: &[TeamRecord]) -> Vec<DisplayRow> {
    let ranked = rank(teams);
    let (Some(first), Some(last)) = (ranked.first(), ranked.last()) else {
        return Vec::new();
    };
    let (top, bottom) = (first.points, last.points);

    ranked
        .iter()
        .map(|t| DisplayRow {
            id: t.id.clone(),
            name: t.name.clone(),
            p: t.p,
            w: t.w,
            d: t.d,
            l: t.l,
            points: t.points,
            gd: t.gd,
            band: band_for(t.points, top, bottom),
        })
        .collect()
}

fn band_for(points: u32, top: u32, bottom: u32) -> Band {
    if points == top {
        Band::Top
    } else if points == bottom {
        Band::Bottom
    } else {
        Band::Middle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchRecord, TeamId};

    fn team(name: &str) -> TeamRecord {
        TeamRecord::new(TeamId::from(name), name)
    }

    fn table_with(group: Group, names: &[&str]) -> GroupTable {
        let mut table = GroupTable::new();
        *table.teams_mut(group) = names.iter().map(|n| team(n)).collect();
        table
    }

    fn result(id: &str, a: &str, b: &str, score: Option<(u32, u32)>) -> MatchRecord {
        MatchRecord {
            id: id.to_string(),
            team_a: a.to_string(),
            team_b: b.to_string(),
            score_a: score.map(|s| s.0),
            score_b: score.map(|s| s.1),
            ..Default::default()
        }
    }

    fn ledger_of(group: Group, matches: Vec<MatchRecord>) -> MatchLedger {
        let mut ledger = MatchLedger::new();
        for m in matches {
            ledger.matches_mut(group).insert(m.id.clone(), m);
        }
        ledger
    }

    fn line(t: &TeamRecord) -> (u32, u32, u32, u32, u32, i32) {
        (t.p, t.w, t.d, t.l, t.points, t.gd)
    }

    #[test]
    fn win_gives_three_points_and_goal_difference() {
        let table = table_with(Group::A, &["Lions", "Tigers"]);
        let ledger = ledger_of(Group::A, vec![result("m1", "Lions", "Tigers", Some((3, 1)))]);

        let out = recalculate(&table, &ledger);
        let teams = out.teams(Group::A);
        assert_eq!(line(&teams[0]), (1, 1, 0, 0, 3, 2));
        assert_eq!(line(&teams[1]), (1, 0, 0, 1, 0, -2));
    }

    #[test]
    fn draw_gives_one_point_each() {
        let table = table_with(Group::A, &["Lions", "Tigers"]);
        let ledger = ledger_of(Group::A, vec![result("m1", "Lions", "Tigers", Some((2, 2)))]);

        let out = recalculate(&table, &ledger);
        for t in out.teams(Group::A) {
            assert_eq!(line(t), (1, 0, 1, 0, 1, 0));
        }
    }

    #[test]
    fn upcoming_fixtures_and_unknown_teams_are_ignored() {
        let mut table = table_with(Group::B, &["Eagles", "Sharks"]);
        let ledger = ledger_of(
            Group::B,
            vec![
                result("m1", "Eagles", "Sharks", None),
                result("m2", "Eagles", "Old Name", Some((5, 0))),
                result("m3", "Sharks", "Eagles", Some((1, 0))),
            ],
        );

        let summary = recalculate_in_place(&mut table, &ledger);
        assert_eq!(summary, Recalculation { applied: 1, skipped: 1 });
        let teams = table.teams(Group::B);
        assert_eq!(line(&teams[0]), (1, 0, 0, 1, 0, -1));
        assert_eq!(line(&teams[1]), (1, 1, 0, 0, 3, 1));
    }

    #[test]
    fn stale_stats_are_wiped_before_folding() {
        let mut table = table_with(Group::C, &["Bears", "Spiders"]);
        table.teams_mut(Group::C)[0].w = 9;
        table.teams_mut(Group::C)[0].points = 27;

        let out = recalculate(&table, &MatchLedger::new());
        assert!(out.teams(Group::C).iter().all(|t| line(t) == (0, 0, 0, 0, 0, 0)));
    }

    #[test]
    fn recalculation_is_idempotent() {
        let table = table_with(Group::A, &["Lions", "Tigers", "Owls"]);
        let ledger = ledger_of(
            Group::A,
            vec![
                result("m1", "Lions", "Tigers", Some((3, 1))),
                result("m2", "Owls", "Lions", Some((0, 0))),
            ],
        );
        let once = recalculate(&table, &ledger);
        assert_eq!(recalculate(&once, &ledger), once);
    }

    #[test]
    fn processing_order_does_not_matter() {
        let table = table_with(Group::D, &["Monkeys", "Fishes", "Owls", "Bats"]);
        let fixtures = [
            ("Monkeys", "Fishes", (2, 1)),
            ("Owls", "Bats", (0, 0)),
            ("Fishes", "Owls", (4, 4)),
            ("Bats", "Monkeys", (3, 0)),
        ];
        let orders: [[usize; 4]; 5] = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [1, 3, 0, 2],
            [2, 0, 3, 1],
            [3, 0, 2, 1],
        ];

        let mut outcomes = Vec::new();
        for order in orders {
            // Ledger iteration follows ids, so the id sequence sets processing order.
            let matches = order
                .iter()
                .enumerate()
                .map(|(pos, &i)| {
                    let (a, b, s) = fixtures[i];
                    result(&format!("m{pos}"), a, b, Some(s))
                })
                .collect();
            outcomes.push(recalculate(&table, &ledger_of(Group::D, matches)));
        }
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn recalculated_lines_are_consistent() {
        let table = table_with(Group::A, &["Lions", "Tigers", "Owls"]);
        let ledger = ledger_of(
            Group::A,
            vec![
                result("m1", "Lions", "Tigers", Some((3, 1))),
                result("m2", "Tigers", "Owls", Some((2, 2))),
                result("m3", "Owls", "Lions", Some((1, 0))),
                result("m4", "Lions", "Tigers", Some((0, 0))),
            ],
        );
        let out = recalculate(&table, &ledger);
        for t in out.teams(Group::A) {
            assert_eq!(t.p, t.w + t.d + t.l, "{}", t.name);
            assert_eq!(t.points, 3 * t.w + t.d, "{}", t.name);
        }
        let total_gd: i32 = out.teams(Group::A).iter().map(|t| t.gd).sum();
        assert_eq!(total_gd, 0);
    }

    #[test]
    fn rank_orders_by_points_then_goal_difference_and_is_stable() {
        let mut teams = vec![team("a"), team("b"), team("c"), team("d")];
        teams[0].points = 3;
        teams[1].points = 6;
        teams[2].points = 3;
        teams[2].gd = 2;
        teams[3].points = 3;

        let order: Vec<&str> = rank(&teams).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn bands_mark_everyone_tied_at_the_extremes() {
        let mut teams = vec![team("a"), team("b"), team("c"), team("d")];
        teams[0].points = 4;
        teams[1].points = 4;
        teams[2].points = 2;
        teams[3].points = 1;

        let bands: Vec<Band> = display_rows(&teams).iter().map(|r| r.band).collect();
        assert_eq!(bands, vec![Band::Top, Band::Top, Band::Middle, Band::Bottom]);
    }

    #[test]
    fn level_group_is_all_top_band() {
        let teams = vec![team("a"), team("b")];
        assert!(display_rows(&teams).iter().all(|r| r.band == Band::Top));
        assert!(display_rows(&[]).is_empty());
    }
}
