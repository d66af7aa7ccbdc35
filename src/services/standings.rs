use std::cmp::Ordering;

use crate::models::{LeagueOutcome, LeagueStatus, MatchResult, PlayerStanding};

const POINTS_FOR_WIN: i32 = 3;
const POINTS_FOR_DRAW: i32 = 1;

/// Points earned by the side whose value is `ours`: 3 for more, 1 for equal, 0 for less.
fn result_points<T: PartialOrd>(ours: T, theirs: T) -> i32 {
    match ours.partial_cmp(&theirs) {
        Some(Ordering::Greater) => POINTS_FOR_WIN,
        Some(Ordering::Equal) => POINTS_FOR_DRAW,
        _ => 0,
    }
}

/// Fold a league's games into a two-row table.
///
/// `player_a` and `player_b` are `(id, name)` pairs. Rows are sorted by
/// points, then goal difference, then goals scored, all descending. A full
/// tie keeps player A above player B.
pub fn compute_standings<'a>(
    games: impl IntoIterator<Item = &'a MatchResult>,
    player_a: (&str, &str),
    player_b: (&str, &str),
) -> [PlayerStanding; 2] {
    let mut table = [
        PlayerStanding::new(player_a.0, player_a.1),
        PlayerStanding::new(player_b.0, player_b.1),
    ];

    let slot = |id: &str| -> Option<usize> {
        if id == player_a.0 {
            Some(0)
        } else if id == player_b.0 {
            Some(1)
        } else {
            None
        }
    };

    for game in games {
        let (home, away) = match (slot(game.home_player_id.as_str()), slot(game.away_player_id.as_str())) {
            (Some(home), Some(away)) if home != away => (home, away),
            _ => {
                tracing::warn!(
                    "Skipping game {} vs {}: players are not this league's pair",
                    game.home_player_id,
                    game.away_player_id
                );
                continue;
            }
        };

        record_side(&mut table[home], game.home_score, game.away_score, game.home_xg, game.away_xg);
        record_side(&mut table[away], game.away_score, game.home_score, game.away_xg, game.home_xg);
    }

    for standing in table.iter_mut() {
        standing.goal_difference = standing.goals_for - standing.goals_against;
    }

    // sort_by is stable, so a full tie leaves player A first
    table.sort_by(table_order);

    table
}

/// League table ordering: points, goal difference, goals scored, all descending.
pub fn table_order(a: &PlayerStanding, b: &PlayerStanding) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(b.goal_difference.cmp(&a.goal_difference))
        .then(b.goals_for.cmp(&a.goals_for))
}

fn record_side(standing: &mut PlayerStanding, scored: i32, conceded: i32, xg_for: f64, xg_against: f64) {
    standing.played += 1;
    standing.goals_for += scored;
    standing.goals_against += conceded;

    match scored.cmp(&conceded) {
        Ordering::Greater => standing.wins += 1,
        Ordering::Equal => standing.draws += 1,
        Ordering::Less => standing.losses += 1,
    }
    standing.points += result_points(scored, conceded);

    // Expected points ignore the actual score entirely
    standing.expected_points += result_points(xg_for, xg_against);
}

/// Status and champion a league should have after `games`.
///
/// Evaluated from scratch on every call, so an edit or delete that undoes a
/// clinch takes the league back to active. Callers must reject
/// `total_games <= 0` before calling.
pub fn recompute_league_state<'a>(
    games: impl IntoIterator<Item = &'a MatchResult>,
    player_a_id: &str,
    player_b_id: &str,
    total_games: i32,
) -> LeagueOutcome {
    let games: Vec<&MatchResult> = games.into_iter().collect();
    let games_played = games.len() as i64;
    let remaining = total_games as i64 - games_played;

    let table = compute_standings(games, (player_a_id, ""), (player_b_id, ""));
    let points_of = |id: &str| {
        table
            .iter()
            .find(|s| s.player_id == id)
            .map(|s| s.points as i64)
            .unwrap_or(0)
    };
    let points_a = points_of(player_a_id);
    let points_b = points_of(player_b_id);

    let mut outcome = LeagueOutcome {
        status: LeagueStatus::Active,
        champion_id: None,
    };

    if remaining > 0 {
        let leading = points_a.max(points_b);
        let trailing = points_a.min(points_b);
        let max_possible = remaining * POINTS_FOR_WIN as i64;

        // Only clinched when the trailer cannot even draw level
        if trailing + max_possible < leading {
            let champion = if points_a > points_b { player_a_id } else { player_b_id };
            outcome = LeagueOutcome {
                status: LeagueStatus::Finished,
                champion_id: Some(champion.to_string()),
            };
        }
    }

    if games_played > 0 && games_played >= total_games as i64 {
        let champion_id = match points_a.cmp(&points_b) {
            Ordering::Greater => Some(player_a_id.to_string()),
            Ordering::Less => Some(player_b_id.to_string()),
            Ordering::Equal => None,
        };
        outcome = LeagueOutcome {
            status: LeagueStatus::Finished,
            champion_id,
        };
    }

    outcome
}
