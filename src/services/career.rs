use std::cmp::Ordering;

use crate::models::{CareerStats, Game, Player};
use crate::services::PrizeMoneyCalculator;

/// Career totals for one player across every game they have played.
///
/// `career_bonus` is the stats-page figure: +2 per win, +1 per goal,
/// +1 per hat trick, +2 per outside-box goal, +1 per header, -1 per missed
/// penalty and red card, with the jackpot multiplier applied per game. It
/// is a display number and is not the prize money balance.
pub fn career_stats(calculator: &PrizeMoneyCalculator, player_id: &str, games: &[Game]) -> CareerStats {
    let mut career = CareerStats {
        player_id: player_id.to_string(),
        ..Default::default()
    };

    for game in games {
        let result = &game.result;
        let (stats, team, scored, conceded) = if result.home_player_id == player_id {
            (&result.home_stats, &result.home_team, result.home_score, result.away_score)
        } else if result.away_player_id == player_id {
            (&result.away_stats, &result.away_team, result.away_score, result.home_score)
        } else {
            continue;
        };

        career.games_played += 1;
        let is_win = scored > conceded;
        if is_win {
            career.wins += 1;
            career.win_bonus += 2;
        }

        career.goals += stats.goals;
        career.hat_tricks += stats.hat_tricks;
        career.outside_box_goals += stats.outside_box_goals;
        career.header_goals += stats.header_goals;
        career.penalties_missed += stats.penalties_missed;
        career.red_cards += stats.red_cards;

        let mut bonus = if is_win { 2i64 } else { 0 };
        bonus += stats.goals as i64;
        bonus += stats.hat_tricks as i64;
        bonus += 2 * stats.outside_box_goals as i64;
        bonus += stats.header_goals as i64;
        bonus -= stats.penalties_missed as i64;
        bonus -= stats.red_cards as i64;
        career.career_bonus += calculator.apply_jackpot(bonus, team);
    }

    career
}

/// Headline for the prize money race between two players, e.g. "£12 Alice".
pub fn prize_money_leader(a: &Player, b: &Player) -> String {
    match a.prize_money.cmp(&b.prize_money) {
        Ordering::Equal => format!("£{} Tied", a.prize_money.abs()),
        Ordering::Greater => format!("£{} {}", a.prize_money.abs(), a.name),
        Ordering::Less => format!("£{} {}", b.prize_money.abs(), b.name),
    }
}
