use crate::models::MatchStats;

pub const DEFAULT_JACKPOT_TEAM: &str = "sheffield united";
pub const DEFAULT_JACKPOT_MULTIPLIER: i64 = 2;

const WIN_BONUS: i64 = 2;

/// Sum of a player's individual bonus events for one game.
///
/// +2 per hat trick, +2 per goal from outside the box, +1 per header,
/// -1 per missed penalty, -1 per red card.
pub fn individual_bonus(stats: &MatchStats) -> i64 {
    let mut bonus = 0i64;
    bonus += 2 * stats.hat_tricks as i64;
    bonus += 2 * stats.outside_box_goals as i64;
    bonus += stats.header_goals as i64;
    bonus -= stats.penalties_missed as i64;
    bonus -= stats.red_cards as i64;
    bonus
}

#[derive(Debug, Clone)]
struct Jackpot {
    team: String, // lowercased
    multiplier: i64,
}

/// Turns a game result into the signed prize money each side earns.
///
/// Without the jackpot rule the two sides of a game always sum to zero.
/// A side whose team name contains the jackpot team (case-insensitive) has
/// its whole delta multiplied, which deliberately breaks that symmetry
/// unless both sides play as the jackpot team.
#[derive(Debug, Clone)]
pub struct PrizeMoneyCalculator {
    jackpot: Option<Jackpot>,
}

impl Default for PrizeMoneyCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PrizeMoneyCalculator {
    pub fn new() -> Self {
        Self::with_jackpot(DEFAULT_JACKPOT_TEAM, DEFAULT_JACKPOT_MULTIPLIER)
    }

    pub fn with_jackpot(team: &str, multiplier: i64) -> Self {
        let team = team.trim().to_lowercase();
        if team.is_empty() {
            return Self::without_jackpot();
        }
        Self {
            jackpot: Some(Jackpot { team, multiplier }),
        }
    }

    pub fn without_jackpot() -> Self {
        Self { jackpot: None }
    }

    pub fn is_jackpot_team(&self, team_name: &str) -> bool {
        match &self.jackpot {
            Some(jackpot) => team_name.to_lowercase().contains(&jackpot.team),
            None => false,
        }
    }

    /// Prize money for one side of a game, from that side's perspective.
    pub fn calculate_match_delta(
        &self,
        player_stats: &MatchStats,
        opponent_stats: &MatchStats,
        player_team: &str,
        player_score: i32,
        opponent_score: i32,
    ) -> i64 {
        let mut delta = (player_score - opponent_score) as i64;

        delta += match player_score.cmp(&opponent_score) {
            std::cmp::Ordering::Greater => WIN_BONUS,
            std::cmp::Ordering::Less => -WIN_BONUS,
            std::cmp::Ordering::Equal => 0,
        };

        delta += individual_bonus(player_stats);
        delta -= individual_bonus(opponent_stats);

        self.apply_jackpot(delta, player_team)
    }

    /// Multiplies `amount` when `team_name` hits the jackpot rule.
    pub fn apply_jackpot(&self, amount: i64, team_name: &str) -> i64 {
        match &self.jackpot {
            Some(jackpot) if self.is_jackpot_team(team_name) => amount * jackpot.multiplier,
            _ => amount,
        }
    }
}
