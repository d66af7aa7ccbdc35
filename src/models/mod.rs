use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub prize_money: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueStatus {
    Active,
    Finished,
}

impl LeagueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueStatus::Active => "active",
            LeagueStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeagueStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LeagueStatus::Active),
            "finished" => Ok(LeagueStatus::Finished),
            other => Err(anyhow::anyhow!("Unknown league status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub football_league: String, // "Premier League", "Championship", ...
    pub total_games: i32,
    pub player_a_id: String,
    pub player_b_id: String,
    pub status: LeagueStatus,
    pub champion_id: Option<String>, // None while active, or a tie at full time
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-player tallies for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStats {
    pub goals: i32,
    pub hat_tricks: i32,
    pub outside_box_goals: i32,
    pub header_goals: i32,
    pub penalties_missed: i32,
    pub red_cards: i32,
    pub expected_goals: f64,
}

/// The recorded outcome of one game, as entered by the players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub home_player_id: String,
    pub away_player_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
    pub home_xg: f64,
    pub away_xg: f64,
    #[serde(default)]
    pub home_stats: MatchStats,
    #[serde(default)]
    pub away_stats: MatchStats,
    pub played_at: DateTime<Utc>,
}

/// Request body for recording or editing a game.
///
/// `played_at` is optional: a new game defaults to now, an edit keeps the
/// date already stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInput {
    pub home_player_id: String,
    pub away_player_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
    pub home_xg: f64,
    pub away_xg: f64,
    #[serde(default)]
    pub home_stats: MatchStats,
    #[serde(default)]
    pub away_stats: MatchStats,
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
}

impl GameInput {
    pub fn into_result(self, default_played_at: DateTime<Utc>) -> MatchResult {
        MatchResult {
            home_player_id: self.home_player_id,
            away_player_id: self.away_player_id,
            home_team: self.home_team,
            away_team: self.away_team,
            home_score: self.home_score,
            away_score: self.away_score,
            home_xg: self.home_xg,
            away_xg: self.away_xg,
            home_stats: self.home_stats,
            away_stats: self.away_stats,
            played_at: self.played_at.unwrap_or(default_played_at),
        }
    }
}

impl From<MatchResult> for GameInput {
    fn from(result: MatchResult) -> Self {
        Self {
            home_player_id: result.home_player_id,
            away_player_id: result.away_player_id,
            home_team: result.home_team,
            away_team: result.away_team,
            home_score: result.home_score,
            away_score: result.away_score,
            home_xg: result.home_xg,
            away_xg: result.away_xg,
            home_stats: result.home_stats,
            away_stats: result.away_stats,
            played_at: Some(result.played_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub league_id: String,
    #[serde(flatten)]
    pub result: MatchResult,
    /// Deltas applied to each player's balance when this game was last written.
    pub home_prize: i64,
    pub away_prize: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// The stored prize delta for `player_id`, if they took part.
    pub fn prize_for(&self, player_id: &str) -> Option<i64> {
        if self.result.home_player_id == player_id {
            Some(self.home_prize)
        } else if self.result.away_player_id == player_id {
            Some(self.away_prize)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: String,
    pub player_name: String,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
    pub expected_points: i32,
}

impl PlayerStanding {
    pub fn new(player_id: &str, player_name: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            player_name: player_name.to_string(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            expected_points: 0,
        }
    }
}

/// Status and champion a league should hold given its games so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueOutcome {
    pub status: LeagueStatus,
    pub champion_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLeague {
    pub player_a_id: String,
    pub player_b_id: String,
    pub football_league: String,
    pub total_games: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueTable {
    pub league: League,
    pub standings: [PlayerStanding; 2],
    pub recent_games: Vec<Game>, // Last 5, most recent first
    pub form: Vec<PlayerForm>,
    pub prize_leader: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerForm {
    pub player_id: String,
    pub form: String, // Last 5 games: "WLWDW" etc
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerStats {
    pub player_id: String,
    pub games_played: i32,
    pub wins: i32,
    pub goals: i32,
    pub hat_tricks: i32,
    pub outside_box_goals: i32,
    pub header_goals: i32,
    pub penalties_missed: i32,
    pub red_cards: i32,
    pub win_bonus: i32,
    pub career_bonus: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAudit {
    pub player_id: String,
    pub player_name: String,
    pub stored_balance: i64,
    pub replayed_balance: i64,
    pub consistent: bool,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
