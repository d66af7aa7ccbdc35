use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::db;
use crate::error::LeagueError;
use crate::models::{
    BalanceAudit, CareerStats, Game, GameInput, League, LeagueOutcome, LeagueStatus, LeagueTable, MatchResult,
    MatchStats, NewLeague, Player, PlayerForm,
};
use crate::services::{career, compute_standings, recompute_league_state, PrizeMoneyCalculator};
use crate::utils::{result_char, results_to_form, validate_league_name, validate_player_name, validate_team_name};

pub const DEFAULT_TOTAL_GAMES: i32 = 10;
const RECENT_GAMES: usize = 5;

/// Upper bound for scores and per-game stat counts.
pub const MAX_GOALS: i32 = 99;
const MAX_EXPECTED_GOALS: f64 = 99.0;

/// Records games between a league's two players and keeps balances and
/// league status consistent with them.
///
/// Every mutation runs in one transaction: write the game, move both
/// players' prize money, then settle the league from the full game list.
/// Write transactions take SQLite's write lock up front, so concurrent
/// writers wait on the busy timeout instead of failing mid-transaction.
#[derive(Clone)]
pub struct LeagueService {
    pool: SqlitePool,
    calculator: PrizeMoneyCalculator,
}

impl LeagueService {
    pub fn new(pool: SqlitePool, calculator: PrizeMoneyCalculator) -> Self {
        Self { pool, calculator }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, LeagueError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // Players

    pub async fn create_player(&self, name: &str) -> Result<Player, LeagueError> {
        let name = name.trim();
        if !validate_player_name(name) {
            return Err(LeagueError::Validation(format!("Invalid player name: '{}'", name)));
        }

        let mut tx = self.begin_write().await?;
        if db::get_player_by_name(&mut tx, name).await?.is_some() {
            return Err(LeagueError::DuplicatePlayer(name.to_string()));
        }

        let player = Player {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            prize_money: 0,
            created_at: Utc::now(),
        };
        db::insert_player(&mut tx, &player).await?;
        tx.commit().await?;

        tracing::info!("Created player {} ({})", player.name, player.id);
        Ok(player)
    }

    pub async fn list_players(&self) -> Result<Vec<Player>, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        Ok(db::get_all_players(&mut conn).await?)
    }

    pub async fn get_player(&self, player_id: &str) -> Result<Player, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        db::get_player_by_id(&mut conn, player_id)
            .await?
            .ok_or_else(|| LeagueError::PlayerNotFound(player_id.to_string()))
    }

    // Leagues

    pub async fn create_league(&self, new_league: NewLeague) -> Result<League, LeagueError> {
        let football_league = new_league.football_league.trim().to_string();
        let total_games = new_league.total_games.unwrap_or(DEFAULT_TOTAL_GAMES);

        if !validate_league_name(&football_league) {
            return Err(LeagueError::Validation(format!("Invalid football league: '{}'", football_league)));
        }
        if total_games < 1 {
            return Err(LeagueError::Validation(format!("total_games must be at least 1, got {}", total_games)));
        }
        if new_league.player_a_id == new_league.player_b_id {
            return Err(LeagueError::Validation("A league needs two different players".to_string()));
        }

        let mut tx = self.begin_write().await?;
        for player_id in [&new_league.player_a_id, &new_league.player_b_id] {
            if db::get_player_by_id(&mut tx, player_id).await?.is_none() {
                return Err(LeagueError::PlayerNotFound(player_id.clone()));
            }
        }

        let number = db::count_leagues(&mut tx).await? + 1;
        let now = Utc::now();
        let league = League {
            id: Uuid::new_v4().to_string(),
            name: format!("{} - {}", number, football_league),
            football_league,
            total_games,
            player_a_id: new_league.player_a_id,
            player_b_id: new_league.player_b_id,
            status: LeagueStatus::Active,
            champion_id: None,
            created_at: now,
            updated_at: now,
        };
        db::insert_league(&mut tx, &league).await?;
        tx.commit().await?;

        tracing::info!("Created league '{}' ({} games)", league.name, league.total_games);
        Ok(league)
    }

    pub async fn list_leagues(&self) -> Result<Vec<League>, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        Ok(db::get_all_leagues(&mut conn).await?)
    }

    pub async fn get_league(&self, league_id: &str) -> Result<League, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        load_league(&mut conn, league_id).await
    }

    pub async fn league_games(&self, league_id: &str) -> Result<Vec<Game>, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        load_league(&mut conn, league_id).await?;
        Ok(db::get_league_games(&mut conn, league_id).await?)
    }

    pub async fn league_table(&self, league_id: &str) -> Result<LeagueTable, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        let league = load_league(&mut conn, league_id).await?;
        let player_a = load_player(&mut conn, &league.player_a_id).await?;
        let player_b = load_player(&mut conn, &league.player_b_id).await?;
        let games = db::get_league_games(&mut conn, league_id).await?;

        let standings = compute_standings(
            games.iter().map(|g| &g.result),
            (player_a.id.as_str(), player_a.name.as_str()),
            (player_b.id.as_str(), player_b.name.as_str()),
        );

        let form = [&player_a, &player_b]
            .iter()
            .map(|player| PlayerForm {
                player_id: player.id.clone(),
                form: player_form(&games, &player.id),
            })
            .collect();

        let recent_games = games.iter().rev().take(RECENT_GAMES).cloned().collect();

        Ok(LeagueTable {
            prize_leader: career::prize_money_leader(&player_a, &player_b),
            league,
            standings,
            recent_games,
            form,
        })
    }

    // Games

    pub async fn record_game(&self, league_id: &str, input: impl Into<GameInput>) -> Result<Game, LeagueError> {
        let mut tx = self.begin_write().await?;

        let league = load_league(&mut tx, league_id).await?;
        if league.status == LeagueStatus::Finished {
            return Err(LeagueError::LeagueFinished(league.id));
        }
        let result = input.into().into_result(Utc::now());
        validate_result(&league, &result)?;

        let (home_prize, away_prize) = self.prize_deltas(&result);
        let now = Utc::now();
        let game = Game {
            id: Uuid::new_v4().to_string(),
            league_id: league.id.clone(),
            result,
            home_prize,
            away_prize,
            created_at: now,
            updated_at: now,
        };

        db::insert_game(&mut tx, &game).await?;
        apply_prizes(&mut tx, &game, 1).await?;
        settle_league(&mut tx, &league).await?;
        tx.commit().await?;

        tracing::info!(
            "Recorded game {} {}-{} {} in '{}': prize {:+} / {:+}",
            game.result.home_team,
            game.result.home_score,
            game.result.away_score,
            game.result.away_team,
            league.name,
            home_prize,
            away_prize
        );
        Ok(game)
    }

    /// Replace a game's result and stats, moving prize money accordingly.
    /// Without a `played_at` the game keeps its original date.
    ///
    /// Allowed on finished leagues so results can be corrected; the league
    /// is settled again afterwards and may reopen.
    pub async fn update_game(&self, game_id: &str, input: impl Into<GameInput>) -> Result<Game, LeagueError> {
        let mut tx = self.begin_write().await?;

        let existing = load_game(&mut tx, game_id).await?;
        let league = load_league(&mut tx, &existing.league_id).await?;
        let result = input.into().into_result(existing.result.played_at);
        validate_result(&league, &result)?;

        apply_prizes(&mut tx, &existing, -1).await?;

        let (home_prize, away_prize) = self.prize_deltas(&result);
        let game = Game {
            result,
            home_prize,
            away_prize,
            updated_at: Utc::now(),
            ..existing
        };

        db::replace_game(&mut tx, &game).await?;
        apply_prizes(&mut tx, &game, 1).await?;
        settle_league(&mut tx, &league).await?;
        tx.commit().await?;

        tracing::info!("Updated game {}: prize now {:+} / {:+}", game.id, home_prize, away_prize);
        Ok(game)
    }

    /// Remove a game and refund both sides. Returns the league as settled afterwards.
    pub async fn delete_game(&self, game_id: &str) -> Result<League, LeagueError> {
        let mut tx = self.begin_write().await?;

        let existing = load_game(&mut tx, game_id).await?;
        let league = load_league(&mut tx, &existing.league_id).await?;

        apply_prizes(&mut tx, &existing, -1).await?;
        db::delete_game(&mut tx, game_id).await?;
        let outcome = settle_league(&mut tx, &league).await?;
        tx.commit().await?;

        tracing::info!("Deleted game {} from '{}'", game_id, league.name);
        Ok(League {
            status: outcome.status,
            champion_id: outcome.champion_id,
            ..league
        })
    }

    // Reporting

    pub async fn career_stats(&self, player_id: &str) -> Result<CareerStats, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        load_player(&mut conn, player_id).await?;
        let games = db::get_player_games(&mut conn, player_id).await?;
        Ok(career::career_stats(&self.calculator, player_id, &games))
    }

    /// Replay every stored game delta and compare with each player's balance.
    pub async fn audit_balances(&self) -> Result<Vec<BalanceAudit>, LeagueError> {
        let mut conn = self.pool.acquire().await?;
        let players = db::get_all_players(&mut conn).await?;
        let games = db::get_all_games(&mut conn).await?;

        let audits: Vec<BalanceAudit> = players
            .into_iter()
            .map(|player| {
                let replayed_balance: i64 = games.iter().filter_map(|g| g.prize_for(&player.id)).sum();
                BalanceAudit {
                    consistent: replayed_balance == player.prize_money,
                    stored_balance: player.prize_money,
                    replayed_balance,
                    player_id: player.id,
                    player_name: player.name,
                }
            })
            .collect();

        for audit in audits.iter().filter(|a| !a.consistent) {
            tracing::warn!(
                "Balance mismatch for {}: stored {} but games replay to {}",
                audit.player_name,
                audit.stored_balance,
                audit.replayed_balance
            );
        }

        Ok(audits)
    }

    fn prize_deltas(&self, result: &MatchResult) -> (i64, i64) {
        let home = self.calculator.calculate_match_delta(
            &result.home_stats,
            &result.away_stats,
            &result.home_team,
            result.home_score,
            result.away_score,
        );
        let away = self.calculator.calculate_match_delta(
            &result.away_stats,
            &result.home_stats,
            &result.away_team,
            result.away_score,
            result.home_score,
        );
        (home, away)
    }
}

async fn load_league(conn: &mut SqliteConnection, league_id: &str) -> Result<League, LeagueError> {
    db::get_league_by_id(conn, league_id)
        .await?
        .ok_or_else(|| LeagueError::LeagueNotFound(league_id.to_string()))
}

async fn load_player(conn: &mut SqliteConnection, player_id: &str) -> Result<Player, LeagueError> {
    db::get_player_by_id(conn, player_id)
        .await?
        .ok_or_else(|| LeagueError::PlayerNotFound(player_id.to_string()))
}

async fn load_game(conn: &mut SqliteConnection, game_id: &str) -> Result<Game, LeagueError> {
    db::get_game_by_id(conn, game_id)
        .await?
        .ok_or_else(|| LeagueError::GameNotFound(game_id.to_string()))
}

/// Add (`sign = 1`) or reverse (`sign = -1`) a game's stored prizes.
async fn apply_prizes(conn: &mut SqliteConnection, game: &Game, sign: i64) -> Result<(), LeagueError> {
    db::adjust_prize_money(conn, &game.result.home_player_id, sign * game.home_prize).await?;
    db::adjust_prize_money(conn, &game.result.away_player_id, sign * game.away_prize).await?;
    Ok(())
}

/// Recompute status and champion from the league's current games and store them.
async fn settle_league(conn: &mut SqliteConnection, league: &League) -> Result<LeagueOutcome, LeagueError> {
    let games = db::get_league_games(conn, &league.id).await?;
    let outcome = recompute_league_state(
        games.iter().map(|g| &g.result),
        &league.player_a_id,
        &league.player_b_id,
        league.total_games,
    );

    if outcome.status != league.status || outcome.champion_id != league.champion_id {
        tracing::info!(
            "League '{}' is now {} (champion: {})",
            league.name,
            outcome.status,
            outcome.champion_id.as_deref().unwrap_or("none")
        );
        db::update_league_outcome(conn, &league.id, &outcome).await?;
    }

    Ok(outcome)
}

fn validate_stats(side: &str, stats: &MatchStats) -> Result<(), LeagueError> {
    let counts = [
        stats.goals,
        stats.hat_tricks,
        stats.outside_box_goals,
        stats.header_goals,
        stats.penalties_missed,
        stats.red_cards,
    ];
    if counts.iter().any(|&c| !(0..=MAX_GOALS).contains(&c))
        || !(0.0..=MAX_EXPECTED_GOALS).contains(&stats.expected_goals)
    {
        return Err(LeagueError::Validation(format!(
            "{} stats must be between 0 and {}",
            side, MAX_GOALS
        )));
    }
    Ok(())
}

/// Reject anything the scoring engine is not defined for.
fn validate_result(league: &League, result: &MatchResult) -> Result<(), LeagueError> {
    let home = result.home_player_id.as_str();
    let away = result.away_player_id.as_str();
    let pair = [league.player_a_id.as_str(), league.player_b_id.as_str()];

    if home == away || !pair.contains(&home) || !pair.contains(&away) {
        return Err(LeagueError::Validation(
            "Home and away players must be the league's two players".to_string(),
        ));
    }
    if !validate_team_name(&result.home_team) || !validate_team_name(&result.away_team) {
        return Err(LeagueError::Validation("Team names must be 1-100 characters".to_string()));
    }
    let goals = 0..=MAX_GOALS;
    if !goals.contains(&result.home_score) || !goals.contains(&result.away_score) {
        return Err(LeagueError::Validation(format!("Scores must be between 0 and {}", MAX_GOALS)));
    }
    let xg = 0.0..=MAX_EXPECTED_GOALS;
    if !xg.contains(&result.home_xg) || !xg.contains(&result.away_xg) {
        return Err(LeagueError::Validation(format!(
            "Expected goals must be between 0 and {}",
            MAX_EXPECTED_GOALS
        )));
    }
    validate_stats("Home", &result.home_stats)?;
    validate_stats("Away", &result.away_stats)?;
    Ok(())
}

/// Last five results for `player_id`, most recent first.
fn player_form(games: &[Game], player_id: &str) -> String {
    let results: Vec<(char, chrono::DateTime<Utc>)> = games
        .iter()
        .filter_map(|game| {
            let r = &game.result;
            if r.home_player_id == player_id {
                Some((result_char(r.home_score, r.away_score), r.played_at))
            } else if r.away_player_id == player_id {
                Some((result_char(r.away_score, r.home_score), r.played_at))
            } else {
                None
            }
        })
        .collect();
    results_to_form(&results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Fixture {
        service: LeagueService,
        alice: Player,
        bob: Player,
        league: League,
    }

    async fn fixture(total_games: i32) -> Fixture {
        let pool = db::test_pool().await;
        let service = LeagueService::new(pool, PrizeMoneyCalculator::new());
        let alice = service.create_player("alice").await.unwrap();
        let bob = service.create_player("bob").await.unwrap();
        let league = service
            .create_league(NewLeague {
                player_a_id: alice.id.clone(),
                player_b_id: bob.id.clone(),
                football_league: "Premier League".to_string(),
                total_games: Some(total_games),
            })
            .await
            .unwrap();
        Fixture { service, alice, bob, league }
    }

    fn result(home: &Player, away: &Player, home_score: i32, away_score: i32) -> MatchResult {
        MatchResult {
            home_player_id: home.id.clone(),
            away_player_id: away.id.clone(),
            home_team: "Arsenal".to_string(),
            away_team: "Liverpool".to_string(),
            home_score,
            away_score,
            home_xg: 1.0,
            away_xg: 1.0,
            home_stats: MatchStats { goals: home_score, ..Default::default() },
            away_stats: MatchStats { goals: away_score, ..Default::default() },
            played_at: Utc::now(),
        }
    }

    async fn balances(f: &Fixture) -> (i64, i64) {
        let a = f.service.get_player(&f.alice.id).await.unwrap().prize_money;
        let b = f.service.get_player(&f.bob.id).await.unwrap().prize_money;
        (a, b)
    }

    async fn assert_replay_matches(f: &Fixture) {
        let audits = f.service.audit_balances().await.unwrap();
        assert_eq!(audits.len(), 2);
        assert!(audits.iter().all(|a| a.consistent), "{:?}", audits);
    }

    #[tokio::test]
    async fn test_create_league_numbers_names_and_defaults() {
        let f = fixture(10).await;
        assert_eq!(f.league.name, "1 - Premier League");
        assert_eq!(f.league.status, LeagueStatus::Active);

        let second = f
            .service
            .create_league(NewLeague {
                player_a_id: f.bob.id.clone(),
                player_b_id: f.alice.id.clone(),
                football_league: "Championship".to_string(),
                total_games: None,
            })
            .await
            .unwrap();
        assert_eq!(second.name, "2 - Championship");
        assert_eq!(second.total_games, DEFAULT_TOTAL_GAMES);
    }

    #[tokio::test]
    async fn test_create_league_validation() {
        let f = fixture(10).await;
        let same_player = f
            .service
            .create_league(NewLeague {
                player_a_id: f.alice.id.clone(),
                player_b_id: f.alice.id.clone(),
                football_league: "Premier League".to_string(),
                total_games: Some(10),
            })
            .await;
        assert!(matches!(same_player, Err(LeagueError::Validation(_))));

        let no_games = f
            .service
            .create_league(NewLeague {
                player_a_id: f.alice.id.clone(),
                player_b_id: f.bob.id.clone(),
                football_league: "Premier League".to_string(),
                total_games: Some(0),
            })
            .await;
        assert!(matches!(no_games, Err(LeagueError::Validation(_))));

        let ghost = f
            .service
            .create_league(NewLeague {
                player_a_id: f.alice.id.clone(),
                player_b_id: "ghost".to_string(),
                football_league: "Premier League".to_string(),
                total_games: Some(10),
            })
            .await;
        assert!(matches!(ghost, Err(LeagueError::PlayerNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_player_rejected() {
        let f = fixture(10).await;
        let err = f.service.create_player(" alice ").await.unwrap_err();
        assert!(matches!(err, LeagueError::DuplicatePlayer(_)));
    }

    #[tokio::test]
    async fn test_record_game_moves_prize_money() {
        let f = fixture(10).await;
        let game = f.service.record_game(&f.league.id, result(&f.alice, &f.bob, 3, 0)).await.unwrap();
        assert_eq!((game.home_prize, game.away_prize), (5, -5));
        assert_eq!(balances(&f).await, (5, -5));
        assert_replay_matches(&f).await;
    }

    #[tokio::test]
    async fn test_jackpot_team_is_not_zero_sum() {
        let f = fixture(10).await;
        let mut r = result(&f.bob, &f.alice, 3, 0);
        r.home_team = "Sheffield United".to_string();
        f.service.record_game(&f.league.id, r).await.unwrap();

        assert_eq!(balances(&f).await, (-5, 10));
        assert_replay_matches(&f).await;
    }

    #[tokio::test]
    async fn test_record_game_validation() {
        let f = fixture(10).await;

        let negative = f.service.record_game(&f.league.id, result(&f.alice, &f.bob, -1, 0)).await;
        assert!(matches!(negative, Err(LeagueError::Validation(_))));

        let same_side = f.service.record_game(&f.league.id, result(&f.alice, &f.alice, 1, 0)).await;
        assert!(matches!(same_side, Err(LeagueError::Validation(_))));

        let mut bad_stats = result(&f.alice, &f.bob, 1, 0);
        bad_stats.away_stats.red_cards = -2;
        let bad_stats = f.service.record_game(&f.league.id, bad_stats).await;
        assert!(matches!(bad_stats, Err(LeagueError::Validation(_))));

        let missing = f.service.record_game("nope", result(&f.alice, &f.bob, 1, 0)).await;
        assert!(matches!(missing, Err(LeagueError::LeagueNotFound(_))));

        // Nothing was written
        assert_eq!(balances(&f).await, (0, 0));
        assert!(f.service.league_games(&f.league.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_early_clinch_then_reopen_on_edit() {
        let f = fixture(10).await;
        f.service.record_game(&f.league.id, result(&f.bob, &f.alice, 1, 0)).await.unwrap();
        let mut alice_wins = Vec::new();
        for _ in 0..6 {
            alice_wins.push(f.service.record_game(&f.league.id, result(&f.alice, &f.bob, 1, 0)).await.unwrap());
        }

        let league = f.service.get_league(&f.league.id).await.unwrap();
        assert_eq!(league.status, LeagueStatus::Finished);
        assert_eq!(league.champion_id.as_deref(), Some(f.alice.id.as_str()));

        let refused = f.service.record_game(&f.league.id, result(&f.alice, &f.bob, 1, 0)).await;
        assert!(matches!(refused, Err(LeagueError::LeagueFinished(_))));

        // 15 v 6 with three to play: Bob can still draw level
        f.service
            .update_game(&alice_wins[0].id, result(&f.bob, &f.alice, 2, 0))
            .await
            .unwrap();

        let league = f.service.get_league(&f.league.id).await.unwrap();
        assert_eq!(league.status, LeagueStatus::Active);
        assert_eq!(league.champion_id, None);
        assert_replay_matches(&f).await;
    }

    #[tokio::test]
    async fn test_delete_reverses_prizes_and_reopens() {
        let f = fixture(2).await;
        f.service.record_game(&f.league.id, result(&f.alice, &f.bob, 2, 0)).await.unwrap();
        let last = f.service.record_game(&f.league.id, result(&f.bob, &f.alice, 1, 0)).await.unwrap();

        let league = f.service.get_league(&f.league.id).await.unwrap();
        assert_eq!(league.status, LeagueStatus::Finished);
        assert_eq!(league.champion_id, None);

        let league = f.service.delete_game(&last.id).await.unwrap();
        assert_eq!(league.status, LeagueStatus::Active);
        assert_eq!(balances(&f).await, (4, -4));
        assert_eq!(f.service.get_league(&f.league.id).await.unwrap().status, LeagueStatus::Active);
        assert_replay_matches(&f).await;

        let missing = f.service.delete_game(&last.id).await;
        assert!(matches!(missing, Err(LeagueError::GameNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_stats_wholesale() {
        let f = fixture(10).await;
        let mut r = result(&f.alice, &f.bob, 3, 0);
        r.home_stats.hat_tricks = 1;
        let game = f.service.record_game(&f.league.id, r).await.unwrap();
        assert_eq!(balances(&f).await, (7, -7));

        let mut edited = result(&f.alice, &f.bob, 1, 1);
        edited.away_stats.header_goals = 1;
        let game = f.service.update_game(&game.id, edited).await.unwrap();
        assert_eq!((game.home_prize, game.away_prize), (-1, 1));
        assert_eq!(balances(&f).await, (-1, 1));

        let games = f.service.league_games(&f.league.id).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].result.home_stats.hat_tricks, 0);
        assert_eq!(games[0].result.away_stats.header_goals, 1);
        assert_replay_matches(&f).await;
    }

    #[tokio::test]
    async fn test_league_table() {
        let f = fixture(10).await;
        let start = Utc::now() - Duration::days(3);
        let mut first = result(&f.alice, &f.bob, 1, 0);
        first.played_at = start;
        let mut second = result(&f.bob, &f.alice, 4, 0);
        second.played_at = start + Duration::days(1);
        let mut third = result(&f.alice, &f.bob, 2, 2);
        third.played_at = start + Duration::days(2);
        for r in [first, second, third] {
            f.service.record_game(&f.league.id, r).await.unwrap();
        }

        let table = f.service.league_table(&f.league.id).await.unwrap();
        assert_eq!(table.standings[0].player_id, f.bob.id);
        assert_eq!(table.standings[0].points, 4);
        assert_eq!(table.standings[1].points, 4);
        assert_eq!(table.recent_games.len(), 3);
        assert_eq!(table.recent_games[0].result.home_score, 2);

        let alice_form = table.form.iter().find(|p| p.player_id == f.alice.id).unwrap();
        assert_eq!(alice_form.form, "DLW");
        assert_eq!(table.prize_leader, "£3 bob");
    }

    #[tokio::test]
    async fn test_career_stats_through_service() {
        let f = fixture(10).await;
        f.service.record_game(&f.league.id, result(&f.alice, &f.bob, 2, 1)).await.unwrap();
        f.service.record_game(&f.league.id, result(&f.bob, &f.alice, 0, 0)).await.unwrap();

        let career = f.service.career_stats(&f.alice.id).await.unwrap();
        assert_eq!(career.games_played, 2);
        assert_eq!(career.wins, 1);
        assert_eq!(career.goals, 2);

        let missing = f.service.career_stats("ghost").await;
        assert!(matches!(missing, Err(LeagueError::PlayerNotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_without_date_keeps_played_at() {
        let f = fixture(10).await;
        let played_at = Utc::now() - Duration::days(30);
        let mut original = result(&f.alice, &f.bob, 1, 0);
        original.played_at = played_at;
        let game = f.service.record_game(&f.league.id, original).await.unwrap();

        let mut edit = GameInput::from(result(&f.alice, &f.bob, 2, 2));
        edit.played_at = None;
        let edited = f.service.update_game(&game.id, edit).await.unwrap();
        assert_eq!(edited.result.played_at, played_at);

        let stored = f.service.league_games(&f.league.id).await.unwrap();
        assert_eq!(stored[0].result.played_at, played_at);
        assert_eq!(stored[0].result.home_score, 2);

        let moved = played_at + Duration::days(1);
        let mut edit = GameInput::from(result(&f.alice, &f.bob, 2, 2));
        edit.played_at = Some(moved);
        let edited = f.service.update_game(&game.id, edit).await.unwrap();
        assert_eq!(edited.result.played_at, moved);
    }

    #[tokio::test]
    async fn test_new_game_without_date_is_played_now() {
        let f = fixture(10).await;
        let before = Utc::now();
        let mut input = GameInput::from(result(&f.alice, &f.bob, 1, 0));
        input.played_at = None;
        let game = f.service.record_game(&f.league.id, input).await.unwrap();
        assert!(game.result.played_at >= before);
    }

    #[tokio::test]
    async fn test_scores_and_stats_are_capped() {
        let f = fixture(10).await;

        let at_limit = f
            .service
            .record_game(&f.league.id, result(&f.alice, &f.bob, MAX_GOALS, 0))
            .await;
        assert!(at_limit.is_ok());

        let huge = f
            .service
            .record_game(&f.league.id, result(&f.alice, &f.bob, i32::MAX, 0))
            .await;
        assert!(matches!(huge, Err(LeagueError::Validation(_))));

        let mut r = result(&f.alice, &f.bob, 1, 0);
        r.away_stats.red_cards = MAX_GOALS + 1;
        let too_many_cards = f.service.record_game(&f.league.id, r).await;
        assert!(matches!(too_many_cards, Err(LeagueError::Validation(_))));

        let mut r = result(&f.alice, &f.bob, 1, 0);
        r.home_xg = f64::INFINITY;
        let infinite_xg = f.service.record_game(&f.league.id, r).await;
        assert!(matches!(infinite_xg, Err(LeagueError::Validation(_))));

        assert_eq!(f.service.league_games(&f.league.id).await.unwrap().len(), 1);
        assert_replay_matches(&f).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_wait_their_turn() {
        let path = std::env::temp_dir().join(format!("prize-league-{}.db", Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());
        let pool = db::init_database(&url).await.unwrap();
        let service = LeagueService::new(pool, PrizeMoneyCalculator::new());

        let alice = service.create_player("alice").await.unwrap();
        let bob = service.create_player("bob").await.unwrap();
        let league = service
            .create_league(NewLeague {
                player_a_id: alice.id.clone(),
                player_b_id: bob.id.clone(),
                football_league: "Premier League".to_string(),
                total_games: Some(40),
            })
            .await
            .unwrap();

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                let league_id = league.id.clone();
                let r = if i % 2 == 0 {
                    result(&alice, &bob, 2, 1)
                } else {
                    result(&bob, &alice, 2, 1)
                };
                tokio::spawn(async move { service.record_game(&league_id, r).await })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert_eq!(service.league_games(&league.id).await.unwrap().len(), 16);
        let audits = service.audit_balances().await.unwrap();
        assert!(audits.iter().all(|a| a.consistent), "{:?}", audits);

        service.pool().close().await;
        for suffix in ["", "-wal", "-shm"] {
            std::fs::remove_file(format!("{}{}", path.display(), suffix)).ok();
        }
    }
}
