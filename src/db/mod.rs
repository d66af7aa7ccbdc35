pub mod seed;
pub use seed::seed_data;

pub async fn clear_all_data(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM game_player_stats").execute(pool).await?;
    sqlx::query("DELETE FROM games").execute(pool).await?;
    sqlx::query("DELETE FROM leagues").execute(pool).await?;
    sqlx::query("DELETE FROM players").execute(pool).await?;
    tracing::info!("All data cleared");
    Ok(())
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::str::FromStr;

use crate::models::*;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes if they don't exist yet.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            prize_money INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leagues (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            football_league TEXT NOT NULL,
            total_games INTEGER NOT NULL DEFAULT 10,
            player_a_id TEXT NOT NULL,
            player_b_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            champion_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (player_a_id) REFERENCES players (id),
            FOREIGN KEY (player_b_id) REFERENCES players (id),
            FOREIGN KEY (champion_id) REFERENCES players (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            id TEXT PRIMARY KEY,
            league_id TEXT NOT NULL,
            home_player_id TEXT NOT NULL,
            away_player_id TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_score INTEGER NOT NULL,
            away_score INTEGER NOT NULL,
            home_xg REAL NOT NULL DEFAULT 0.0,
            away_xg REAL NOT NULL DEFAULT 0.0,
            home_prize INTEGER NOT NULL DEFAULT 0,
            away_prize INTEGER NOT NULL DEFAULT 0,
            played_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (league_id) REFERENCES leagues (id),
            FOREIGN KEY (home_player_id) REFERENCES players (id),
            FOREIGN KEY (away_player_id) REFERENCES players (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per side of a game; replaced wholesale when the game is edited
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS game_player_stats (
            id TEXT PRIMARY KEY,
            game_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            is_home INTEGER NOT NULL,
            goals INTEGER NOT NULL DEFAULT 0,
            hat_tricks INTEGER NOT NULL DEFAULT 0,
            outside_box_goals INTEGER NOT NULL DEFAULT 0,
            header_goals INTEGER NOT NULL DEFAULT 0,
            penalties_missed INTEGER NOT NULL DEFAULT 0,
            red_cards INTEGER NOT NULL DEFAULT 0,
            xg REAL NOT NULL DEFAULT 0.0,
            UNIQUE (game_id, is_home),
            FOREIGN KEY (game_id) REFERENCES games (id) ON DELETE CASCADE,
            FOREIGN KEY (player_id) REFERENCES players (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_games_league ON games(league_id, played_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_leagues_status ON leagues(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

// Player operations

fn player_from_row(row: &SqliteRow) -> Result<Player> {
    Ok(Player {
        id: row.get("id"),
        name: row.get("name"),
        prize_money: row.get("prize_money"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

pub async fn insert_player(conn: &mut SqliteConnection, player: &Player) -> Result<()> {
    sqlx::query("INSERT INTO players (id, name, prize_money, created_at) VALUES (?, ?, ?, ?)")
        .bind(&player.id)
        .bind(&player.name)
        .bind(player.prize_money)
        .bind(player.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn get_player_by_id(conn: &mut SqliteConnection, player_id: &str) -> Result<Option<Player>> {
    let row = sqlx::query("SELECT * FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(player_from_row).transpose()
}

pub async fn get_player_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Player>> {
    let row = sqlx::query("SELECT * FROM players WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(player_from_row).transpose()
}

pub async fn get_all_players(conn: &mut SqliteConnection) -> Result<Vec<Player>> {
    let rows = sqlx::query("SELECT * FROM players ORDER BY name")
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(player_from_row).collect()
}

/// Add `delta` (possibly negative) to a player's running balance.
pub async fn adjust_prize_money(conn: &mut SqliteConnection, player_id: &str, delta: i64) -> Result<()> {
    let result = sqlx::query("UPDATE players SET prize_money = prize_money + ? WHERE id = ?")
        .bind(delta)
        .bind(player_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() != 1 {
        return Err(anyhow::anyhow!("Player {} not found while adjusting prize money", player_id));
    }
    Ok(())
}

// League operations

fn league_from_row(row: &SqliteRow) -> Result<League> {
    Ok(League {
        id: row.get("id"),
        name: row.get("name"),
        football_league: row.get("football_league"),
        total_games: row.get("total_games"),
        player_a_id: row.get("player_a_id"),
        player_b_id: row.get("player_b_id"),
        status: row.get::<String, _>("status").parse()?,
        champion_id: row.get("champion_id"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn count_leagues(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leagues")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn insert_league(conn: &mut SqliteConnection, league: &League) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO leagues
        (id, name, football_league, total_games, player_a_id, player_b_id, status, champion_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&league.id)
    .bind(&league.name)
    .bind(&league.football_league)
    .bind(league.total_games)
    .bind(&league.player_a_id)
    .bind(&league.player_b_id)
    .bind(league.status.as_str())
    .bind(&league.champion_id)
    .bind(league.created_at.to_rfc3339())
    .bind(league.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn get_league_by_id(conn: &mut SqliteConnection, league_id: &str) -> Result<Option<League>> {
    let row = sqlx::query("SELECT * FROM leagues WHERE id = ?")
        .bind(league_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(league_from_row).transpose()
}

pub async fn get_all_leagues(conn: &mut SqliteConnection) -> Result<Vec<League>> {
    let rows = sqlx::query("SELECT * FROM leagues ORDER BY created_at DESC")
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(league_from_row).collect()
}

pub async fn update_league_outcome(
    conn: &mut SqliteConnection,
    league_id: &str,
    outcome: &LeagueOutcome,
) -> Result<()> {
    sqlx::query("UPDATE leagues SET status = ?, champion_id = ?, updated_at = ? WHERE id = ?")
        .bind(outcome.status.as_str())
        .bind(&outcome.champion_id)
        .bind(Utc::now().to_rfc3339())
        .bind(league_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// Game operations

const GAME_SELECT: &str = r#"
    SELECT g.*,
        COALESCE(hs.goals, 0) AS h_goals,
        COALESCE(hs.hat_tricks, 0) AS h_hat_tricks,
        COALESCE(hs.outside_box_goals, 0) AS h_outside_box_goals,
        COALESCE(hs.header_goals, 0) AS h_header_goals,
        COALESCE(hs.penalties_missed, 0) AS h_penalties_missed,
        COALESCE(hs.red_cards, 0) AS h_red_cards,
        COALESCE(hs.xg, 0.0) AS h_xg,
        COALESCE(aws.goals, 0) AS a_goals,
        COALESCE(aws.hat_tricks, 0) AS a_hat_tricks,
        COALESCE(aws.outside_box_goals, 0) AS a_outside_box_goals,
        COALESCE(aws.header_goals, 0) AS a_header_goals,
        COALESCE(aws.penalties_missed, 0) AS a_penalties_missed,
        COALESCE(aws.red_cards, 0) AS a_red_cards,
        COALESCE(aws.xg, 0.0) AS a_xg
    FROM games g
    LEFT JOIN game_player_stats hs ON hs.game_id = g.id AND hs.is_home = 1
    LEFT JOIN game_player_stats aws ON aws.game_id = g.id AND aws.is_home = 0
"#;

fn stats_from_row(row: &SqliteRow, prefix: &str) -> MatchStats {
    let col = |name: &str| format!("{}_{}", prefix, name);
    MatchStats {
        goals: row.get(col("goals").as_str()),
        hat_tricks: row.get(col("hat_tricks").as_str()),
        outside_box_goals: row.get(col("outside_box_goals").as_str()),
        header_goals: row.get(col("header_goals").as_str()),
        penalties_missed: row.get(col("penalties_missed").as_str()),
        red_cards: row.get(col("red_cards").as_str()),
        expected_goals: row.get(col("xg").as_str()),
    }
}

fn game_from_row(row: &SqliteRow) -> Result<Game> {
    Ok(Game {
        id: row.get("id"),
        league_id: row.get("league_id"),
        result: MatchResult {
            home_player_id: row.get("home_player_id"),
            away_player_id: row.get("away_player_id"),
            home_team: row.get("home_team"),
            away_team: row.get("away_team"),
            home_score: row.get("home_score"),
            away_score: row.get("away_score"),
            home_xg: row.get("home_xg"),
            away_xg: row.get("away_xg"),
            home_stats: stats_from_row(row, "h"),
            away_stats: stats_from_row(row, "a"),
            played_at: parse_timestamp(&row.get::<String, _>("played_at"))?,
        },
        home_prize: row.get("home_prize"),
        away_prize: row.get("away_prize"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

async fn insert_stats(
    conn: &mut SqliteConnection,
    game_id: &str,
    player_id: &str,
    is_home: bool,
    stats: &MatchStats,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO game_player_stats
        (id, game_id, player_id, is_home, goals, hat_tricks, outside_box_goals,
         header_goals, penalties_missed, red_cards, xg)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(game_id)
    .bind(player_id)
    .bind(is_home)
    .bind(stats.goals)
    .bind(stats.hat_tricks)
    .bind(stats.outside_box_goals)
    .bind(stats.header_goals)
    .bind(stats.penalties_missed)
    .bind(stats.red_cards)
    .bind(stats.expected_goals)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Insert a game and both of its stat rows.
pub async fn insert_game(conn: &mut SqliteConnection, game: &Game) -> Result<()> {
    let result = &game.result;
    sqlx::query(
        r#"
        INSERT INTO games
        (id, league_id, home_player_id, away_player_id, home_team, away_team,
         home_score, away_score, home_xg, away_xg, home_prize, away_prize,
         played_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&game.id)
    .bind(&game.league_id)
    .bind(&result.home_player_id)
    .bind(&result.away_player_id)
    .bind(&result.home_team)
    .bind(&result.away_team)
    .bind(result.home_score)
    .bind(result.away_score)
    .bind(result.home_xg)
    .bind(result.away_xg)
    .bind(game.home_prize)
    .bind(game.away_prize)
    .bind(result.played_at.to_rfc3339())
    .bind(game.created_at.to_rfc3339())
    .bind(game.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    insert_stats(conn, &game.id, &result.home_player_id, true, &result.home_stats).await?;
    insert_stats(conn, &game.id, &result.away_player_id, false, &result.away_stats).await?;

    Ok(())
}

/// Overwrite a game row and replace its stat rows.
pub async fn replace_game(conn: &mut SqliteConnection, game: &Game) -> Result<()> {
    let result = &game.result;
    sqlx::query(
        r#"
        UPDATE games SET
            home_player_id = ?, away_player_id = ?, home_team = ?, away_team = ?,
            home_score = ?, away_score = ?, home_xg = ?, away_xg = ?,
            home_prize = ?, away_prize = ?, played_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&result.home_player_id)
    .bind(&result.away_player_id)
    .bind(&result.home_team)
    .bind(&result.away_team)
    .bind(result.home_score)
    .bind(result.away_score)
    .bind(result.home_xg)
    .bind(result.away_xg)
    .bind(game.home_prize)
    .bind(game.away_prize)
    .bind(result.played_at.to_rfc3339())
    .bind(game.updated_at.to_rfc3339())
    .bind(&game.id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM game_player_stats WHERE game_id = ?")
        .bind(&game.id)
        .execute(&mut *conn)
        .await?;

    insert_stats(conn, &game.id, &result.home_player_id, true, &result.home_stats).await?;
    insert_stats(conn, &game.id, &result.away_player_id, false, &result.away_stats).await?;

    Ok(())
}

pub async fn delete_game(conn: &mut SqliteConnection, game_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM game_player_stats WHERE game_id = ?")
        .bind(game_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM games WHERE id = ?")
        .bind(game_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn get_game_by_id(conn: &mut SqliteConnection, game_id: &str) -> Result<Option<Game>> {
    let query = format!("{} WHERE g.id = ?", GAME_SELECT);
    let row = sqlx::query(&query)
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(game_from_row).transpose()
}

/// Every game in a league, oldest first.
pub async fn get_league_games(conn: &mut SqliteConnection, league_id: &str) -> Result<Vec<Game>> {
    let query = format!("{} WHERE g.league_id = ? ORDER BY g.played_at ASC, g.created_at ASC", GAME_SELECT);
    let rows = sqlx::query(&query)
        .bind(league_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(game_from_row).collect()
}

/// Every game a player took part in, across all leagues, oldest first.
pub async fn get_player_games(conn: &mut SqliteConnection, player_id: &str) -> Result<Vec<Game>> {
    let query = format!(
        "{} WHERE g.home_player_id = ? OR g.away_player_id = ? ORDER BY g.played_at ASC, g.created_at ASC",
        GAME_SELECT
    );
    let rows = sqlx::query(&query)
        .bind(player_id)
        .bind(player_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(game_from_row).collect()
}

pub async fn get_all_games(conn: &mut SqliteConnection) -> Result<Vec<Game>> {
    let query = format!("{} ORDER BY g.played_at ASC, g.created_at ASC", GAME_SELECT);
    let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

    rows.iter().map(game_from_row).collect()
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(
            SqliteConnectOptions::from_str("sqlite::memory:")
                .expect("memory url")
                .foreign_keys(true),
        )
        .await
        .expect("in-memory pool");
    init_database_with_pool(&pool).await.expect("schema");
    pool
}
