use anyhow::Result;
use chrono::{Duration, Utc};

use crate::models::{MatchResult, MatchStats, NewLeague, Player};
use crate::services::LeagueService;

pub const DEFAULT_PLAYERS: [&str; 2] = ["player1", "player2"];

/// Create the two default players, plus a demo league with a few games when
/// `demo` is set. Safe to run more than once.
pub async fn seed_data(service: &LeagueService, demo: bool) -> Result<()> {
    let mut players = Vec::with_capacity(DEFAULT_PLAYERS.len());
    for name in DEFAULT_PLAYERS {
        players.push(ensure_player(service, name).await?);
    }

    if !demo {
        tracing::info!("Database seeded with default players.");
        return Ok(());
    }

    if !service.list_leagues().await?.is_empty() {
        tracing::info!("Leagues already exist, skipping demo league.");
        return Ok(());
    }

    seed_demo_league(service, &players[0], &players[1]).await?;
    tracing::info!("Database seeded with default players and a demo league.");
    Ok(())
}

async fn ensure_player(service: &LeagueService, name: &str) -> Result<Player> {
    let existing = service.list_players().await?.into_iter().find(|p| p.name == name);
    match existing {
        Some(player) => {
            tracing::info!("Player {} already exists, skipping.", name);
            Ok(player)
        }
        None => Ok(service.create_player(name).await?),
    }
}

fn stats(goals: i32) -> MatchStats {
    MatchStats {
        goals,
        ..Default::default()
    }
}

async fn seed_demo_league(service: &LeagueService, home: &Player, away: &Player) -> Result<()> {
    let league = service
        .create_league(NewLeague {
            player_a_id: home.id.clone(),
            player_b_id: away.id.clone(),
            football_league: "Premier League".to_string(),
            total_games: Some(10),
        })
        .await?;

    // (home is player1, home team, away team, home score, away score, home xG, away xG)
    let fixtures: Vec<(bool, &str, &str, i32, i32, f64, f64)> = vec![
        (true,  "Arsenal",          "Liverpool",       2, 1, 1.8, 1.1),
        (false, "Manchester City",  "Chelsea",         3, 3, 2.4, 2.0),
        (true,  "Tottenham Hotspur", "Sheffield United", 0, 1, 1.3, 0.9),
        (false, "Newcastle United", "Aston Villa",     1, 0, 1.0, 0.7),
    ];

    let start = Utc::now() - Duration::days(fixtures.len() as i64);
    for (i, (player1_home, home_team, away_team, home_score, away_score, home_xg, away_xg)) in
        fixtures.into_iter().enumerate()
    {
        let (home_player, away_player) = if player1_home { (home, away) } else { (away, home) };

        let mut home_stats = stats(home_score);
        let away_stats = stats(away_score);
        if home_score >= 3 {
            home_stats.hat_tricks = 1;
            home_stats.outside_box_goals = 1;
        }
        home_stats.expected_goals = home_xg;

        let result = MatchResult {
            home_player_id: home_player.id.clone(),
            away_player_id: away_player.id.clone(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_score,
            away_score,
            home_xg,
            away_xg,
            home_stats,
            away_stats: MatchStats {
                expected_goals: away_xg,
                header_goals: if away_score > 0 { 1 } else { 0 },
                ..away_stats
            },
            played_at: start + Duration::days(i as i64),
        };
        service.record_game(&league.id, result).await?;
    }

    Ok(())
}
