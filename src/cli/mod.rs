use anyhow::Result;
use std::path::Path;

use crate::db;
use crate::models::{Game, LeagueStatus};
use crate::services::LeagueService;
use crate::utils::{calculate_win_percentage, format_money};

pub async fn seed(service: &LeagueService, demo: bool, reset: bool) -> Result<()> {
    if reset {
        println!("🧹 Clearing existing data...");
        db::clear_all_data(service.pool()).await?;
    }

    println!("🌱 Seeding database...");
    db::seed_data(service, demo).await?;
    println!("✅ Seed complete!");
    Ok(())
}

pub async fn list_players(service: &LeagueService) -> Result<()> {
    let players = service.list_players().await?;

    if players.is_empty() {
        println!("📭 No players found. Try seeding first with: prize-league seed");
        return Ok(());
    }

    println!("👥 Players:\n");
    for player in &players {
        println!("   • {} ({}) - {}", player.name, player.id, format_money(player.prize_money));
    }

    let leagues = service.list_leagues().await?;
    if !leagues.is_empty() {
        println!("\n🏆 Leagues:\n");
        for league in leagues {
            let status = match league.status {
                LeagueStatus::Active => "🟢 active",
                LeagueStatus::Finished => "🏁 finished",
            };
            println!("   • {} ({}) - {} games - {}", league.name, league.id, league.total_games, status);
        }
    }

    Ok(())
}

pub async fn show_table(service: &LeagueService, league_id: &str) -> Result<()> {
    let table = service.league_table(league_id).await?;
    let league = &table.league;

    println!("🏆 {} ({} of {} games played)", league.name, table.standings[0].played, league.total_games);
    match (&league.status, &league.champion_id) {
        (LeagueStatus::Finished, Some(champion)) => {
            let name = table
                .standings
                .iter()
                .find(|s| &s.player_id == champion)
                .map_or(champion.as_str(), |s| s.player_name.as_str());
            println!("🥇 Champion: {}", name);
        }
        (LeagueStatus::Finished, None) => println!("🤝 Finished level, no champion"),
        (LeagueStatus::Active, _) => println!("🟢 In progress"),
    }

    println!("\n{:<4}{:<20}{:>4}{:>4}{:>4}{:>4}{:>5}{:>5}{:>5}{:>5}{:>6}{:>7}",
        "#", "Player", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "xPts", "Win%");
    for (i, s) in table.standings.iter().enumerate() {
        println!("{:<4}{:<20}{:>4}{:>4}{:>4}{:>4}{:>5}{:>5}{:>+5}{:>5}{:>6}{:>6.1}%",
            i + 1,
            s.player_name,
            s.played,
            s.wins,
            s.draws,
            s.losses,
            s.goals_for,
            s.goals_against,
            s.goal_difference,
            s.points,
            s.expected_points,
            calculate_win_percentage(s.wins, s.draws, s.losses)
        );
    }

    println!("\n📈 Form:");
    for entry in &table.form {
        let name = table
            .standings
            .iter()
            .find(|s| s.player_id == entry.player_id)
            .map_or(entry.player_id.as_str(), |s| s.player_name.as_str());
        let form = if entry.form.is_empty() { "-" } else { entry.form.as_str() };
        println!("   {}: {}", name, form);
    }

    println!("\n📅 Recent Games:");
    if table.recent_games.is_empty() {
        println!("   No games played yet");
    }
    for game in &table.recent_games {
        let r = &game.result;
        println!("   {} {} {}-{} {} ({:+} / {:+})",
            r.played_at.format("%m/%d"),
            r.home_team,
            r.home_score,
            r.away_score,
            r.away_team,
            game.home_prize,
            game.away_prize
        );
    }

    println!("\n💰 Prize money leader: {}", table.prize_leader);
    Ok(())
}

pub async fn show_career(service: &LeagueService, player_id: &str) -> Result<()> {
    let player = service.get_player(player_id).await?;
    let career = service.career_stats(player_id).await?;

    println!("📊 Career for {}:", player.name);
    println!("   Prize money: {}", format_money(player.prize_money));
    println!("   Games played: {}", career.games_played);
    println!("   Wins: {}", career.wins);
    println!("   Goals: {}", career.goals);
    println!("   Hat tricks: {}", career.hat_tricks);
    println!("   Outside the box: {}", career.outside_box_goals);
    println!("   Headers: {}", career.header_goals);
    println!("   Penalties missed: {}", career.penalties_missed);
    println!("   Red cards: {}", career.red_cards);
    println!("   Win bonus: {}", career.win_bonus);
    println!("   Career bonus: {}", career.career_bonus);
    Ok(())
}

pub async fn audit(service: &LeagueService) -> Result<()> {
    println!("🔎 Replaying stored game prizes...\n");
    let audits = service.audit_balances().await?;

    let mut mismatches = 0;
    for audit in &audits {
        let marker = if audit.consistent { "✅" } else { "❌" };
        println!("   {} {}: stored {} / replayed {}",
            marker,
            audit.player_name,
            format_money(audit.stored_balance),
            format_money(audit.replayed_balance)
        );
        if !audit.consistent {
            mismatches += 1;
        }
    }

    if mismatches == 0 {
        println!("\n✅ All {} balances match their games", audits.len());
    } else {
        println!("\n❌ {} balance(s) do not match their games", mismatches);
    }
    Ok(())
}

pub async fn export_games(service: &LeagueService, league_id: &str, output: &Path) -> Result<()> {
    let league = service.get_league(league_id).await?;
    let games = service.league_games(league_id).await?;

    println!("📤 Exporting {} games from {}...", games.len(), league.name);
    write_games_csv(&games, output)?;
    println!("✅ Wrote {}", output.display());
    Ok(())
}

fn write_games_csv(games: &[Game], output: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record([
        "game_id",
        "played_at",
        "home_player_id",
        "away_player_id",
        "home_team",
        "away_team",
        "home_score",
        "away_score",
        "home_xg",
        "away_xg",
        "home_prize",
        "away_prize",
    ])?;

    for game in games {
        let r = &game.result;
        writer.write_record([
            game.id.clone(),
            r.played_at.to_rfc3339(),
            r.home_player_id.clone(),
            r.away_player_id.clone(),
            r.home_team.clone(),
            r.away_team.clone(),
            r.home_score.to_string(),
            r.away_score.to_string(),
            format!("{:.2}", r.home_xg),
            format!("{:.2}", r.away_xg),
            game.home_prize.to_string(),
            game.away_prize.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
