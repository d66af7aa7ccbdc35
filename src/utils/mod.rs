use chrono::{DateTime, Utc};

/// 'W', 'D' or 'L' for the side that scored `scored` and conceded `conceded`
pub fn result_char(scored: i32, conceded: i32) -> char {
    match scored.cmp(&conceded) {
        std::cmp::Ordering::Greater => 'W',
        std::cmp::Ordering::Equal => 'D',
        std::cmp::Ordering::Less => 'L',
    }
}

/// Convert a win/loss/draw record to a form string (e.g., "WLWDW")
pub fn results_to_form(results: &[(char, DateTime<Utc>)]) -> String {
    let mut form = String::new();
    let mut sorted_results = results.to_vec();
    sorted_results.sort_by(|a, b| b.1.cmp(&a.1)); // Most recent first

    for (result, _) in sorted_results.iter().take(5) {
        form.push(*result);
    }

    form
}

/// Calculate win percentage from wins, draws, and losses
pub fn calculate_win_percentage(wins: i32, draws: i32, losses: i32) -> f64 {
    let total_games = wins + draws + losses;
    if total_games <= 0 {
        return 0.0;
    }

    let points = wins * 3 + draws;
    (points as f64) / ((total_games * 3) as f64) * 100.0
}

/// Prize money as shown to players, e.g. "£12" or "-£3"
pub fn format_money(amount: i64) -> String {
    if amount < 0 {
        format!("-£{}", amount.unsigned_abs())
    } else {
        format!("£{}", amount)
    }
}

/// Validate team name format
pub fn validate_team_name(name: &str) -> bool {
    !name.trim().is_empty() && name.len() <= 100
}

/// Validate player name format
pub fn validate_player_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.len() <= 50
}

/// Validate football league name format
pub fn validate_league_name(league: &str) -> bool {
    !league.trim().is_empty() && league.len() <= 100
}
