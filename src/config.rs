use std::env;

use crate::services::prize_money::{DEFAULT_JACKPOT_MULTIPLIER, DEFAULT_JACKPOT_TEAM};
use crate::services::PrizeMoneyCalculator;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:../data/prize_league.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const MAX_JACKPOT_MULTIPLIER: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Empty disables the jackpot rule.
    pub jackpot_team: String,
    pub jackpot_multiplier: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            jackpot_team: DEFAULT_JACKPOT_TEAM.to_string(),
            jackpot_multiplier: DEFAULT_JACKPOT_MULTIPLIER,
        }
    }
}

impl Config {
    /// Read settings from the environment (after `.env` has been loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", raw, e))?,
            None => defaults.port,
        };

        let jackpot_multiplier = match lookup("JACKPOT_MULTIPLIER") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("Invalid JACKPOT_MULTIPLIER '{}': {}", raw, e))?,
            None => defaults.jackpot_multiplier,
        };
        if !(1..=MAX_JACKPOT_MULTIPLIER).contains(&jackpot_multiplier) {
            anyhow::bail!(
                "JACKPOT_MULTIPLIER must be between 1 and {}, got {}",
                MAX_JACKPOT_MULTIPLIER,
                jackpot_multiplier
            );
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            port,
            jackpot_team: lookup("JACKPOT_TEAM").unwrap_or(defaults.jackpot_team),
            jackpot_multiplier,
        })
    }

    pub fn prize_calculator(&self) -> PrizeMoneyCalculator {
        PrizeMoneyCalculator::with_jackpot(&self.jackpot_team, self.jackpot_multiplier)
    }
}
