pub mod career;
pub mod league_service;
pub mod prize_money;
pub mod standings;

pub use league_service::*;
pub use prize_money::PrizeMoneyCalculator;
pub use standings::*;
