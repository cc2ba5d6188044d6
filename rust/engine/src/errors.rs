use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EconomicsError {
    #[error("Invalid ticket price: {0}, must be greater than 0")]
    InvalidTicketPrice(f64),
    #[error("Invalid minimum players: must be greater than 0")]
    InvalidMinPlayers,
    #[error("Invalid commission: {0}%, must be within 0..=100")]
    CommissionOutOfRange(f64),
    #[error("Room needs at least one round")]
    NoRounds,
    #[error("Invalid percent {percent} for round {round}")]
    InvalidRoundPercent { round: usize, percent: f64 },
    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),
    #[error("Invalid round spec '{0}', expected pattern:percent")]
    InvalidRoundSpec(String),
    #[error("Invalid prize total: {0}, must be greater than 0")]
    InvalidPrizeTotal(f64),
    #[error("Base pot overflows: {min_players} players at {ticket_price} per ticket")]
    PotOverflow { min_players: u32, ticket_price: f64 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DraftError {
    #[error("Room name is required")]
    MissingName,
    #[error("Prize total must be greater than 0")]
    InvalidPrizeTotal,
    #[error("Tickets base must be greater than 0")]
    InvalidTicketsBase,
    #[error("Invalid limit: {field} must be greater than 0")]
    InvalidLimit { field: &'static str },
    #[error("Per-player limit {per_player} exceeds max tickets {max_tickets}")]
    PerPlayerAboveMax { per_player: u32, max_tickets: u32 },
    #[error("Invalid scheduled_at '{0}', expected YYYY-MM-DDTHH:MM")]
    InvalidSchedule(String),
    #[error("Round percentages sum to {sum}%, expected {target}%")]
    UnbalancedRounds { sum: f64, target: f64 },
    #[error(transparent)]
    Economics(#[from] EconomicsError),
}
