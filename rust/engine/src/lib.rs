//! bgo-engine: room economics preview for bingo rooms

pub mod economics;
pub mod errors;
pub mod logger;
pub mod money;
pub mod pattern;
pub mod payload;
pub mod room;
pub mod rounds;

pub use economics::{
    compute, compute_fixed_prize, compute_with_basis, PercentBasis, PrizeModel, RoomEconomicsInput,
    RoomEconomicsResult,
};
pub use errors::{DraftError, EconomicsError};
pub use pattern::PatternTag;
pub use rounds::RoundConfig;
