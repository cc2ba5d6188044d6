use serde::{Deserialize, Serialize};

use crate::economics::{PrizeModel, RoomEconomicsInput, RoomEconomicsResult};
use crate::money::{round_cents, Currency};
use crate::pattern::PatternTag;
use crate::rounds::RoundConfig;

/// Body of the backend's room-creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomPayload {
    pub name: String,
    pub price_per_card: f64,
    pub min_players: u32,
    pub max_rounds: u32,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<String>,
    pub commission_percent: f64,
    #[serde(default)]
    pub prize_model: PrizeModel,
    /// Advertised prize; set only for the fixed model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tickets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_player: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rounds: Vec<RoundPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPayload {
    pub round: u32,
    pub pattern: PatternTag,
    pub percent: f64,
    pub prize_amount: f64,
}

impl CreateRoomPayload {
    pub fn rounds_from(result: &RoomEconomicsResult) -> Vec<RoundPayload> {
        result
            .per_round_prize
            .iter()
            .map(|r| RoundPayload {
                round: r.round,
                pattern: r.pattern,
                percent: r.percent,
                prize_amount: round_cents(r.amount),
            })
            .collect()
    }

    /// Calculator input this payload was built from, rounds in calling order.
    pub fn economics_input(&self) -> RoomEconomicsInput {
        let mut rounds: Vec<&RoundPayload> = self.rounds.iter().collect();
        rounds.sort_by_key(|r| r.round);
        RoomEconomicsInput {
            ticket_price: self.price_per_card,
            min_players: self.min_players,
            commission_percent: self.commission_percent,
            rounds: rounds
                .into_iter()
                .map(|r| RoundConfig::new(r.pattern, r.percent))
                .collect(),
        }
    }
}
