use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::economics::{
    self, EconomicsWarning, PercentBasis, PrizeModel, RoomEconomicsInput, RoomEconomicsResult,
};
use crate::errors::DraftError;
use crate::money::{round_cents, Currency};
use crate::payload::CreateRoomPayload;
use crate::rounds::{self, RoundConfig};

pub const DEFAULT_COMMISSION_PERCENT: f64 = 10.0;
pub const DEFAULT_TICKETS_BASE: u32 = 100;

const SCHEDULE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Ticket price and prize model of a draft. `Manual` rooms pay out a share
/// of the pot; both other modes advertise a fixed `prize_total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TicketPricing {
    Manual {
        ticket_price: f64,
    },
    /// Fixed prize with a hand-set price.
    FixedPrize {
        prize_total: f64,
        ticket_price: f64,
    },
    /// Fixed prize, price derived as `prize_total / tickets_base` rounded to cents.
    FromPrize {
        prize_total: f64,
        #[serde(default = "default_tickets_base")]
        tickets_base: u32,
    },
}

impl TicketPricing {
    pub fn prize_model(&self) -> PrizeModel {
        match self {
            TicketPricing::Manual { .. } => PrizeModel::Percent,
            TicketPricing::FixedPrize { .. } | TicketPricing::FromPrize { .. } => PrizeModel::Fixed,
        }
    }

    pub fn prize_total(&self) -> Option<f64> {
        match *self {
            TicketPricing::Manual { .. } => None,
            TicketPricing::FixedPrize { prize_total, .. }
            | TicketPricing::FromPrize { prize_total, .. } => Some(prize_total),
        }
    }
}

impl Default for TicketPricing {
    fn default() -> Self {
        TicketPricing::Manual { ticket_price: 0.0 }
    }
}

fn default_tickets_base() -> u32 {
    DEFAULT_TICKETS_BASE
}

/// Unsubmitted room-creation form state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDraft {
    pub name: String,
    pub currency: Currency,
    pub currency_id: Option<String>,
    pub pricing: TicketPricing,
    pub min_players: u32,
    pub max_tickets: Option<u32>,
    pub max_per_player: Option<u32>,
    pub commission_percent: f64,
    pub rounds: Vec<RoundConfig>,
    pub scheduled_at: Option<String>,
    pub is_public: bool,
    pub description: Option<String>,
}

impl Default for RoomDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            currency: Currency::default(),
            currency_id: None,
            pricing: TicketPricing::default(),
            min_players: 0,
            max_tickets: None,
            max_per_player: None,
            commission_percent: DEFAULT_COMMISSION_PERCENT,
            rounds: rounds::default_distribution(),
            scheduled_at: None,
            is_public: true,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnbalancedPolicy {
    #[default]
    Block,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    pub basis: PercentBasis,
    pub unbalanced: UnbalancedPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub payload: CreateRoomPayload,
    pub warnings: Vec<EconomicsWarning>,
}

impl RoomDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `None` when the from-prize inputs cannot produce a price yet.
    pub fn effective_ticket_price(&self) -> Option<f64> {
        match self.pricing {
            TicketPricing::Manual { ticket_price }
            | TicketPricing::FixedPrize { ticket_price, .. } => Some(ticket_price),
            TicketPricing::FromPrize { prize_total, tickets_base } => {
                if tickets_base == 0 || !prize_total.is_finite() || prize_total <= 0.0 {
                    return None;
                }
                Some(round_cents(prize_total / f64::from(tickets_base)))
            }
        }
    }

    pub fn reset_rounds(&mut self) {
        self.rounds = rounds::default_distribution();
    }

    pub fn economics_input(&self) -> Result<RoomEconomicsInput, DraftError> {
        let ticket_price = match self.pricing {
            TicketPricing::Manual { ticket_price } => ticket_price,
            TicketPricing::FixedPrize {
                prize_total,
                ticket_price,
            } => {
                if !prize_total.is_finite() || prize_total <= 0.0 {
                    return Err(DraftError::InvalidPrizeTotal);
                }
                ticket_price
            }
            TicketPricing::FromPrize { prize_total, tickets_base } => {
                if !prize_total.is_finite() || prize_total <= 0.0 {
                    return Err(DraftError::InvalidPrizeTotal);
                }
                if tickets_base == 0 {
                    return Err(DraftError::InvalidTicketsBase);
                }
                round_cents(prize_total / f64::from(tickets_base))
            }
        };
        Ok(RoomEconomicsInput {
            ticket_price,
            min_players: self.min_players,
            commission_percent: self.commission_percent,
            rounds: self.rounds.clone(),
        })
    }

    /// `basis` only applies to percent-model drafts; fixed prizes are always
    /// split by share of the prize.
    pub fn preview(&self, basis: PercentBasis) -> Result<RoomEconomicsResult, DraftError> {
        let input = self.economics_input()?;
        let result = match self.pricing.prize_total() {
            Some(prize_total) => economics::compute_fixed_prize(&input, prize_total)?,
            None => economics::compute_with_basis(&input, basis)?,
        };
        Ok(result)
    }

    pub fn prepare_submission(&self, policy: SubmissionPolicy) -> Result<Submission, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.max_tickets == Some(0) {
            return Err(DraftError::InvalidLimit { field: "max_tickets" });
        }
        if self.max_per_player == Some(0) {
            return Err(DraftError::InvalidLimit { field: "max_per_player" });
        }
        if let (Some(per_player), Some(max_tickets)) = (self.max_per_player, self.max_tickets) {
            if per_player > max_tickets {
                return Err(DraftError::PerPlayerAboveMax { per_player, max_tickets });
            }
        }
        let scheduled_at = self
            .scheduled_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_schedule)
            .transpose()?;

        let input = self.economics_input()?;
        let result = self.preview(policy.basis)?;
        // A fixed prize is paid in full whatever the split; only the percent
        // model needs its rounds to add up.
        if result.prize_model == PrizeModel::Percent
            && policy.unbalanced == UnbalancedPolicy::Block
            && !result.balance.is_balanced()
        {
            return Err(DraftError::UnbalancedRounds {
                sum: rounds::percent_sum(&input.rounds),
                target: policy.basis.target_sum(input.commission_percent),
            });
        }

        let payload = CreateRoomPayload {
            name: name.to_string(),
            price_per_card: input.ticket_price,
            min_players: input.min_players,
            max_rounds: input.rounds.len() as u32,
            currency: self.currency,
            currency_id: self.currency_id.clone(),
            commission_percent: input.commission_percent,
            prize_model: result.prize_model,
            prize_total: self.pricing.prize_total(),
            max_tickets: self.max_tickets,
            max_per_player: self.max_per_player,
            scheduled_at,
            is_public: self.is_public,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            rounds: CreateRoomPayload::rounds_from(&result),
        };
        Ok(Submission {
            payload,
            warnings: result.warnings,
        })
    }
}

fn parse_schedule(raw: &str) -> Result<String, DraftError> {
    SCHEDULE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .ok_or_else(|| DraftError::InvalidSchedule(raw.to_string()))
}
