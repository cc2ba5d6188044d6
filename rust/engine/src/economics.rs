//! Room economics: how a room's pot splits into house cut and round prizes.
//!
//! Everything here is a preview. Amounts are `f64` and only rounded for
//! display; the backend recomputes and persists the real figures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EconomicsError;
use crate::money::round_cents;
use crate::pattern::PatternTag;
use crate::rounds::{self, RoundBalance, RoundConfig, PERCENT_TOTAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEconomicsInput {
    pub ticket_price: f64,
    pub min_players: u32,
    pub commission_percent: f64,
    pub rounds: Vec<RoundConfig>,
}

impl RoomEconomicsInput {
    pub fn validate(&self) -> Result<(), EconomicsError> {
        if !self.ticket_price.is_finite() || self.ticket_price <= 0.0 {
            return Err(EconomicsError::InvalidTicketPrice(self.ticket_price));
        }
        if self.min_players == 0 {
            return Err(EconomicsError::InvalidMinPlayers);
        }
        if !self.commission_percent.is_finite()
            || !(0.0..=PERCENT_TOTAL).contains(&self.commission_percent)
        {
            return Err(EconomicsError::CommissionOutOfRange(self.commission_percent));
        }
        rounds::validate_rounds(&self.rounds)
    }
}

/// What a round's percentage is a share of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentBasis {
    /// Share of the pot left after commission; rounds should add up to 100.
    #[default]
    PrizePool,
    /// Share of the whole pot; rounds should add up to `100 - commission`.
    RawPot,
}

impl PercentBasis {
    pub fn target_sum(&self, commission_percent: f64) -> f64 {
        match self {
            PercentBasis::PrizePool => PERCENT_TOTAL,
            PercentBasis::RawPot => PERCENT_TOTAL - commission_percent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PercentBasis::PrizePool => "prize_pool",
            PercentBasis::RawPot => "raw_pot",
        }
    }
}

impl FromStr for PercentBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "prize_pool" | "pool" => Ok(PercentBasis::PrizePool),
            "raw_pot" | "pot" => Ok(PercentBasis::RawPot),
            other => Err(format!("unknown percent basis: {}", other)),
        }
    }
}

/// How the prize pool is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeModel {
    /// Pool is what the pot leaves after commission.
    #[default]
    Percent,
    /// Pool is an advertised total; the house keeps whatever the pot adds
    /// above it.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EconomicsWarning {
    UnbalancedRounds { sum: f64, target: f64 },
    PrizeExceedsPot { prize_total: f64, base_pot: f64 },
}

impl fmt::Display for EconomicsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EconomicsWarning::UnbalancedRounds { sum, target } => {
                write!(f, "round percentages sum to {}%, expected {}%", sum, target)
            }
            EconomicsWarning::PrizeExceedsPot { prize_total, base_pot } => write!(
                f,
                "fixed prize {} is more than the minimum pot {}",
                prize_total, base_pot
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPrize {
    /// 1-based position in calling order.
    pub round: u32,
    pub pattern: PatternTag,
    pub percent: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEconomicsResult {
    #[serde(default)]
    pub prize_model: PrizeModel,
    pub basis: PercentBasis,
    pub base_pot: f64,
    pub house_cut: f64,
    pub prize_pool: f64,
    pub per_round_prize: Vec<RoundPrize>,
    pub balance: RoundBalance,
    #[serde(default)]
    pub warnings: Vec<EconomicsWarning>,
}

impl RoomEconomicsResult {
    pub fn prize_amounts(&self) -> Vec<f64> {
        self.per_round_prize.iter().map(|r| r.amount).collect()
    }

    pub fn distributed(&self) -> f64 {
        self.per_round_prize.iter().map(|r| r.amount).sum()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Copy with every monetary amount rounded to cents.
    pub fn for_display(&self) -> Self {
        let mut out = self.clone();
        out.base_pot = round_cents(out.base_pot);
        out.house_cut = round_cents(out.house_cut);
        out.prize_pool = round_cents(out.prize_pool);
        for r in &mut out.per_round_prize {
            r.amount = round_cents(r.amount);
        }
        out
    }
}

pub fn compute(input: &RoomEconomicsInput) -> Result<RoomEconomicsResult, EconomicsError> {
    compute_with_basis(input, PercentBasis::PrizePool)
}

pub fn compute_with_basis(
    input: &RoomEconomicsInput,
    basis: PercentBasis,
) -> Result<RoomEconomicsResult, EconomicsError> {
    input.validate()?;

    let base_pot = base_pot(input)?;
    // Scale by the fraction so pots near f64::MAX stay finite.
    let house_cut = base_pot * (input.commission_percent / PERCENT_TOTAL);
    let prize_pool = base_pot - house_cut;
    let share_of = match basis {
        PercentBasis::PrizePool => prize_pool,
        PercentBasis::RawPot => base_pot,
    };

    let per_round_prize = round_prizes(&input.rounds, share_of);
    let target = basis.target_sum(input.commission_percent);
    let (balance, warnings) = check_balance(&input.rounds, target);

    Ok(RoomEconomicsResult {
        prize_model: PrizeModel::Percent,
        basis,
        base_pot,
        house_cut,
        prize_pool,
        per_round_prize,
        balance,
        warnings,
    })
}

/// Fixed-prize model: the rounds split `prize_total` instead of the pot.
///
/// `house_cut` is `base_pot - prize_total` and goes negative when the
/// minimum pot cannot cover the prize, which is reported as a warning.
/// The commission is validated but does not enter the split. Percents are
/// always shares of the prize, so the balance target is 100.
pub fn compute_fixed_prize(
    input: &RoomEconomicsInput,
    prize_total: f64,
) -> Result<RoomEconomicsResult, EconomicsError> {
    input.validate()?;
    if !prize_total.is_finite() || prize_total <= 0.0 {
        return Err(EconomicsError::InvalidPrizeTotal(prize_total));
    }

    let base_pot = base_pot(input)?;
    let per_round_prize = round_prizes(&input.rounds, prize_total);
    let (balance, mut warnings) = check_balance(&input.rounds, PERCENT_TOTAL);
    if prize_total > base_pot {
        warnings.push(EconomicsWarning::PrizeExceedsPot {
            prize_total,
            base_pot,
        });
    }

    Ok(RoomEconomicsResult {
        prize_model: PrizeModel::Fixed,
        basis: PercentBasis::PrizePool,
        base_pot,
        house_cut: base_pot - prize_total,
        prize_pool: prize_total,
        per_round_prize,
        balance,
        warnings,
    })
}

fn base_pot(input: &RoomEconomicsInput) -> Result<f64, EconomicsError> {
    let pot = f64::from(input.min_players) * input.ticket_price;
    if !pot.is_finite() {
        return Err(EconomicsError::PotOverflow {
            min_players: input.min_players,
            ticket_price: input.ticket_price,
        });
    }
    Ok(pot)
}

fn round_prizes(rounds: &[RoundConfig], share_of: f64) -> Vec<RoundPrize> {
    rounds
        .iter()
        .enumerate()
        .map(|(idx, r)| RoundPrize {
            round: idx as u32 + 1,
            pattern: r.pattern,
            percent: r.percent,
            amount: share_of * (r.percent / PERCENT_TOTAL),
        })
        .collect()
}

fn check_balance(rounds: &[RoundConfig], target: f64) -> (RoundBalance, Vec<EconomicsWarning>) {
    let balance = rounds::balance(rounds, target);
    let mut warnings = Vec::new();
    if !balance.is_balanced() {
        warnings.push(EconomicsWarning::UnbalancedRounds {
            sum: rounds::percent_sum(rounds),
            target,
        });
    }
    (balance, warnings)
}
