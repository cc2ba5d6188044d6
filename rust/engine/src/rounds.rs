use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::EconomicsError;
use crate::pattern::PatternTag;

pub const PERCENT_TOTAL: f64 = 100.0;
pub const SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub pattern: PatternTag,
    pub percent: f64,
}

impl RoundConfig {
    pub fn new(pattern: PatternTag, percent: f64) -> Self {
        Self { pattern, percent }
    }
}

/// Parses `pattern:percent`, e.g. `horizontal:40`.
impl FromStr for RoundConfig {
    type Err = EconomicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pattern, percent) = s
            .split_once(':')
            .ok_or_else(|| EconomicsError::InvalidRoundSpec(s.to_string()))?;
        let pattern: PatternTag = pattern.parse()?;
        let percent: f64 = percent
            .trim()
            .parse()
            .map_err(|_| EconomicsError::InvalidRoundSpec(s.to_string()))?;
        Ok(Self { pattern, percent })
    }
}

pub fn default_distribution() -> Vec<RoundConfig> {
    vec![
        RoundConfig::new(PatternTag::Horizontal, 15.0),
        RoundConfig::new(PatternTag::Vertical, 15.0),
        RoundConfig::new(PatternTag::Diagonal, 20.0),
        RoundConfig::new(PatternTag::FullCard, 50.0),
    ]
}

pub fn percent_sum(rounds: &[RoundConfig]) -> f64 {
    rounds.iter().map(|r| r.percent).sum()
}

/// How a set of round percentages compares to the share it should cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundBalance {
    Balanced,
    Shortfall { missing: f64 },
    Excess { over: f64 },
}

impl RoundBalance {
    pub fn is_balanced(&self) -> bool {
        matches!(self, RoundBalance::Balanced)
    }
}

pub fn balance(rounds: &[RoundConfig], target: f64) -> RoundBalance {
    let diff = percent_sum(rounds) - target;
    if diff.abs() <= SUM_TOLERANCE {
        RoundBalance::Balanced
    } else if diff < 0.0 {
        RoundBalance::Shortfall { missing: -diff }
    } else {
        RoundBalance::Excess { over: diff }
    }
}

pub(crate) fn validate_rounds(rounds: &[RoundConfig]) -> Result<(), EconomicsError> {
    if rounds.is_empty() {
        return Err(EconomicsError::NoRounds);
    }
    for (idx, r) in rounds.iter().enumerate() {
        if !r.percent.is_finite() || r.percent < 0.0 {
            return Err(EconomicsError::InvalidRoundPercent { round: idx + 1, percent: r.percent });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_distribution_is_balanced() {
        assert_eq!(percent_sum(&default_distribution()), 100.0);
        assert!(balance(&default_distribution(), PERCENT_TOTAL).is_balanced());
    }

    #[test]
    fn parses_round_spec() {
        let r: RoundConfig = "vertical:30".parse().unwrap();
        assert_eq!(r, RoundConfig::new(PatternTag::Vertical, 30.0));
        assert!(matches!(
            "vertical".parse::<RoundConfig>(),
            Err(EconomicsError::InvalidRoundSpec(_))
        ));
        assert!(matches!(
            "vertical:abc".parse::<RoundConfig>(),
            Err(EconomicsError::InvalidRoundSpec(_))
        ));
    }

    #[test]
    fn reports_shortfall_and_excess() {
        let rounds = vec![RoundConfig::new(PatternTag::FullCard, 90.0)];
        assert_eq!(balance(&rounds, 100.0), RoundBalance::Shortfall { missing: 10.0 });
        assert_eq!(balance(&rounds, 80.0), RoundBalance::Excess { over: 10.0 });
    }

    #[test]
    fn rejects_negative_percent() {
        let rounds = vec![
            RoundConfig::new(PatternTag::Horizontal, 50.0),
            RoundConfig::new(PatternTag::Vertical, -5.0),
        ];
        assert_eq!(
            validate_rounds(&rounds),
            Err(EconomicsError::InvalidRoundPercent { round: 2, percent: -5.0 })
        );
    }
}
