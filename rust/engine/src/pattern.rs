use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EconomicsError;

/// Winning condition a round is played for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    Horizontal,
    Vertical,
    Diagonal,
    SmallCross,
    BigCross,
    #[serde(alias = "full")]
    FullCard,
    Random,
}

impl PatternTag {
    pub const ALL: [PatternTag; 7] = [
        PatternTag::Horizontal,
        PatternTag::Vertical,
        PatternTag::Diagonal,
        PatternTag::SmallCross,
        PatternTag::BigCross,
        PatternTag::FullCard,
        PatternTag::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::Horizontal => "horizontal",
            PatternTag::Vertical => "vertical",
            PatternTag::Diagonal => "diagonal",
            PatternTag::SmallCross => "small_cross",
            PatternTag::BigCross => "big_cross",
            PatternTag::FullCard => "full_card",
            PatternTag::Random => "random",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternTag::Horizontal => "Horizontal line",
            PatternTag::Vertical => "Vertical line",
            PatternTag::Diagonal => "Diagonal line",
            PatternTag::SmallCross => "Small cross",
            PatternTag::BigCross => "Big cross",
            PatternTag::FullCard => "Full card",
            PatternTag::Random => "Random pattern",
        }
    }
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternTag {
    type Err = EconomicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('-', "_");
        if norm == "full" {
            return Ok(PatternTag::FullCard);
        }
        PatternTag::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == norm)
            .ok_or_else(|| EconomicsError::UnknownPattern(s.to_string()))
    }
}
