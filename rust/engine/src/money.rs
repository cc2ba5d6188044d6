use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rounds to 2 decimals. Display only; the backend keeps the authoritative decimals.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    Bs,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Bs => "VES",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Bs => "Bs",
            Currency::Usd => "$",
        }
    }

    pub fn format(&self, amount: f64) -> String {
        match self {
            Currency::Bs => format!("Bs {:.2}", round_cents(amount)),
            Currency::Usd => format!("${:.2}", round_cents(amount)),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Bs => f.write_str("Bs"),
            Currency::Usd => f.write_str("USD"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BS" | "VES" => Ok(Currency::Bs),
            "USD" | "$" => Ok(Currency::Usd),
            other => Err(format!("unknown currency: {}", other)),
        }
    }
}
