use bgo_engine::economics::PercentBasis;
use bgo_engine::money::Currency;
use bgo_engine::room::{SubmissionPolicy, UnbalancedPolicy, DEFAULT_COMMISSION_PERCENT};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub currency: Currency,
    pub commission_percent: f64,
    pub basis: PercentBasis,
    pub block_unbalanced: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Currency::Bs,
            commission_percent: DEFAULT_COMMISSION_PERCENT,
            basis: PercentBasis::PrizePool,
            block_unbalanced: true,
        }
    }
}

impl Config {
    pub fn policy(&self) -> SubmissionPolicy {
        SubmissionPolicy {
            basis: self.basis,
            unbalanced: if self.block_unbalanced {
                UnbalancedPolicy::Block
            } else {
                UnbalancedPolicy::Warn
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Defaults, then the TOML file named by `BGO_CONFIG`, then `BGO_*` variables.
pub fn load_from<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let mut cfg = Config::default();

    if let Some(path) = get("BGO_CONFIG") {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.currency {
            cfg.currency = v;
        }
        if let Some(v) = f.commission_percent {
            cfg.commission_percent = v;
        }
        if let Some(v) = f.basis {
            cfg.basis = v;
        }
        if let Some(v) = f.block_unbalanced {
            cfg.block_unbalanced = v;
        }
    }

    if let Some(cur) = get("BGO_CURRENCY") {
        cfg.currency = cur.parse().map_err(ConfigError::Invalid)?;
    }
    if let Some(c) = get("BGO_COMMISSION") {
        cfg.commission_percent = c
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid commission".into()))?;
    }
    if let Some(b) = get("BGO_PERCENT_BASIS") {
        cfg.basis = b.parse().map_err(ConfigError::Invalid)?;
    }
    if let Some(b) = get("BGO_BLOCK_UNBALANCED") {
        cfg.block_unbalanced = parse_bool(&b)
            .ok_or_else(|| ConfigError::Invalid("Invalid block_unbalanced".into()))?;
    }

    validate(&cfg)?;
    Ok(cfg)
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    currency: Option<Currency>,
    #[serde(default)]
    commission_percent: Option<f64>,
    #[serde(default)]
    basis: Option<PercentBasis>,
    #[serde(default)]
    block_unbalanced: Option<bool>,
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !cfg.commission_percent.is_finite() || !(0.0..=100.0).contains(&cfg.commission_percent) {
        return Err(ConfigError::Invalid(
            "Invalid configuration: commission_percent must be within 0..=100".into(),
        ));
    }
    Ok(())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
