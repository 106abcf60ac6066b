//! Configuration for the detection engine.

use crate::error::ConfigError;
use chrono::TimeDelta;
use fnv::FnvHashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use surebet_instrument::BookmakerId;

/// Longest accepted opportunity TTL (one week).
pub const MAX_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Engine-wide configuration.
///
/// `total_stake` is not part of the configuration; it is supplied per detection cycle.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds an opportunity stays valid after its last detection.
    pub ttl_seconds: u64,
    /// Minimum profit (in percent) for opportunities returned by threshold queries.
    pub min_profit_percent: f64,
    /// Maximum selections per outcome group before the enumerator truncates it.
    pub enumeration_cap_per_outcome_group: usize,
    /// Decimal places of the staking currency's minimum unit (2 = cents).
    pub stake_decimal_places: u32,
    /// Accepted odds range for bookmakers without an override.
    pub odds_bounds: OddsBounds,
    /// Per-bookmaker odds limits and commission.
    pub bookmakers: FnvHashMap<BookmakerId, BookmakerOverrides>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 30,
            min_profit_percent: 0.0,
            enumeration_cap_per_outcome_group: 12,
            stake_decimal_places: 2,
            odds_bounds: OddsBounds::default(),
            bookmakers: FnvHashMap::default(),
        }
    }
}

/// Inclusive range of decimal odds a bookmaker is allowed to quote.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OddsBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for OddsBounds {
    fn default() -> Self {
        Self {
            min: 1.01,
            max: 1000.0,
        }
    }
}

impl OddsBounds {
    pub fn contains(&self, odds: f64) -> bool {
        odds >= self.min && odds <= self.max
    }
}

/// Settings that differ for one bookmaker.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BookmakerOverrides {
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    /// Commission charged on net winnings, eg/ 0.05 for a 5% exchange.
    pub commission: Option<Decimal>,
}

impl EngineConfig {
    /// Create from `SUREBET_*` environment variables, falling back to defaults:
    /// - `SUREBET_TTL_SECONDS` (default: 30)
    /// - `SUREBET_MIN_PROFIT_PERCENT` (default: 0)
    /// - `SUREBET_ENUMERATION_CAP` (default: 12)
    /// - `SUREBET_STAKE_DECIMAL_PLACES` (default: 2)
    /// - `SUREBET_MIN_ODDS` / `SUREBET_MAX_ODDS` (default: 1.01 / 1000)
    /// - `SUREBET_BOOKMAKERS`: JSON object of [`BookmakerOverrides`] keyed by bookmaker id
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ttl) = parse(&lookup, "SUREBET_TTL_SECONDS")? {
            config.ttl_seconds = ttl;
        }
        if let Some(min_profit) = parse(&lookup, "SUREBET_MIN_PROFIT_PERCENT")? {
            config.min_profit_percent = min_profit;
        }
        if let Some(cap) = parse(&lookup, "SUREBET_ENUMERATION_CAP")? {
            config.enumeration_cap_per_outcome_group = cap;
        }
        if let Some(places) = parse(&lookup, "SUREBET_STAKE_DECIMAL_PLACES")? {
            config.stake_decimal_places = places;
        }
        if let Some(min) = parse(&lookup, "SUREBET_MIN_ODDS")? {
            config.odds_bounds.min = min;
        }
        if let Some(max) = parse(&lookup, "SUREBET_MAX_ODDS")? {
            config.odds_bounds.max = max;
        }
        if let Some(json) = lookup("SUREBET_BOOKMAKERS") {
            config.bookmakers = serde_json::from_str(&json)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "ttl_seconds {} exceeds {MAX_TTL_SECONDS}",
                self.ttl_seconds
            )));
        }
        if self.enumeration_cap_per_outcome_group == 0 {
            return Err(ConfigError::Invalid(
                "enumeration_cap_per_outcome_group must be at least 1".to_string(),
            ));
        }
        if self.stake_decimal_places > 10 {
            return Err(ConfigError::Invalid(format!(
                "stake_decimal_places {} exceeds 10",
                self.stake_decimal_places
            )));
        }
        if !self.min_profit_percent.is_finite() {
            return Err(ConfigError::Invalid(
                "min_profit_percent must be finite".to_string(),
            ));
        }
        check_bounds("default", &self.odds_bounds)?;

        for (bookmaker, overrides) in &self.bookmakers {
            check_bounds(bookmaker.as_str(), &self.bounds_for(bookmaker))?;
            if let Some(commission) = overrides.commission {
                if commission < Decimal::ZERO || commission >= Decimal::ONE {
                    return Err(ConfigError::Invalid(format!(
                        "{bookmaker} commission {commission} outside [0, 1)"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Opportunity TTL, saturating at [`TimeDelta::MAX`] for values `validate` would reject.
    pub fn ttl(&self) -> TimeDelta {
        i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Odds bounds for `bookmaker`, with any override applied over the defaults.
    pub fn bounds_for(&self, bookmaker: &BookmakerId) -> OddsBounds {
        match self.bookmakers.get(bookmaker) {
            Some(overrides) => OddsBounds {
                min: overrides.min_odds.unwrap_or(self.odds_bounds.min),
                max: overrides.max_odds.unwrap_or(self.odds_bounds.max),
            },
            None => self.odds_bounds,
        }
    }

    pub fn commission_for(&self, bookmaker: &BookmakerId) -> Option<Decimal> {
        self.bookmakers
            .get(bookmaker)
            .and_then(|overrides| overrides.commission)
            .filter(|commission| !commission.is_zero())
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse { key, value })
        })
        .transpose()
}

fn check_bounds(label: &str, bounds: &OddsBounds) -> Result<(), ConfigError> {
    if !(bounds.min > 1.0 && bounds.min.is_finite() && bounds.max.is_finite())
        || bounds.max < bounds.min
    {
        return Err(ConfigError::Invalid(format!(
            "{label} odds bounds [{}, {}] invalid",
            bounds.min, bounds.max
        )));
    }
    Ok(())
}
