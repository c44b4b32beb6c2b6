use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ParseMarketStatusError, ParseSportError};

/// Decimal price keyed by selection name.
///
/// A `BTreeMap` keeps snapshots and serialized output in a stable key order,
/// which matters when odds maps are compared in change events.
pub type Odds = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Football,
    Tennis,
    Basketball,
    HorseRacing,
}

impl Sport {
    pub const ALL: [Self; 4] = [
        Self::Football,
        Self::Tennis,
        Self::Basketball,
        Self::HorseRacing,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Football => "football",
            Self::Tennis => "tennis",
            Self::Basketball => "basketball",
            Self::HorseRacing => "horse_racing",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = ParseSportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "football" => Ok(Self::Football),
            "tennis" => Ok(Self::Tennis),
            "basketball" => Ok(Self::Basketball),
            "horse_racing" => Ok(Self::HorseRacing),
            other => Err(ParseSportError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Open,
    Suspended,
    Closed,
}

impl MarketStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = ParseMarketStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "suspended" => Ok(Self::Suspended),
            "closed" => Ok(Self::Closed),
            other => Err(ParseMarketStatusError(other.to_string())),
        }
    }
}

/// A single bettable event context: sport, external event reference,
/// lifecycle status and the current price per selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub sport: Sport,
    pub event_id: String,
    pub status: MarketStatus,
    pub odds: Odds,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    pub fn is_open(&self) -> bool {
        matches!(self.status, MarketStatus::Open)
    }
}
