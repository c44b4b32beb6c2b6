//! Request validation for the market endpoints.
//!
//! The registry trusts its callers, so every field constraint is enforced
//! here, before anything reaches it. Failures come back as a list of
//! `{field, message}` pairs for the 400 response body.

use marketfeed_models::{MarketStatus, Odds, Sport};
use marketfeed_registry::MarketFilters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Raw `POST /markets` body. Fields stay loosely typed so that missing and
/// malformed values produce field errors instead of a deserialization
/// failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketRequest {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub odds: Option<Map<String, Value>>,
}

/// Raw `POST /markets/:id/odds` body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOddsRequest {
    #[serde(default)]
    pub odds: Option<Map<String, Value>>,
}

/// Query parameters accepted by `GET /markets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketFilterParams {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A `CreateMarketRequest` that passed validation, with all fields parsed.
#[derive(Debug, Clone)]
pub struct ValidCreateMarket {
    pub sport: Sport,
    pub event_id: String,
    pub odds: Odds,
}

fn sport_options() -> String {
    Sport::ALL.map(Sport::as_str).join(", ")
}

pub fn validate_create_market(
    request: &CreateMarketRequest,
) -> Result<ValidCreateMarket, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let sport = match request.sport.as_deref() {
        None | Some("") => {
            errors.push(ValidationError::new("sport", "Sport is required"));
            None
        }
        Some(raw) => match raw.parse::<Sport>() {
            Ok(sport) => Some(sport),
            Err(_) => {
                errors.push(ValidationError::new(
                    "sport",
                    format!("Invalid sport. Must be one of: {}", sport_options()),
                ));
                None
            }
        },
    };

    let event_id = match request.event_id.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(ValidationError::new("eventId", "Event ID is required"));
            None
        }
        Some(trimmed) => Some(trimmed.to_string()),
    };

    let odds = validate_odds_map(request.odds.as_ref(), &mut errors);

    match (sport, event_id, odds) {
        (Some(sport), Some(event_id), Some(odds)) if errors.is_empty() => Ok(ValidCreateMarket {
            sport,
            event_id,
            odds,
        }),
        _ => Err(errors),
    }
}

pub fn validate_update_odds(request: &UpdateOddsRequest) -> Result<Odds, Vec<ValidationError>> {
    let mut errors = Vec::new();
    match validate_odds_map(request.odds.as_ref(), &mut errors) {
        Some(odds) if errors.is_empty() => Ok(odds),
        _ => Err(errors),
    }
}

pub fn validate_filters(params: &MarketFilterParams) -> Result<MarketFilters, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut filters = MarketFilters::default();

    if let Some(raw) = params.sport.as_deref() {
        match raw.parse::<Sport>() {
            Ok(sport) => filters.sport = Some(sport),
            Err(_) => errors.push(ValidationError::new(
                "sport",
                format!("Invalid sport. Must be one of: {}", sport_options()),
            )),
        }
    }
    if let Some(raw) = params.status.as_deref() {
        match raw.parse::<MarketStatus>() {
            Ok(status) => filters.status = Some(status),
            Err(_) => errors.push(ValidationError::new(
                "status",
                "Invalid status. Must be one of: open, suspended, closed",
            )),
        }
    }

    if errors.is_empty() {
        Ok(filters)
    } else {
        Err(errors)
    }
}

/// Shared odds-map rules: present, at least two selections, every price a
/// number strictly greater than 1.0 (strict comparison at the boundary).
fn validate_odds_map(
    odds: Option<&Map<String, Value>>,
    errors: &mut Vec<ValidationError>,
) -> Option<Odds> {
    let Some(map) = odds else {
        errors.push(ValidationError::new("odds", "Odds are required"));
        return None;
    };
    let before = errors.len();

    if map.len() < 2 {
        errors.push(ValidationError::new(
            "odds",
            "At least two selections are required",
        ));
    }

    let mut parsed = Odds::new();
    for (selection, value) in map {
        let price = value.as_f64().filter(|v| *v > 1.0);
        match price.and_then(|v| Decimal::try_from(v).ok()) {
            Some(price) => {
                parsed.insert(selection.clone(), price);
            }
            None => errors.push(ValidationError::new(
                format!("odds.{selection}"),
                "Odds must be a number greater than 1",
            )),
        }
    }

    if errors.len() == before {
        Some(parsed)
    } else {
        None
    }
}
