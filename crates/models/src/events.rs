use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::Odds;

/// Topic under which the registry publishes odds mutations.
pub const ODDS_CHANGED: &str = "odds_changed";

/// Change record emitted once per odds mutation.
///
/// Carries the odds map as it was immediately before the mutation and the
/// map that replaced it. Not persisted anywhere; it lives only for the
/// duration of delivery to the subscribers active at emission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OddsChangeEvent {
    pub market_id: String,
    pub previous_odds: Odds,
    pub new_odds: Odds,
    pub updated_at: DateTime<Utc>,
}
