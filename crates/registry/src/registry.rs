use chrono::Utc;
use marketfeed_models::{
    Market, MarketStatus, Odds, OddsChangeEvent, RegistryError, Sport, ODDS_CHANGED,
};
use marketfeed_stream::EventBus;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Optional exact-match predicates, ANDed together when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketFilters {
    pub sport: Option<Sport>,
    pub status: Option<MarketStatus>,
}

/// Sole owner of the market collection.
///
/// All mutation goes through this type; each committed odds mutation is
/// published as an [`OddsChangeEvent`] on the `odds_changed` topic. Input
/// validation is the API layer's contract; the registry tolerates degenerate
/// input and stores it as given.
pub struct MarketRegistry {
    state: RwLock<RegistryState>,
    next_id: AtomicU64,
    bus: EventBus<OddsChangeEvent>,
}

#[derive(Default)]
struct RegistryState {
    markets: HashMap<String, Market>,
    // Creation order; enumeration must stay deterministic within a run.
    order: Vec<String>,
}

impl MarketRegistry {
    pub fn new(bus: EventBus<OddsChangeEvent>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            next_id: AtomicU64::new(1),
            bus,
        }
    }

    /// The bus this registry publishes change events on.
    pub fn bus(&self) -> &EventBus<OddsChangeEvent> {
        &self.bus
    }

    fn generate_id(&self) -> String {
        format!("mkt_{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Store a new market with a fresh id, `Open` status and a current
    /// timestamp, and return a copy of it.
    pub fn create_market(&self, sport: Sport, event_id: String, odds: Odds) -> Market {
        let market = Market {
            id: self.generate_id(),
            sport,
            event_id,
            status: MarketStatus::Open,
            odds,
            updated_at: Utc::now(),
        };

        let mut state = self.state.write();
        state.order.push(market.id.clone());
        state.markets.insert(market.id.clone(), market.clone());
        drop(state);

        info!(market_id = %market.id, sport = %market.sport, "market created");
        market
    }

    /// Point lookup. No side effects.
    pub fn get_market(&self, id: &str) -> Option<Market> {
        self.state.read().markets.get(id).cloned()
    }

    /// All markets matching `filters`, in creation order. With no filters
    /// set, every market is returned.
    pub fn filter_markets(&self, filters: &MarketFilters) -> Vec<Market> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|id| state.markets.get(id))
            .filter(|m| filters.sport.map_or(true, |s| m.sport == s))
            .filter(|m| filters.status.map_or(true, |s| m.status == s))
            .cloned()
            .collect()
    }

    /// Replace a market's odds and publish exactly one change event carrying
    /// the before/after snapshots.
    ///
    /// The event is published while the write lock is still held: publishing
    /// is non-blocking, subscribers only ever see committed state, and
    /// per-market event order matches mutation order.
    pub fn update_odds(&self, id: &str, new_odds: Odds) -> Result<Market, RegistryError> {
        let mut state = self.state.write();
        let Some(market) = state.markets.get_mut(id) else {
            return Err(RegistryError::MarketNotFound {
                market_id: id.to_string(),
            });
        };

        let previous_odds = std::mem::replace(&mut market.odds, new_odds);
        // Non-decreasing even if the wall clock steps backwards.
        market.updated_at = market.updated_at.max(Utc::now());
        let updated = market.clone();

        self.bus.publish(
            ODDS_CHANGED,
            OddsChangeEvent {
                market_id: updated.id.clone(),
                previous_odds,
                new_odds: updated.odds.clone(),
                updated_at: updated.updated_at,
            },
        );

        debug!(market_id = %updated.id, "odds updated");
        Ok(updated)
    }

    pub fn market_count(&self) -> usize {
        self.state.read().markets.len()
    }

    /// Drop every stored market. Test isolation only; the id counter keeps
    /// running so ids stay unique for the process lifetime.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.markets.clear();
        state.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn two_way_odds(a: f64, b: f64) -> Odds {
        let mut odds = Odds::new();
        odds.insert(
            "home".to_string(),
            rust_decimal::Decimal::try_from(a).unwrap(),
        );
        odds.insert(
            "away".to_string(),
            rust_decimal::Decimal::try_from(b).unwrap(),
        );
        odds
    }

    fn test_registry() -> MarketRegistry {
        MarketRegistry::new(EventBus::default())
    }

    #[test]
    fn test_ids_are_sequential_tokens() {
        let registry = test_registry();
        let first = registry.create_market(Sport::Football, "evt_1".into(), two_way_odds(1.5, 2.5));
        let second = registry.create_market(Sport::Tennis, "evt_2".into(), two_way_odds(1.8, 2.0));

        assert_eq!(first.id, "mkt_1");
        assert_eq!(second.id, "mkt_2");
    }

    #[test]
    fn test_update_publishes_on_bus() {
        let registry = test_registry();
        let mut sub = registry.bus().subscribe(ODDS_CHANGED);
        let market =
            registry.create_market(Sport::Football, "evt_1".into(), two_way_odds(1.5, 2.5));

        registry
            .update_odds(&market.id, two_way_odds(1.8, 2.2))
            .unwrap();

        let event = sub.try_recv().unwrap();
        assert_eq!(event.market_id, market.id);
        assert_eq!(event.previous_odds["home"], dec!(1.5));
        assert_eq!(event.new_odds["home"], dec!(1.8));
    }

    #[test]
    fn test_degenerate_odds_stored_as_given() {
        // Validation lives in the API layer; the registry must not reject
        // or panic on input that slipped past it.
        let registry = test_registry();
        let market = registry.create_market(Sport::Tennis, "evt_1".into(), Odds::new());

        assert!(market.odds.is_empty());
        assert_eq!(registry.get_market(&market.id).unwrap().odds, Odds::new());
    }

    #[test]
    fn test_clear_keeps_id_counter_running() {
        let registry = test_registry();
        registry.create_market(Sport::Football, "evt_1".into(), two_way_odds(1.5, 2.5));
        registry.clear();

        assert_eq!(registry.market_count(), 0);
        let next = registry.create_market(Sport::Football, "evt_2".into(), two_way_odds(1.5, 2.5));
        assert_eq!(next.id, "mkt_2");
    }

    proptest! {
        #[test]
        fn prop_filter_partitions_markets(sport_indices in proptest::collection::vec(0usize..4, 1..24)) {
            let registry = test_registry();
            for (i, idx) in sport_indices.iter().enumerate() {
                registry.create_market(
                    Sport::ALL[*idx],
                    format!("evt_{i}"),
                    two_way_odds(1.5, 2.5),
                );
            }

            // No filters: every market exactly once, unique ids.
            let all = registry.filter_markets(&MarketFilters::default());
            prop_assert_eq!(all.len(), sport_indices.len());
            let unique: std::collections::HashSet<&str> =
                all.iter().map(|m| m.id.as_str()).collect();
            prop_assert_eq!(unique.len(), all.len());

            // Sport filters partition the collection.
            let mut total = 0;
            for sport in Sport::ALL {
                let subset = registry.filter_markets(&MarketFilters {
                    sport: Some(sport),
                    status: None,
                });
                prop_assert!(subset.iter().all(|m| m.sport == sport));
                total += subset.len();
            }
            prop_assert_eq!(total, all.len());
        }
    }
}
