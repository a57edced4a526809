// ═══════════════════════════════════════════════════════════════════
// Store Tests — MarketStore, SettingsStore, subscriptions, persistence
// ═══════════════════════════════════════════════════════════════════

use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coinpulse_core::models::alert::AlertKind;
use coinpulse_core::models::coin::CoinData;
use coinpulse_core::models::preferences::{SortDirection, SortField};
use coinpulse_core::models::settings::{Currency, NotificationKind, Settings, Theme};
use coinpulse_core::services::valuation::ValuationService;
use coinpulse_core::storage::kv::{KeyValueStore, MemoryStore};
use coinpulse_core::storage::manager::{MARKET_STORAGE_KEY, SETTINGS_STORAGE_KEY};
use coinpulse_core::store::market_store::{MarketState, MarketStore, PersistedMarketState};
use coinpulse_core::store::settings_store::SettingsStore;

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn coin(id: &str, rank: u32, price: f64, market_cap: f64, change_pct: f64) -> CoinData {
    let now = Utc::now();
    CoinData {
        id: id.to_string(),
        symbol: id[..3].to_string(),
        name: id.to_string(),
        image: String::new(),
        current_price: price,
        market_cap,
        market_cap_rank: rank,
        fully_diluted_valuation: None,
        total_volume: market_cap * 0.05,
        high_24h: price,
        low_24h: price,
        price_change_24h: 0.0,
        price_change_percentage_24h: change_pct,
        market_cap_change_24h: 0.0,
        market_cap_change_percentage_24h: change_pct,
        circulating_supply: market_cap / price,
        total_supply: None,
        max_supply: None,
        ath: price,
        ath_change_percentage: 0.0,
        ath_date: now,
        atl: price,
        atl_change_percentage: 0.0,
        atl_date: now,
        last_updated: now,
        sparkline: vec![price; 7],
    }
}

fn market() -> Vec<CoinData> {
    vec![
        coin("bitcoin", 1, 43_000.0, 840_000_000_000.0, 1.5),
        coin("ethereum", 2, 2_500.0, 300_000_000_000.0, -2.0),
        coin("solana", 3, 100.0, 900_000_000_000.0, 7.25),
    ]
}

fn shared_memory() -> (MemoryStore, Arc<dyn KeyValueStore>) {
    let memory = MemoryStore::new();
    let storage: Arc<dyn KeyValueStore> = Arc::new(memory.clone());
    (memory, storage)
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let reader = Arc::clone(&count);
    (count, move || reader.load(Ordering::SeqCst))
}

// ═══════════════════════════════════════════════════════════════════
// Favorites
// ═══════════════════════════════════════════════════════════════════

mod favorites {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut store = MarketStore::new();
        store.add_to_favorites("bitcoin");
        store.add_to_favorites("bitcoin");
        assert_eq!(store.state().favorites.len(), 1);
        assert!(store.is_favorite("bitcoin"));
    }

    #[test]
    fn toggle_twice_restores() {
        let mut store = MarketStore::new();
        store.toggle_favorite("ethereum");
        assert!(store.is_favorite("ethereum"));
        store.toggle_favorite("ethereum");
        assert!(!store.is_favorite("ethereum"));
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut store = MarketStore::new();
        store.add_to_favorites("bitcoin");
        store.remove_from_favorites("dogecoin");
        assert_eq!(store.state().favorites.len(), 1);
    }

    #[test]
    fn favorite_coins_follow_snapshot_order() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        store.add_to_favorites("solana");
        store.add_to_favorites("bitcoin");
        store.add_to_favorites("not-listed");
        let ids: Vec<String> = store.favorite_coins().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["bitcoin", "solana"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio
// ═══════════════════════════════════════════════════════════════════

mod portfolio {
    use super::*;

    #[test]
    fn empty_portfolio() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        assert_eq!(store.portfolio_value(), 0.0);
        assert_eq!(store.portfolio_change(), 0.0);
        assert!(store.holding_summaries().is_empty());
    }

    #[test]
    fn valuation_against_live_price() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        store.add_to_portfolio("ethereum", 2.0, 2_200.0);

        assert!(store.has_holding("ethereum"));
        assert_eq!(store.portfolio_value(), 5_000.0);
        assert!((store.portfolio_change() - 13.636_363).abs() < 1e-4);

        let summary = &store.holding_summaries()[0];
        assert_eq!(summary.coin_id, "ethereum");
        assert_eq!(summary.current_value, 5_000.0);
        assert_eq!(summary.invested_value, 4_400.0);
        assert_eq!(summary.gain_loss, 600.0);
    }

    #[test]
    fn holdings_missing_from_snapshot_count_as_zero() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        store.add_to_portfolio("delisted", 10.0, 1.0);
        assert_eq!(store.portfolio_value(), 0.0);
        assert_eq!(store.portfolio_change(), -100.0);
        assert_eq!(store.holding_summaries()[0].current_price, 0.0);
    }

    #[test]
    fn add_replaces_existing_holding() {
        let mut store = MarketStore::new();
        store.add_to_portfolio("bitcoin", 1.0, 30_000.0);
        store.add_to_portfolio("bitcoin", 0.25, 50_000.0);
        let holding = store.holding("bitcoin").unwrap();
        assert_eq!(holding.amount, 0.25);
        assert_eq!(holding.purchase_price, 50_000.0);
        assert_eq!(store.state().portfolio.len(), 1);
    }

    #[test]
    fn invalid_holding_is_ignored() {
        let mut store = MarketStore::new();
        store.add_to_portfolio("bitcoin", 0.0, 30_000.0);
        store.add_to_portfolio("bitcoin", 1.0, -1.0);
        store.add_to_portfolio("bitcoin", f64::NAN, 1.0);
        assert!(!store.has_holding("bitcoin"));
    }

    #[test]
    fn update_amount() {
        let mut store = MarketStore::new();
        store.add_to_portfolio("solana", 10.0, 85.0);
        store.update_portfolio_amount("solana", 12.5);
        assert_eq!(store.holding("solana").unwrap().amount, 12.5);
        assert_eq!(store.holding("solana").unwrap().purchase_price, 85.0);

        store.update_portfolio_amount("solana", -3.0);
        assert_eq!(store.holding("solana").unwrap().amount, 12.5);
    }

    #[test]
    fn update_missing_holding_is_noop() {
        let mut store = MarketStore::new();
        store.update_portfolio_amount("cardano", 100.0);
        assert!(!store.has_holding("cardano"));
    }

    #[test]
    fn remove() {
        let mut store = MarketStore::new();
        store.add_to_portfolio("bitcoin", 1.0, 30_000.0);
        store.remove_from_portfolio("bitcoin");
        assert!(!store.has_holding("bitcoin"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Alerts
// ═══════════════════════════════════════════════════════════════════

mod alerts {
    use super::*;

    #[test]
    fn toggle_twice_restores() {
        let mut store = MarketStore::new();
        let id = store.add_alert("bitcoin", 50_000.0, AlertKind::Above);
        store.toggle_alert(id);
        assert!(!store.state().alerts[0].active);
        store.toggle_alert(id);
        assert!(store.state().alerts[0].active);
    }

    #[test]
    fn remove_by_id_removes_exactly_one() {
        let mut store = MarketStore::new();
        let a = store.add_alert("bitcoin", 50_000.0, AlertKind::Above);
        let b = store.add_alert("bitcoin", 50_000.0, AlertKind::Above);
        store.remove_alert(a);
        assert_eq!(store.state().alerts.len(), 1);
        assert_eq!(store.state().alerts[0].id, b);
    }

    #[test]
    fn triggered_against_live_price() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        let above = store.add_alert("bitcoin", 40_000.0, AlertKind::Above);
        store.add_alert("bitcoin", 50_000.0, AlertKind::Above);
        let below = store.add_alert("ethereum", 2_500.0, AlertKind::Below);
        store.add_alert("delisted", 1.0, AlertKind::Above);

        let ids: Vec<_> = store.triggered_alerts().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![above, below]);

        store.toggle_alert(above);
        assert_eq!(store.triggered_alerts().len(), 1);
    }

    #[test]
    fn valuation_service_directly() {
        let coins = market();
        let service = ValuationService::new();
        assert_eq!(service.price_of("solana", &coins), Some(100.0));
        assert_eq!(service.price_of("dogecoin", &coins), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Sorting & preferences
// ═══════════════════════════════════════════════════════════════════

mod sorting {
    use super::*;

    fn ids(coins: &[CoinData]) -> Vec<&str> {
        coins.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn default_is_market_cap_desc() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        let sorted = store.sorted_market_data();
        assert_eq!(ids(&sorted), vec!["solana", "bitcoin", "ethereum"]);
    }

    #[test]
    fn by_price_ascending() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        store.set_sort_by(SortField::Price);
        store.set_sort_direction(SortDirection::Asc);
        let sorted = store.sorted_market_data();
        assert_eq!(ids(&sorted), vec!["solana", "ethereum", "bitcoin"]);
    }

    #[test]
    fn by_change_descending() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        store.set_sort_by(SortField::Change24h);
        let sorted = store.sorted_market_data();
        assert_eq!(ids(&sorted), vec!["solana", "bitcoin", "ethereum"]);
    }

    #[test]
    fn sorting_leaves_snapshot_untouched() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        store.set_sort_by(SortField::Price);
        let _ = store.sorted_market_data();
        assert_eq!(ids(&store.state().market_data), vec!["bitcoin", "ethereum", "solana"]);
    }

    #[test]
    fn equal_keys_keep_snapshot_order() {
        let mut store = MarketStore::new();
        store.set_market_data(vec![
            coin("aaa-one", 1, 10.0, 100.0, 0.0),
            coin("bbb-two", 2, 20.0, 100.0, 0.0),
            coin("ccc-three", 3, 5.0, 50.0, 0.0),
        ]);
        assert_eq!(ids(&store.sorted_market_data()), vec!["aaa-one", "bbb-two", "ccc-three"]);

        store.set_sort_direction(SortDirection::Asc);
        assert_eq!(ids(&store.sorted_market_data()), vec!["ccc-three", "aaa-one", "bbb-two"]);
    }

    #[test]
    fn snapshot_version_tracks_published_snapshots() {
        let mut store = MarketStore::new();
        assert_eq!(store.snapshot_version(), 0);
        store.set_market_data(market());
        store.set_market_data(market());
        assert_eq!(store.snapshot_version(), 2);

        store.set_loading(true);
        store.add_to_favorites("bitcoin");
        assert_eq!(store.snapshot_version(), 2);
    }

    #[test]
    fn refresh_interval_is_clamped() {
        let mut store = MarketStore::new();
        assert_eq!(store.state().refresh_interval, 5_000);
        store.set_refresh_interval(200);
        assert_eq!(store.state().refresh_interval, 1_000);
        store.set_refresh_interval(90_000);
        assert_eq!(store.state().refresh_interval, 30_000);
    }

    #[test]
    fn coin_lookup() {
        let mut store = MarketStore::new();
        store.set_market_data(market());
        assert_eq!(store.coin_by_id("ethereum").unwrap().current_price, 2_500.0);
        assert!(store.coin_by_id("dogecoin").is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Subscriptions
// ═══════════════════════════════════════════════════════════════════

mod subscriptions {
    use super::*;

    #[test]
    fn notified_on_change_only() {
        let mut store = MarketStore::new();
        let (count, seen) = counter();
        store.subscribe(Box::new(move |_: &MarketState| {
            count.fetch_add(1, Ordering::SeqCst);
        }));

        store.add_to_favorites("bitcoin");
        store.add_to_favorites("bitcoin");
        assert_eq!(seen(), 1);

        store.set_loading(true);
        assert_eq!(seen(), 2);
    }

    #[test]
    fn listener_sees_new_state() {
        let mut store = MarketStore::new();
        let (count, seen) = counter();
        store.subscribe(Box::new(move |state: &MarketState| {
            count.store(state.market_data.len(), Ordering::SeqCst);
        }));
        store.set_market_data(market());
        assert_eq!(seen(), 3);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = MarketStore::new();
        let (count, seen) = counter();
        let id = store.subscribe(Box::new(move |_: &MarketState| {
            count.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_to_favorites("bitcoin");
        assert_eq!(seen(), 0);
    }

    #[test]
    fn settings_listeners() {
        let mut settings = SettingsStore::new();
        let (count, seen) = counter();
        settings.subscribe(Box::new(move |s: &Settings| {
            if s.display.theme == Theme::Dark {
                count.fetch_add(1, Ordering::SeqCst);
            }
        }));
        settings.update_display(|d| d.theme = Theme::Dark);
        assert_eq!(seen(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Persistence
// ═══════════════════════════════════════════════════════════════════

mod persistence {
    use super::*;

    #[test]
    fn user_state_survives_restart() {
        let (memory, storage) = shared_memory();
        let mut store = MarketStore::with_storage(storage);
        store.set_market_data(market());
        store.add_to_favorites("bitcoin");
        store.add_to_portfolio("ethereum", 2.0, 2_200.0);
        store.add_alert("solana", 150.0, AlertKind::Above);
        store.set_refresh_interval(10_000);
        store.set_sort_by(SortField::Change24h);
        store.set_sort_direction(SortDirection::Asc);
        let expected = store.persisted();

        let restarted = MarketStore::with_storage(Arc::new(memory));
        assert_eq!(restarted.persisted(), expected);
        assert!(restarted.state().market_data.is_empty());
        assert!(restarted.state().market_stats.is_none());
    }

    #[test]
    fn snapshot_is_never_written() {
        let (memory, storage) = shared_memory();
        let mut store = MarketStore::with_storage(storage);
        store.set_market_data(market());
        store.set_loading(true);
        assert!(memory.is_empty());

        store.add_to_favorites("bitcoin");
        let raw = memory.get(MARKET_STORAGE_KEY).unwrap().unwrap();
        assert!(!raw.contains("market_data"));
        assert!(raw.contains("\"version\":0"));
    }

    #[test]
    fn invalid_cached_holdings_are_dropped() {
        let (memory, storage) = shared_memory();
        memory
            .set(
                MARKET_STORAGE_KEY,
                r#"{"state":{"portfolio":{
                    "bitcoin":{"amount":0.5,"purchase_price":40000.0,"purchase_date":"2024-01-01T00:00:00Z"},
                    "ethereum":{"amount":0.0,"purchase_price":2000.0,"purchase_date":"2024-01-01T00:00:00Z"},
                    "solana":{"amount":1.0,"purchase_price":-5.0,"purchase_date":"2024-01-01T00:00:00Z"}
                }},"version":0}"#,
            )
            .unwrap();
        let store = MarketStore::with_storage(storage);
        let held: Vec<&str> = store.state().portfolio.keys().map(String::as_str).collect();
        assert_eq!(held, vec!["bitcoin"]);
        assert_eq!(store.state().portfolio["bitcoin"].amount, 0.5);
    }

    #[test]
    fn corrupt_entry_is_a_cache_miss() {
        let (memory, storage) = shared_memory();
        memory.set(MARKET_STORAGE_KEY, "{not json").unwrap();
        let store = MarketStore::with_storage(storage);
        assert_eq!(store.persisted(), PersistedMarketState::default());
    }

    #[test]
    fn future_version_is_a_cache_miss() {
        let (memory, storage) = shared_memory();
        memory
            .set(MARKET_STORAGE_KEY, r#"{"state":{"favorites":["bitcoin"]},"version":3}"#)
            .unwrap();
        let store = MarketStore::with_storage(storage);
        assert!(store.state().favorites.is_empty());
    }

    #[test]
    fn partial_state_fills_defaults() {
        let (memory, storage) = shared_memory();
        memory
            .set(MARKET_STORAGE_KEY, r#"{"state":{"favorites":["bitcoin"]},"version":0}"#)
            .unwrap();
        let store = MarketStore::with_storage(storage);
        assert!(store.is_favorite("bitcoin"));
        assert_eq!(store.state().refresh_interval, 5_000);
        assert_eq!(store.state().sort_by, SortField::MarketCap);
    }

    #[test]
    fn cached_interval_is_clamped() {
        let (memory, storage) = shared_memory();
        memory
            .set(MARKET_STORAGE_KEY, r#"{"state":{"refresh_interval":10},"version":0}"#)
            .unwrap();
        let store = MarketStore::with_storage(storage);
        assert_eq!(store.state().refresh_interval, 1_000);
    }

    #[test]
    fn settings_survive_restart() {
        let (memory, storage) = shared_memory();
        let mut settings = SettingsStore::with_storage(storage);
        settings.update_display(|d| d.currency = Currency::Eur);
        settings.update_notifications(|n| n.news_updates = true);

        let restarted = SettingsStore::with_storage(Arc::new(memory));
        assert_eq!(restarted.display().currency, Currency::Eur);
        assert!(restarted.is_notification_enabled(NotificationKind::NewsUpdates));
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let (memory, storage) = shared_memory();
        memory.set(SETTINGS_STORAGE_KEY, "garbage").unwrap();
        let settings = SettingsStore::with_storage(storage);
        assert_eq!(settings.settings(), &Settings::default());
    }
}

// ═══════════════════════════════════════════════════════════════════
// SettingsStore
// ═══════════════════════════════════════════════════════════════════

mod settings_store {
    use super::*;

    #[test]
    fn defaults() {
        let settings = SettingsStore::new();
        assert_eq!(settings.currency_symbol(), "$");
        assert!(settings.display().animations_enabled);
        assert!(!settings.is_notification_enabled(NotificationKind::EmailNotifications));
    }

    #[test]
    fn format_price_uses_selected_currency() {
        let mut settings = SettingsStore::new();
        assert_eq!(settings.format_price(1_234.0), "$1.23K");
        settings.update_display(|d| d.currency = Currency::Gbp);
        assert_eq!(settings.format_price(1_234.0), "£1.23K");
    }

    #[test]
    fn reset_to_defaults() {
        let mut settings = SettingsStore::new();
        settings.update_display(|d| {
            d.currency = Currency::Jpy;
            d.compact_mode = true;
        });
        settings.reset_to_defaults();
        assert_eq!(settings.settings(), &Settings::default());
    }
}
