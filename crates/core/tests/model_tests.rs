// ═══════════════════════════════════════════════════════════════════
// Model Tests — numeric coercion, Catalog, override keys, SelectionLedger,
// Settings
// ═══════════════════════════════════════════════════════════════════

use std::collections::BTreeMap;

use trade_ledger_core::models::catalog::{Catalog, CatalogItem};
use trade_ledger_core::models::price_override::{OverrideKey, PriceOverrides};
use trade_ledger_core::models::selection::{ItemId, SelectionLedger};
use trade_ledger_core::models::settings::Settings;
use trade_ledger_core::models::totals::Totals;
use trade_ledger_core::numeric::{parse_number, parse_quantity, sanitize};

fn wire(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ═══════════════════════════════════════════════════════════════════
//  Numeric coercion
// ═══════════════════════════════════════════════════════════════════

mod numeric {
    use super::*;

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_number("150"), 150.0);
        assert_eq!(parse_number("  -2.5"), -2.5);
        assert_eq!(parse_number("1e3"), 1000.0);
    }

    #[test]
    fn uses_leading_numeric_prefix() {
        assert_eq!(parse_number("12abc"), 12.0);
        assert_eq!(parse_number("3."), 3.0);
        assert_eq!(parse_number(".5x"), 0.5);
        assert_eq!(parse_number("7e"), 7.0);
        assert_eq!(parse_number("1,000"), 1.0);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number("."), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
    }

    #[test]
    fn quantity_truncates_toward_zero() {
        assert_eq!(parse_quantity("2.9"), 2);
        assert_eq!(parse_quantity("-1.5"), -1);
        assert_eq!(parse_quantity("x"), 0);
    }

    #[test]
    fn sanitize_drops_non_finite() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(4.25), 4.25);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Catalog
// ═══════════════════════════════════════════════════════════════════

mod catalog {
    use super::*;

    const JSON: &str = r#"{
        "weapons": [
            {"name": "AK47", "buyPrice": 100, "sellPrice": 150},
            {"name": "Pistol", "buyPrice": 40, "sellPrice": 55}
        ],
        "drugs": [
            {"name": "Weed", "buyPrice": 10, "sellPrice": 18}
        ]
    }"#;

    #[test]
    fn parses_json_shape() {
        let catalog = Catalog::from_json(JSON).unwrap();
        assert_eq!(catalog.len(), 3);
        let ak = catalog.find("weapons", "AK47").unwrap();
        assert_eq!(ak.buy_price, 100.0);
        assert_eq!(ak.sell_price, 150.0);
        assert_eq!(catalog.default_buy_price("drugs", "Weed"), Some(10.0));
    }

    #[test]
    fn categories_are_sorted() {
        let catalog = Catalog::from_json(JSON).unwrap();
        let names: Vec<&str> = catalog.categories().map(|(c, _)| c).collect();
        assert_eq!(names, vec!["drugs", "weapons"]);
    }

    #[test]
    fn unknown_lookups_are_none() {
        let catalog = Catalog::from_json(JSON).unwrap();
        assert!(catalog.find("weapons", "Tank").is_none());
        assert!(catalog.find("boats", "AK47").is_none());
        assert!(catalog.items("boats").is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Catalog::from_json("{\"weapons\": 5}").is_err());
    }

    #[test]
    fn builder_adds_items() {
        let catalog = Catalog::new()
            .with_item("weapons", CatalogItem::new("AK47", 100.0, 150.0))
            .with_item("weapons", CatalogItem::new("Pistol", 40.0, 55.0));
        assert_eq!(catalog.items("weapons").unwrap().len(), 2);
        assert!(!catalog.is_empty());
        assert!(Catalog::new().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  OverrideKey & PriceOverrides
// ═══════════════════════════════════════════════════════════════════

mod overrides {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new()
            .with_item("weapons", CatalogItem::new("AK47", 100.0, 150.0))
            .with_item("weapons", CatalogItem::new("Pistol", 40.0, 55.0))
    }

    #[test]
    fn wire_key_format() {
        let key = OverrideKey::new("weapons", "AK47");
        assert_eq!(key.to_wire(), "weapons::AK47::buyPrice");
        assert_eq!(key.to_string(), "weapons::AK47::buyPrice");
        assert_eq!(OverrideKey::parse_wire("weapons::AK47::buyPrice"), Some(key));
    }

    #[test]
    fn wire_key_item_may_contain_separator() {
        let key = OverrideKey::parse_wire("ammo::9mm::FMJ::buyPrice").unwrap();
        assert_eq!(key.category, "ammo");
        assert_eq!(key.item, "9mm::FMJ");
    }

    #[test]
    fn wire_key_rejects_other_shapes() {
        assert!(OverrideKey::parse_wire("weapons::AK47").is_none());
        assert!(OverrideKey::parse_wire("::AK47::buyPrice").is_none());
        assert!(OverrideKey::parse_wire("weapons-AK47").is_none());
    }

    #[test]
    fn legacy_key_splits_on_first_dash() {
        let key = OverrideKey::parse_legacy("weapons-AK-47").unwrap();
        assert_eq!(key.category, "weapons");
        assert_eq!(key.item, "AK-47");
        assert!(OverrideKey::parse_legacy("weapons").is_none());
        assert!(OverrideKey::parse_legacy("weapons::AK47::buyPrice").is_none());
    }

    #[test]
    fn set_stores_custom_price() {
        let mut o = PriceOverrides::new();
        assert!(o.set(OverrideKey::new("weapons", "AK47"), 120.0, 100.0));
        assert_eq!(o.get(&OverrideKey::new("weapons", "AK47")), Some(120.0));
        // Same value again is not a change
        assert!(!o.set(OverrideKey::new("weapons", "AK47"), 120.0, 100.0));
    }

    #[test]
    fn set_to_default_removes_key() {
        let mut o = PriceOverrides::new();
        let key = OverrideKey::new("weapons", "AK47");
        o.set(key.clone(), 120.0, 100.0);
        assert!(o.set(key.clone(), 100.0, 100.0));
        assert_eq!(o.get(&key), None);
        assert!(o.is_empty());
    }

    #[test]
    fn set_to_zero_or_negative_removes_key() {
        let mut o = PriceOverrides::new();
        let key = OverrideKey::new("weapons", "AK47");
        o.set(key.clone(), 120.0, 100.0);
        assert!(o.set(key.clone(), 0.0, 100.0));
        assert!(o.is_empty());

        o.set(key.clone(), 120.0, 100.0);
        assert!(o.set(key.clone(), -5.0, 100.0));
        assert!(o.is_empty());

        // Nothing stored and nothing to remove
        assert!(!o.set(key, f64::NAN, 100.0));
    }

    #[test]
    fn from_wire_reads_current_keys() {
        let (o, report) = PriceOverrides::from_wire(&wire(&[("weapons::AK47::buyPrice", 120.0)]));
        assert_eq!(o.get(&OverrideKey::new("weapons", "AK47")), Some(120.0));
        assert!(!report.needs_rewrite());
    }

    #[test]
    fn from_wire_migrates_legacy_keys() {
        let (o, report) = PriceOverrides::from_wire(&wire(&[("weapons-Pistol", 45.0)]));
        assert_eq!(o.get(&OverrideKey::new("weapons", "Pistol")), Some(45.0));
        assert_eq!(report.migrated_legacy, 1);
        assert!(report.needs_rewrite());
        assert_eq!(
            o.to_wire(),
            wire(&[("weapons::Pistol::buyPrice", 45.0)])
        );
    }

    #[test]
    fn current_key_wins_over_legacy() {
        let (o, report) = PriceOverrides::from_wire(&wire(&[
            ("weapons-AK47", 90.0),
            ("weapons::AK47::buyPrice", 120.0),
        ]));
        assert_eq!(o.get(&OverrideKey::new("weapons", "AK47")), Some(120.0));
        assert_eq!(report.shadowed_legacy, 1);
        assert_eq!(report.migrated_legacy, 0);
        assert_eq!(o.len(), 1);
    }

    #[test]
    fn from_wire_drops_invalid_entries() {
        let (o, report) = PriceOverrides::from_wire(&wire(&[
            ("weapons::AK47::buyPrice", 0.0),
            ("weapons::Pistol::buyPrice", -1.0),
            ("garbage", 10.0),
        ]));
        assert!(o.is_empty());
        assert_eq!(report.dropped, 3);
    }

    #[test]
    fn prune_against_catalog() {
        let mut o = PriceOverrides::new();
        o.set(OverrideKey::new("weapons", "AK47"), 120.0, 0.5);
        // Equal to the catalog default once compared against the real catalog
        o.set(OverrideKey::new("weapons", "Pistol"), 40.0, 0.5);
        o.set(OverrideKey::new("boats", "Dinghy"), 500.0, 0.5);

        let removed = o.prune_against(&catalog());
        assert_eq!(removed, 2);
        assert_eq!(o.len(), 1);
        assert_eq!(o.get(&OverrideKey::new("weapons", "AK47")), Some(120.0));
    }

    #[test]
    fn merge_prefers_other() {
        let mut a = PriceOverrides::new();
        a.set(OverrideKey::new("weapons", "AK47"), 110.0, 100.0);
        let mut b = PriceOverrides::new();
        b.set(OverrideKey::new("weapons", "AK47"), 130.0, 100.0);
        b.set(OverrideKey::new("weapons", "Pistol"), 41.0, 40.0);

        a.merge_from(&b);
        assert_eq!(a.get(&OverrideKey::new("weapons", "AK47")), Some(130.0));
        assert_eq!(a.len(), 2);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  ItemId & SelectionLedger
// ═══════════════════════════════════════════════════════════════════

mod selection {
    use super::*;

    fn ledger() -> SelectionLedger {
        SelectionLedger::with_zero_quantity_categories(["drugs"])
    }

    #[test]
    fn parse_current_form() {
        let id = ItemId::parse("weapons::AK47").unwrap();
        assert_eq!(id, ItemId::new("weapons", "AK47"));
        assert_eq!(id.to_string(), "weapons::AK47");
    }

    #[test]
    fn parse_keeps_separator_inside_name() {
        assert_eq!(
            ItemId::parse("ammo::9mm::FMJ").unwrap(),
            ItemId::new("ammo", "9mm::FMJ")
        );
        assert_eq!(
            ItemId::parse("weapons-AK-47").unwrap(),
            ItemId::new("weapons", "AK-47")
        );
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!(ItemId::parse("weapons").is_none());
        assert!(ItemId::parse("::AK47").is_none());
        assert!(ItemId::parse("weapons-").is_none());
    }

    #[test]
    fn override_key_matches_item() {
        let id = ItemId::new("weapons", "AK47");
        assert_eq!(id.override_key(), OverrideKey::new("weapons", "AK47"));
    }

    #[test]
    fn set_and_get() {
        let mut l = ledger();
        assert_eq!(l.set(ItemId::new("weapons", "AK47"), 3), Some(3));
        assert_eq!(l.get(&ItemId::new("weapons", "AK47")), Some(3));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn zero_removes_regular_row() {
        let mut l = ledger();
        let id = ItemId::new("weapons", "AK47");
        l.set(id.clone(), 2);
        assert_eq!(l.set(id.clone(), 0), None);
        assert!(!l.contains(&id));
        assert_eq!(l.set(id.clone(), -4), None);
        assert!(l.is_empty());
    }

    #[test]
    fn zero_kept_for_zero_quantity_category() {
        let mut l = ledger();
        let id = ItemId::new("drugs", "Weed");
        assert_eq!(l.set(id.clone(), 0), Some(0));
        assert_eq!(l.get(&id), Some(0));
        // Negative clamps to zero instead of removing
        assert_eq!(l.set(id.clone(), -3), Some(0));
        assert!(l.contains(&id));
    }

    #[test]
    fn delete_and_clear() {
        let mut l = ledger();
        let ak = ItemId::new("weapons", "AK47");
        l.set(ak.clone(), 1);
        l.set(ItemId::new("drugs", "Weed"), 5);
        assert!(l.delete(&ak));
        assert!(!l.delete(&ak));
        assert_eq!(l.len(), 1);
        l.clear();
        assert!(l.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings & Totals defaults
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert!(s.margin_alert.enabled);
        assert_eq!(s.margin_alert.threshold, 0.0);
        assert_eq!(s.margin_alert.realert_drift, 1000.0);
        assert_eq!(s.override_save_debounce_ms, 500);
        assert_eq!(s.totals_debounce_ms, 150);
        assert_eq!(s.zero_quantity_categories, vec!["drugs".to_string()]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s = Settings::from_json(r#"{"marginAlert": {"threshold": -250}}"#).unwrap();
        assert_eq!(s.margin_alert.threshold, -250.0);
        assert!(s.margin_alert.enabled);
        assert_eq!(s.totals_debounce_ms, 150);
    }

    #[test]
    fn negative_drift_rejected() {
        let err = Settings::from_json(r#"{"marginAlert": {"realertDrift": -1}}"#).unwrap_err();
        assert!(err.to_string().contains("drift"));
    }

    #[test]
    fn json_roundtrip_uses_camel_case() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("overrideSaveDebounceMs"));
        assert!(json.contains("zeroQuantityCategories"));
        assert_eq!(Settings::from_json(&json).unwrap(), Settings::default());
    }

    #[test]
    fn empty_totals() {
        let t = Totals::default();
        assert_eq!(t.total_buy, 0.0);
        assert_eq!(t.total_sell, 0.0);
        assert_eq!(t.total_margin, 0.0);
        assert_eq!(t.total_margin_percent, 0.0);
        assert!(t.is_positive);
        assert_eq!(t.item_count, 0);
    }
}
