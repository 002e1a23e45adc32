//! Referral resolution: embedded checkout code first, then the most recent
//! unconverted visit inside the attribution window.

mod common;

use affiliate_attribution::attribution::{ReferralResolver, ReferralSource};
use common::*;

fn order(referral_code: Option<&str>) -> OrderRecord {
    serde_json::from_value(order_json(
        "20077",
        Some("buyer@example.com"),
        500.0,
        "PAID",
        referral_code,
    ))
    .unwrap()
}

#[test]
fn test_embedded_code_wins_over_visits() {
    let pool = setup_test_pool();
    let store = SqliteStore::new(pool);
    {
        let conn = store.pool().get().unwrap();
        create_test_visit(&conn, "VISIT5", days_ago(1));
    }

    let resolver = ReferralResolver::new(&store, 90);
    let resolved = resolver.resolve(&order(Some("ACME10")), now()).unwrap().unwrap();

    assert_eq!(resolved.code, "ACME10");
    assert_eq!(resolved.source, ReferralSource::OrderField);
}

#[test]
fn test_falls_back_to_most_recent_visit() {
    let store = SqliteStore::new(setup_test_pool());
    let newest = {
        let conn = store.pool().get().unwrap();
        create_test_visit(&conn, "OLDER", days_ago(30));
        create_test_visit(&conn, "ACME10", days_ago(2))
    };

    let resolver = ReferralResolver::new(&store, 90);
    let resolved = resolver.resolve(&order(None), now()).unwrap().unwrap();

    assert_eq!(resolved.code, "ACME10");
    assert_eq!(
        resolved.source,
        ReferralSource::Visit {
            visit_id: newest.id
        }
    );
}

#[test]
fn test_blank_embedded_code_falls_back_to_visit() {
    let store = SqliteStore::new(setup_test_pool());
    {
        let conn = store.pool().get().unwrap();
        create_test_visit(&conn, "ACME10", days_ago(2));
    }

    let resolver = ReferralResolver::new(&store, 90);
    let resolved = resolver.resolve(&order(Some("   ")), now()).unwrap().unwrap();
    assert_eq!(resolved.code, "ACME10");
}

#[test]
fn test_window_boundary_is_inclusive() {
    let store = SqliteStore::new(setup_test_pool());
    let now = now();
    {
        let conn = store.pool().get().unwrap();
        create_test_visit(&conn, "EDGE", now - 90 * SECONDS_PER_DAY);
    }

    let resolver = ReferralResolver::new(&store, 90);
    assert_eq!(resolver.window_start(now), now - 90 * SECONDS_PER_DAY);

    let resolved = resolver.resolve(&order(None), now).unwrap();
    assert_eq!(resolved.map(|r| r.code).as_deref(), Some("EDGE"));
}

#[test]
fn test_visit_outside_window_is_ignored() {
    let store = SqliteStore::new(setup_test_pool());
    let now = now();
    {
        let conn = store.pool().get().unwrap();
        create_test_visit(&conn, "STALE", now - 91 * SECONDS_PER_DAY);
    }

    let resolver = ReferralResolver::new(&store, 90);
    assert!(resolver.resolve(&order(None), now).unwrap().is_none());
}

#[test]
fn test_converted_visits_are_skipped() {
    let store = SqliteStore::new(setup_test_pool());
    {
        let conn = store.pool().get().unwrap();
        let visit = create_test_visit(&conn, "ACME10", days_ago(2));
        queries::mark_visit_converted(&conn, &visit.id, "19999", now()).unwrap();
    }

    let resolver = ReferralResolver::new(&store, 90);
    assert!(resolver.resolve(&order(None), now()).unwrap().is_none());
}

#[test]
fn test_no_referral_anywhere() {
    let store = SqliteStore::new(setup_test_pool());
    let resolver = ReferralResolver::new(&store, 90);
    assert!(resolver.resolve(&order(None), now()).unwrap().is_none());
}
