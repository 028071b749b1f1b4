//! ActivityService tests
//!
//! Lifecycle transitions, creation/update validation, counter
//! recomputation, and discount-tier progression.

mod common;

use common::{seed_activity, seed_order, setup, setup_with_pricing, DAY};
use tuangou::errors::TuangouError;
use tuangou::notify::NotifyEvent;
use tuangou::services::{ActivityDraft, TierSpec};
use tuangou::storage::models::ActivityStatus;
use tuangou::storage::Store;

const NOW: i64 = 1_785_888_000; // 2026-08-05 00:00:00 UTC

fn draft(code: &str) -> ActivityDraft {
    ActivityDraft {
        id: 0,
        code: code.to_string(),
        name: "夏季團購".to_string(),
        description: Some("限量出清".to_string()),
        start_at: NOW + DAY,
        end_at: NOW + 3 * DAY,
        pay_end_at: NOW + 4 * DAY,
        price: 1000,
        total_count: None,
        discounts: vec![
            TierSpec {
                people_count: 10,
                percent: 90,
            },
            TierSpec {
                people_count: 20,
                percent: 80,
            },
        ],
        images: vec!["cover.jpg".to_string()],
        videos: Vec::new(),
    }
}

// =============================================================================
// create / update
// =============================================================================

#[tokio::test]
async fn test_create_assigns_levels_and_defaults() {
    let env = setup(NOW);

    let activity = env.activities.create(1, draft("A1")).await.unwrap();

    assert!(activity.id > 0);
    assert_eq!(activity.status, ActivityStatus::NotStarted);
    assert_eq!(activity.discount_level, 0);
    assert_eq!(activity.final_price, 1000);
    assert_eq!(activity.discounts.len(), 2);
    assert_eq!(activity.discounts[0].level, 1);
    assert_eq!(activity.discounts[1].level, 2);
}

#[tokio::test]
async fn test_create_rejects_incomplete_fields() {
    let env = setup(NOW);

    let mut missing_name = draft("A1");
    missing_name.name.clear();
    assert!(matches!(
        env.activities.create(1, missing_name).await,
        Err(TuangouError::Validation(_))
    ));

    let mut no_images = draft("A2");
    no_images.images.clear();
    assert!(matches!(
        env.activities.create(1, no_images).await,
        Err(TuangouError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_bad_time_ordering() {
    let env = setup(NOW);

    let mut end_before_start = draft("A1");
    end_before_start.end_at = end_before_start.start_at - 1;
    assert!(matches!(
        env.activities.create(1, end_before_start).await,
        Err(TuangouError::Validation(_))
    ));

    let mut pay_before_end = draft("A2");
    pay_before_end.pay_end_at = pay_before_end.end_at - 1;
    assert!(matches!(
        env.activities.create(1, pay_before_end).await,
        Err(TuangouError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_start_in_the_past() {
    let env = setup(NOW);

    let mut stale = draft("A1");
    stale.start_at = NOW - 1;
    assert!(matches!(
        env.activities.create(1, stale).await,
        Err(TuangouError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_malformed_tier_table() {
    let env = setup(NOW);

    let mut bad_tiers = draft("A1");
    bad_tiers.discounts = vec![
        TierSpec {
            people_count: 10,
            percent: 80,
        },
        TierSpec {
            people_count: 20,
            percent: 90,
        },
    ];
    assert!(matches!(
        env.activities.create(1, bad_tiers).await,
        Err(TuangouError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_duplicate_code_per_user() {
    let env = setup(NOW);

    env.activities.create(1, draft("A1")).await.unwrap();
    assert!(matches!(
        env.activities.create(1, draft("A1")).await,
        Err(TuangouError::Validation(_))
    ));

    // 不同用户可以重用编码
    assert!(env.activities.create(2, draft("A1")).await.is_ok());
}

#[tokio::test]
async fn test_update_permission_and_state_checks() {
    let env = setup(NOW);

    let created = env.activities.create(1, draft("A1")).await.unwrap();

    let mut unknown = draft("A1");
    unknown.id = 9999;
    assert!(matches!(
        env.activities.update(1, unknown).await,
        Err(TuangouError::NotFound(_))
    ));

    let mut not_owner = draft("A1");
    not_owner.id = created.id;
    assert!(matches!(
        env.activities.update(2, not_owner).await,
        Err(TuangouError::Permission(_))
    ));

    env.store
        .save_statuses(&[(created.id, ActivityStatus::End)])
        .await
        .unwrap();
    let mut ended = draft("A1");
    ended.id = created.id;
    assert!(matches!(
        env.activities.update(1, ended).await,
        Err(TuangouError::StateConflict(_))
    ));
}

#[tokio::test]
async fn test_update_replaces_tier_table_and_requotes() {
    let env = setup(NOW);

    let created = env.activities.create(1, draft("A1")).await.unwrap();

    let mut revised = draft("A1");
    revised.id = created.id;
    revised.price = 2000;
    revised.discounts = vec![TierSpec {
        people_count: 5,
        percent: 50,
    }];

    let updated = env.activities.update(1, revised).await.unwrap();
    assert_eq!(updated.price, 2000);
    assert_eq!(updated.discounts.len(), 1);
    assert_eq!(updated.discounts[0].level, 1);
    // 无人报名，仍是原价
    assert_eq!(updated.discount_level, 0);
    assert_eq!(updated.final_price, 2000);
}

// =============================================================================
// status machine
// =============================================================================

#[tokio::test]
async fn test_advance_moves_not_started_to_start() {
    let env = setup(NOW);
    let mut activity = seed_activity(&env.store, ActivityStatus::NotStarted, 1000, None, &[], NOW).await;
    activity.start_at = NOW - 1;
    activity.end_at = NOW + DAY;
    let activity = env.store.save_activity(activity).await.unwrap();

    let changed = env.activities.advance_all().await.unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        env.activities.find(activity.id).await.unwrap().status,
        ActivityStatus::Start
    );
}

#[tokio::test]
async fn test_advance_before_start_is_noop() {
    let env = setup(NOW);
    let mut activity = seed_activity(&env.store, ActivityStatus::NotStarted, 1000, None, &[], NOW).await;
    activity.start_at = NOW + DAY;
    activity.end_at = NOW + 2 * DAY;
    env.store.save_activity(activity).await.unwrap();

    assert_eq!(env.activities.advance_all().await.unwrap(), 0);
}

#[tokio::test]
async fn test_advance_expired_window_passes_through_to_end() {
    let env = setup(NOW);
    let mut activity = seed_activity(&env.store, ActivityStatus::NotStarted, 1000, None, &[], NOW).await;
    activity.start_at = NOW - 2 * DAY;
    activity.end_at = NOW - DAY;
    let activity = env.store.save_activity(activity).await.unwrap();

    let changed = env.activities.advance_all().await.unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        env.activities.find(activity.id).await.unwrap().status,
        ActivityStatus::End
    );
}

#[tokio::test]
async fn test_advance_at_end_fires_sale_closed_exactly_once() {
    let mut env = setup(NOW);
    let mut activity = seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[], NOW).await;
    activity.end_at = NOW; // now >= end_at
    let activity = env.store.save_activity(activity).await.unwrap();
    let publish = env.store.insert_publish(activity.id, 7).await;
    seed_order(&env.store, publish.id, "0911111111", 1).await;
    seed_order(&env.store, publish.id, "0922222222", 2).await;

    let changed = env.activities.advance_all().await.unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        env.activities.find(activity.id).await.unwrap().status,
        ActivityStatus::End
    );

    let events = env.drain();
    let closed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, NotifyEvent::SaleClosed { .. }))
        .collect();
    assert_eq!(closed.len(), 2); // 每筆訂單一則

    // 已结束的活动不会再被推进，也不会重发通知
    assert_eq!(env.activities.advance_all().await.unwrap(), 0);
    assert!(env.drain().is_empty());
}

#[tokio::test]
async fn test_status_never_regresses() {
    let env = setup(NOW);
    let mut activity = seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[], NOW).await;
    activity.end_at = NOW;
    let activity = env.store.save_activity(activity).await.unwrap();

    env.activities.advance_all().await.unwrap();
    assert_eq!(
        env.activities.find(activity.id).await.unwrap().status,
        ActivityStatus::End
    );

    // 即使时钟倒退也保持 END
    env.clock.set(NOW - 10 * DAY);
    env.activities.advance_all().await.unwrap();
    assert_eq!(
        env.activities.find(activity.id).await.unwrap().status,
        ActivityStatus::End
    );
}

#[tokio::test]
async fn test_end_keeps_price_frozen_by_default() {
    let mut env = setup(NOW);
    let mut activity =
        seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[(1, 90)], NOW).await;
    activity.end_at = NOW;
    activity.registered_count = 5;
    // 模拟增量路径漏算：存储上价格仍是原价
    let activity = env.store.save_activity(activity).await.unwrap();

    env.activities.advance_all().await.unwrap();

    let after = env.activities.find(activity.id).await.unwrap();
    assert_eq!(after.final_price, 1000);
    env.drain();
}

#[tokio::test]
async fn test_end_recomputes_price_when_configured() {
    let mut env = setup_with_pricing(NOW, true);
    let mut activity =
        seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[(1, 90)], NOW).await;
    activity.end_at = NOW;
    activity.registered_count = 5;
    let activity = env.store.save_activity(activity).await.unwrap();

    env.activities.advance_all().await.unwrap();

    let after = env.activities.find(activity.id).await.unwrap();
    assert_eq!(after.final_price, 900);
    env.drain();
}

// =============================================================================
// counters
// =============================================================================

#[tokio::test]
async fn test_recompute_counters_folds_orders() {
    let env = setup(NOW);
    let activity = seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[], NOW).await;
    let p1 = env.store.insert_publish(activity.id, 1).await;
    let p2 = env.store.insert_publish(activity.id, 2).await;

    // 同一客户在两个渠道各下一单，另一客户完成购买
    seed_order(&env.store, p1.id, "0911111111", 2).await;
    seed_order(&env.store, p2.id, "0911111111", 1).await;
    let mut paid = seed_order(&env.store, p2.id, "0922222222", 3).await;
    paid.status = tuangou::storage::models::OrderStatus::Paid;
    env.store.save_order(&paid).await.unwrap();

    env.store.recount_publish_orders(p1.id).await.unwrap();
    env.store.recount_publish_orders(p2.id).await.unwrap();

    let counters = env.activities.recompute_counters(activity.id).await.unwrap();
    assert_eq!(counters.registered_count, 2); // 去重客户数
    assert_eq!(counters.buy_count, 1); // 非预购状态的客户数
    assert_eq!(counters.link_count, 3); // 各渠道订单数总和
    assert_eq!(counters.preorder_item_count, 6); // 2 + 1 + 3

    let stored = env.activities.find(activity.id).await.unwrap();
    assert_eq!(stored.registered_count, 2);
    assert_eq!(stored.preorder_item_count, 6);
}

#[tokio::test]
async fn test_recompute_counters_is_idempotent() {
    let env = setup(NOW);
    let activity = seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[], NOW).await;
    let publish = env.store.insert_publish(activity.id, 1).await;
    seed_order(&env.store, publish.id, "0911111111", 1).await;
    env.store.recount_publish_orders(publish.id).await.unwrap();

    let first = env.activities.recompute_counters(activity.id).await.unwrap();
    let second = env.activities.recompute_counters(activity.id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_recompute_counters_unknown_activity() {
    let env = setup(NOW);
    assert!(matches!(
        env.activities.recompute_counters(42).await,
        Err(TuangouError::NotFound(_))
    ));
}

// =============================================================================
// discount progression
// =============================================================================

#[tokio::test]
async fn test_discount_progress_notifies_once_per_crossing() {
    let mut env = setup(NOW);
    let mut activity =
        seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[(2, 90)], NOW).await;
    activity.registered_count = 2;
    let activity = env.store.save_activity(activity).await.unwrap();
    let publish = env.store.insert_publish(activity.id, 1).await;
    seed_order(&env.store, publish.id, "0911111111", 1).await;
    seed_order(&env.store, publish.id, "0922222222", 1).await;

    let updated = env.activities.apply_discount_progress(activity.id).await.unwrap();
    assert_eq!(updated.discount_level, 1);
    assert_eq!(updated.final_price, 900);

    let drops: Vec<_> = env
        .drain()
        .into_iter()
        .filter(|e| matches!(e, NotifyEvent::PriceDropped { .. }))
        .collect();
    assert_eq!(drops.len(), 2);

    // 同一阶层不重复通知
    env.activities.apply_discount_progress(activity.id).await.unwrap();
    assert!(env.drain().is_empty());
}

#[tokio::test]
async fn test_machine_listing_only_shows_running_activities() {
    let env = setup(NOW);

    let running = seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[], NOW).await;
    let running_publish = env.store.insert_publish(running.id, 7).await;

    let mut pending = seed_activity(&env.store, ActivityStatus::NotStarted, 1000, None, &[], NOW).await;
    pending.code = "GB-002".to_string();
    let pending = env.store.save_activity(pending).await.unwrap();
    env.store.insert_publish(pending.id, 7).await;

    let listed = env.activities.find_published_for_machine(7).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].activity_id, running.id);
    assert_eq!(
        listed[0].link,
        format!("http://localhost:3000/mobile/publish/{}", running_publish.id)
    );

    assert!(env
        .activities
        .find_published_for_machine(99)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_discount_progress_below_threshold_is_noop() {
    let mut env = setup(NOW);
    let activity =
        seed_activity(&env.store, ActivityStatus::Start, 1000, None, &[(10, 90)], NOW).await;

    let unchanged = env.activities.apply_discount_progress(activity.id).await.unwrap();
    assert_eq!(unchanged.discount_level, 0);
    assert_eq!(unchanged.final_price, 1000);
    assert!(env.drain().is_empty());
}
