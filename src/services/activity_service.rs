//! Activity lifecycle and aggregation service
//!
//! Owns activity CRUD with its validation rules, the time-driven status
//! machine, counter recomputation, and discount-tier progression.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{PagesConfig, PricingConfig};
use crate::errors::{Result, TuangouError};
use crate::notify::{NotifyEvent, NotifyHandle};
use crate::services::pricing::{compute_tier, validate_tiers, TierSpec};
use crate::storage::models::{
    Activity, ActivityCounters, ActivityStatus, Discount, MediaFile, OrderStatus,
};
use crate::storage::Store;
use crate::utils::phone::phone_check_code;
use crate::utils::Clock;

const PAY_GRACE_SECS: i64 = 24 * 60 * 60;

/// 活动建立/编辑的输入
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ActivityDraft {
    #[serde(default)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    pub pay_end_at: i64,
    pub price: i64,
    pub total_count: Option<i64>,
    pub discounts: Vec<TierSpec>,
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

/// 机台端可见的活动摘要
#[derive(Debug, Clone, serde::Serialize)]
pub struct MachineActivity {
    pub activity_id: i64,
    pub publish_id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    pub price: i64,
    pub final_price: i64,
    pub registered_count: i64,
    pub images: Vec<MediaFile>,
    pub link: String,
}

pub struct ActivityService {
    store: Arc<dyn Store>,
    notify: NotifyHandle,
    clock: Arc<dyn Clock>,
    pages: PagesConfig,
    recompute_price_on_end: bool,
}

impl ActivityService {
    pub fn new(
        store: Arc<dyn Store>,
        notify: NotifyHandle,
        clock: Arc<dyn Clock>,
        pages: PagesConfig,
        pricing: &PricingConfig,
    ) -> Self {
        Self {
            store,
            notify,
            clock,
            pages,
            recompute_price_on_end: pricing.recompute_price_on_end,
        }
    }

    fn validate_draft(&self, draft: &ActivityDraft) -> Result<()> {
        if draft.code.is_empty() || draft.name.is_empty() {
            return Err(TuangouError::validation("請填寫完整資訊"));
        }
        if draft.images.is_empty() {
            return Err(TuangouError::validation("至少要有一張產品圖"));
        }
        if draft.end_at < draft.start_at {
            return Err(TuangouError::validation("結束時間須晚於開始時間"));
        }
        if draft.pay_end_at < draft.end_at {
            return Err(TuangouError::validation("購買截止日不得早於結束時間"));
        }
        validate_tiers(&draft.discounts)
    }

    /// 依排序位置指派阶层级别（1 起算）
    fn assign_tiers(specs: &[TierSpec]) -> Vec<Discount> {
        specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Discount {
                id: 0,
                level: index as i32 + 1,
                people_count: spec.people_count,
                percent: spec.percent,
            })
            .collect()
    }

    fn assign_media(names: &[String]) -> Vec<MediaFile> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| MediaFile {
                file_name: name.clone(),
                position: index as i32,
            })
            .collect()
    }

    pub async fn create(&self, user_id: i64, draft: ActivityDraft) -> Result<Activity> {
        self.validate_draft(&draft)?;
        if self.clock.now() > draft.start_at {
            return Err(TuangouError::validation("開始時間錯誤"));
        }
        if self
            .store
            .find_activity_by_code(user_id, &draft.code)
            .await?
            .is_some()
        {
            return Err(TuangouError::validation("活動編碼已存在"));
        }

        let activity = Activity {
            id: 0,
            user_id,
            code: draft.code,
            name: draft.name,
            description: draft.description,
            start_at: draft.start_at,
            end_at: draft.end_at,
            pay_end_at: draft.pay_end_at,
            price: draft.price,
            total_count: draft.total_count,
            status: ActivityStatus::NotStarted,
            discount_level: 0,
            final_price: draft.price,
            link_count: 0,
            registered_count: 0,
            buy_count: 0,
            preorder_item_count: 0,
            discounts: Self::assign_tiers(&draft.discounts),
            images: Self::assign_media(&draft.images),
            videos: Self::assign_media(&draft.videos),
            created_at: chrono::Utc::now(),
        };

        let saved = self.store.save_activity(activity).await?;
        info!("ActivityService: user {} created activity '{}'", user_id, saved.code);
        Ok(saved)
    }

    pub async fn update(&self, user_id: i64, draft: ActivityDraft) -> Result<Activity> {
        self.validate_draft(&draft)?;

        let mut activity = self
            .store
            .find_activity(draft.id)
            .await?
            .ok_or_else(|| TuangouError::not_found("activity not found"))?;
        if activity.user_id != user_id {
            return Err(TuangouError::permission("permission deny"));
        }
        if activity.status == ActivityStatus::End {
            return Err(TuangouError::state_conflict(
                "activity can't modify when status is end",
            ));
        }
        if activity.code != draft.code
            && self
                .store
                .find_activity_by_code(user_id, &draft.code)
                .await?
                .is_some()
        {
            return Err(TuangouError::validation("活動編碼已存在"));
        }

        activity.code = draft.code;
        activity.name = draft.name;
        activity.description = draft.description;
        activity.start_at = draft.start_at;
        activity.end_at = draft.end_at;
        activity.pay_end_at = draft.pay_end_at;
        activity.price = draft.price;
        activity.total_count = draft.total_count;
        activity.discounts = Self::assign_tiers(&draft.discounts);
        activity.images = Self::assign_media(&draft.images);
        activity.videos = Self::assign_media(&draft.videos);

        // 价格与阶层表可能变了，依当前报名人数重新报价；
        // 级别未跨越时不发通知
        let quote = compute_tier(activity.registered_count, &activity.discounts, activity.price);
        activity.discount_level = quote.level;
        activity.final_price = quote.final_price;

        let saved = self.store.save_activity(activity).await?;
        info!("ActivityService: user {} updated activity '{}'", user_id, saved.code);
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete_activity(id).await?;
        info!("ActivityService: deleted activity {}", id);
        Ok(())
    }

    pub async fn find(&self, id: i64) -> Result<Activity> {
        self.store
            .find_activity(id)
            .await?
            .ok_or_else(|| TuangouError::not_found("activity not found"))
    }

    pub async fn find_all(
        &self,
        user_id: i64,
        status: Option<ActivityStatus>,
    ) -> Result<Vec<Activity>> {
        self.store.list_activities(user_id, status).await
    }

    pub async fn find_all_excluding(
        &self,
        user_id: i64,
        status: ActivityStatus,
    ) -> Result<Vec<Activity>> {
        self.store.list_user_activities_excluding(user_id, status).await
    }

    pub async fn register_count(&self, activity_id: i64) -> Result<i64> {
        Ok(self.find(activity_id).await?.registered_count)
    }

    /// 机台端列出进行中的活动与报名连结
    pub async fn find_published_for_machine(&self, machine_id: i64) -> Result<Vec<MachineActivity>> {
        let rows = self.store.list_machine_publishes(machine_id).await?;
        Ok(rows
            .into_iter()
            .filter(|(_, activity)| activity.status == ActivityStatus::Start)
            .map(|(publish, activity)| MachineActivity {
                activity_id: activity.id,
                publish_id: publish.id,
                code: activity.code,
                name: activity.name,
                description: activity.description,
                start_at: activity.start_at,
                end_at: activity.end_at,
                price: activity.price,
                final_price: activity.final_price,
                registered_count: activity.registered_count,
                images: activity.images,
                link: format!("{}/{}", self.pages.publish_page, publish.id),
            })
            .collect())
    }

    /// Refold the cached counters from the activity's publishes and
    /// orders. Idempotent; safe to re-run any time to heal drift.
    pub async fn recompute_counters(&self, activity_id: i64) -> Result<ActivityCounters> {
        self.find(activity_id).await?;

        let publishes = self.store.find_publishes_with_orders(activity_id).await?;

        let mut registered: HashSet<i64> = HashSet::new();
        let mut buyers: HashSet<i64> = HashSet::new();
        let mut counters = ActivityCounters::default();

        for (publish, orders) in &publishes {
            counters.link_count += publish.link_count;
            for order in orders {
                registered.insert(order.customer_id);
                if order.status != OrderStatus::Preorder {
                    buyers.insert(order.customer_id);
                }
                counters.preorder_item_count += order.pre_count;
            }
        }
        counters.registered_count = registered.len() as i64;
        counters.buy_count = buyers.len() as i64;

        self.store.save_counters(activity_id, &counters).await?;
        Ok(counters)
    }

    /// Re-run the pricing engine against the stored registration count.
    /// When a new tier is reached, persist the level/price and notify
    /// every registered customer once.
    pub async fn apply_discount_progress(&self, activity_id: i64) -> Result<Activity> {
        let mut activity = self.find(activity_id).await?;

        let quote = compute_tier(activity.registered_count, &activity.discounts, activity.price);
        let Some(tier) = quote.tier else {
            return Ok(activity);
        };
        if quote.level == activity.discount_level {
            return Ok(activity);
        }

        self.store
            .save_pricing(activity_id, quote.level, quote.final_price)
            .await?;
        activity.discount_level = quote.level;
        activity.final_price = quote.final_price;

        info!(
            "ActivityService: activity {} reached tier {} (price {})",
            activity_id, quote.level, quote.final_price
        );

        for (order, customer) in self.store.find_orders_with_customers(activity_id).await? {
            self.notify.emit(NotifyEvent::PriceDropped {
                activity_name: activity.name.clone(),
                people_count: tier.people_count,
                final_price: activity.final_price,
                phone: customer.phone.clone(),
                link: format!("{}/detail/{}", self.pages.order_page, order.id),
            });
        }

        Ok(activity)
    }

    /// Walk every non-ended activity and apply the time-driven
    /// transitions. An activity whose whole window has already passed
    /// moves through START to END in a single pass. Returns the number
    /// of activities whose status changed.
    pub async fn advance_all(&self) -> Result<usize> {
        let now = self.clock.now();
        let activities = self
            .store
            .list_activities_excluding(ActivityStatus::End)
            .await?;

        let mut updates: Vec<(i64, ActivityStatus)> = Vec::new();
        let mut ended: Vec<Activity> = Vec::new();

        for mut activity in activities {
            let before = activity.status;
            if activity.status == ActivityStatus::NotStarted && activity.start_at <= now {
                activity.status = ActivityStatus::Start;
            }
            if activity.status == ActivityStatus::Start && activity.end_at <= now {
                activity.status = ActivityStatus::End;
            }
            if activity.status != before {
                updates.push((activity.id, activity.status));
                if activity.status == ActivityStatus::End {
                    ended.push(activity);
                }
            }
        }

        self.store.save_statuses(&updates).await?;
        if !updates.is_empty() {
            info!("ActivityService: advanced {} activities", updates.len());
        }

        for activity in ended {
            self.on_activity_ended(&activity).await;
        }

        Ok(updates.len())
    }

    /// END 进场副作用：视设定重算成交价，并对每笔既有订单发送结团通知。
    /// 只在状态跨越时调用一次，失败不影响状态推进。
    async fn on_activity_ended(&self, activity: &Activity) {
        let mut final_price = activity.final_price;

        if self.recompute_price_on_end {
            let quote = compute_tier(activity.registered_count, &activity.discounts, activity.price);
            final_price = quote.final_price;
            if let Err(e) = self
                .store
                .save_pricing(activity.id, quote.level, quote.final_price)
                .await
            {
                warn!("ActivityService: repricing activity {} on end failed: {}", activity.id, e);
            }
        }

        let orders = match self.store.find_orders_with_customers(activity.id).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(
                    "ActivityService: loading orders for ended activity {} failed: {}",
                    activity.id, e
                );
                return;
            }
        };

        for (order, customer) in orders {
            self.notify.emit(NotifyEvent::SaleClosed {
                activity_name: activity.name.clone(),
                final_price,
                pay_end_at: activity.pay_end_at,
                send_due_at: activity.pay_end_at + PAY_GRACE_SECS,
                check_code: phone_check_code(&customer.phone).to_string(),
                link: format!("{}/{}", self.pages.order_page, order.id),
                phone: customer.phone.clone(),
            });
        }
    }
}
