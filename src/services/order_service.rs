//! Order admission and checkout service

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::PagesConfig;
use crate::errors::{Result, TuangouError};
use crate::notify::{NotifyEvent, NotifyHandle};
use crate::services::activity_service::ActivityService;
use crate::storage::models::{
    Activity, ActivityStatus, Order, OrderFilter, OrderStatus, Publish,
};
use crate::storage::Store;
use crate::utils::phone::phone_check_code;
use crate::utils::{is_valid_mobile_phone, Clock};

const PAY_GRACE_SECS: i64 = 24 * 60 * 60;

/// 建立预购单的输入
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateOrderRequest {
    pub phone: String,
    pub publish_id: i64,
    pub pre_count: i64,
}

/// 结帐（补款购买）的输入
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub buy_count: i64,
}

pub struct OrderService {
    store: Arc<dyn Store>,
    activities: Arc<ActivityService>,
    notify: NotifyHandle,
    clock: Arc<dyn Clock>,
    pages: PagesConfig,
    // 逐活动的准入锁：容量检查与下单必须串行，防止超卖
    admission_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn Store>,
        activities: Arc<ActivityService>,
        notify: NotifyHandle,
        clock: Arc<dyn Clock>,
        pages: PagesConfig,
    ) -> Self {
        Self {
            store,
            activities,
            notify,
            clock,
            pages,
            admission_locks: DashMap::new(),
        }
    }

    fn admission_lock(&self, activity_id: i64) -> Arc<Mutex<()>> {
        self.admission_locks
            .entry(activity_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn validate_create(req: &CreateOrderRequest) -> Result<()> {
        if !is_valid_mobile_phone(&req.phone) {
            return Err(TuangouError::validation("電話號碼格式錯誤"));
        }
        if req.pre_count <= 0 {
            return Err(TuangouError::validation("預約數量錯誤"));
        }
        Ok(())
    }

    /// Admit a pre-order against an active activity. The capacity check
    /// and the order insert run under a per-activity lock; everything
    /// after the insert is best-effort and never rolls the order back.
    pub async fn create(&self, req: CreateOrderRequest) -> Result<Order> {
        Self::validate_create(&req)?;

        let customer = self.store.find_or_create_customer(&req.phone).await?;

        let publish = self
            .store
            .find_publish(req.publish_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("活動不存在"))?;

        let lock = self.admission_lock(publish.activity_id);
        let guard = lock.lock().await;

        let activity = self
            .store
            .find_activity(publish.activity_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("活動不存在"))?;
        if activity.status != ActivityStatus::Start {
            return Err(TuangouError::state_conflict("活動不存在"));
        }
        if let Some(cap) = activity.total_count {
            if activity.preorder_item_count >= cap {
                return Err(TuangouError::state_conflict("活動商品已經訂購一空"));
            }
        }

        let order = self
            .store
            .create_order(Order {
                id: 0,
                publish_id: publish.id,
                customer_id: customer.id,
                pre_count: req.pre_count,
                buy_count: 0,
                total_price: 0,
                status: OrderStatus::Preorder,
                created_at: chrono::Utc::now(),
            })
            .await?;

        info!(
            "OrderService: customer {} preordered {} on activity {} (order {})",
            customer.id, req.pre_count, activity.id, order.id
        );

        // 计数与阶层推进：失败只记录，订单保留
        if let Err(e) = self.store.recount_publish_orders(publish.id).await {
            warn!("OrderService: recounting publish {} failed: {}", publish.id, e);
        }
        match self.activities.recompute_counters(activity.id).await {
            Ok(_) => {
                if let Err(e) = self.activities.apply_discount_progress(activity.id).await {
                    warn!(
                        "OrderService: discount progress for activity {} failed: {}",
                        activity.id, e
                    );
                }
            }
            Err(e) => {
                warn!(
                    "OrderService: recomputing counters for activity {} failed: {}",
                    activity.id, e
                );
            }
        }

        drop(guard);

        self.notify.emit(NotifyEvent::PreorderConfirmed {
            activity_name: activity.name.clone(),
            start_at: activity.start_at,
            end_at: activity.end_at,
            pay_due_at: activity.pay_end_at + PAY_GRACE_SECS,
            phone: req.phone.clone(),
            link: format!("{}/detail/{}", self.pages.order_page, order.id),
        });

        Ok(order)
    }

    /// Load the order/publish/activity chain for checkout-style lookups.
    async fn load_order_chain(&self, order_id: i64) -> Result<(Order, Publish, Activity)> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("訂單不存在"))?;
        let publish = self
            .store
            .find_publish(order.publish_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("訂單不存在"))?;
        let activity = self
            .store
            .find_activity(publish.activity_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("訂單不存在"))?;
        Ok((order, publish, activity))
    }

    /// Complete a pre-order after the activity has ended. Each failing
    /// precondition is reported with its own reason, all under the same
    /// conflict class the mobile client already handles.
    pub async fn checkout(&self, order_id: i64, req: CheckoutRequest) -> Result<()> {
        if req.buy_count <= 0 {
            return Err(TuangouError::validation("購買數量錯誤"));
        }

        let (mut order, publish, activity) = self.load_order_chain(order_id).await?;

        if order.status != OrderStatus::Preorder {
            return Err(TuangouError::state_conflict("訂單異常：訂單已完成付款"));
        }
        if activity.status != ActivityStatus::End {
            return Err(TuangouError::state_conflict("訂單異常：活動尚未結束"));
        }
        if activity.pay_end_at <= self.clock.now() {
            return Err(TuangouError::state_conflict("訂單異常：已超過付款期限"));
        }

        let mut customer = self
            .store
            .find_customer(order.customer_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("訂單不存在"))?;
        customer.name = Some(req.name);
        customer.email = Some(req.email.clone());
        customer.address = Some(req.address.clone());

        order.buy_count = req.buy_count;
        order.total_price = req.buy_count * activity.final_price;
        order.status = OrderStatus::Paid;

        self.store.save_order(&order).await?;
        self.store.save_customer(&customer).await?;

        info!(
            "OrderService: order {} checked out ({} x {})",
            order.id, order.buy_count, activity.final_price
        );

        // 计数刷新失败交给周期性重算自愈
        if let Err(e) = self.store.recount_publish_orders(publish.id).await {
            warn!("OrderService: recounting publish {} failed: {}", publish.id, e);
        }
        if let Err(e) = self.activities.recompute_counters(activity.id).await {
            warn!(
                "OrderService: recomputing counters for activity {} failed: {}",
                activity.id, e
            );
        }

        self.notify.emit(NotifyEvent::PurchaseConfirmed {
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            activity_code: activity.code.clone(),
            activity_name: activity.name.clone(),
            buy_count: order.buy_count,
            total_price: order.total_price,
            address: customer.address.clone(),
            check_code: phone_check_code(&customer.phone).to_string(),
            send_due_at: activity.pay_end_at + PAY_GRACE_SECS,
            link: format!("{}/detail/{}", self.pages.order_page, order.id),
        });

        Ok(())
    }

    pub async fn find(&self, user_id: i64, mut filter: OrderFilter) -> Result<Vec<Order>> {
        filter.user_id = Some(user_id);
        self.store.list_orders(filter).await
    }

    /// 行动端订单明细
    pub async fn find_for_mobile(&self, order_id: i64) -> Result<Order> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("訂單不存在"))
    }

    /// 后台订单状态调整（出货、结案）
    pub async fn set_status(&self, order_id: i64, status: OrderStatus) -> Result<Order> {
        let mut order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| TuangouError::not_found("訂單不存在"))?;
        order.status = status;
        self.store.save_order(&order).await?;
        Ok(order)
    }
}
