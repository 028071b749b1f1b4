//! Shared test fixtures: in-memory store, fixed clock, notification capture.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;

use tuangou::config::{PagesConfig, PricingConfig};
use tuangou::errors::{Result, TuangouError};
use tuangou::notify::{notify_channel, NotifyEvent};
use tuangou::services::{ActivityService, OrderService};
use tuangou::storage::models::{
    Activity, ActivityCounters, ActivityStatus, Customer, Discount, MediaFile, Order, OrderFilter,
    OrderStatus, Publish,
};
use tuangou::storage::Store;
use tuangou::utils::Clock;

// =============================================================================
// Fixed clock
// =============================================================================

pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    activities: RwLock<HashMap<i64, Activity>>,
    publishes: RwLock<HashMap<i64, Publish>>,
    orders: RwLock<HashMap<i64, Order>>,
    customers: RwLock<HashMap<i64, Customer>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    fn alloc_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn insert_publish(&self, activity_id: i64, machine_id: i64) -> Publish {
        let publish = Publish {
            id: self.alloc_id(),
            activity_id,
            machine_id,
            link_count: 0,
            published: true,
        };
        self.publishes
            .write()
            .await
            .insert(publish.id, publish.clone());
        publish
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_activity(&self, id: i64) -> Result<Option<Activity>> {
        Ok(self.activities.read().await.get(&id).cloned())
    }

    async fn find_activity_by_code(&self, user_id: i64, code: &str) -> Result<Option<Activity>> {
        Ok(self
            .activities
            .read()
            .await
            .values()
            .find(|a| a.user_id == user_id && a.code == code)
            .cloned())
    }

    async fn list_activities(
        &self,
        user_id: i64,
        status: Option<ActivityStatus>,
    ) -> Result<Vec<Activity>> {
        Ok(self
            .activities
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id && status.is_none_or(|s| a.status == s))
            .cloned()
            .collect())
    }

    async fn list_user_activities_excluding(
        &self,
        user_id: i64,
        status: ActivityStatus,
    ) -> Result<Vec<Activity>> {
        Ok(self
            .activities
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id && a.status != status)
            .cloned()
            .collect())
    }

    async fn list_activities_excluding(&self, status: ActivityStatus) -> Result<Vec<Activity>> {
        let mut list: Vec<Activity> = self
            .activities
            .read()
            .await
            .values()
            .filter(|a| a.status != status)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.id);
        Ok(list)
    }

    async fn save_activity(&self, mut activity: Activity) -> Result<Activity> {
        if activity.id == 0 {
            activity.id = self.alloc_id();
        }
        for tier in &mut activity.discounts {
            if tier.id == 0 {
                tier.id = self.alloc_id();
            }
        }
        self.activities
            .write()
            .await
            .insert(activity.id, activity.clone());
        Ok(activity)
    }

    async fn save_statuses(&self, updates: &[(i64, ActivityStatus)]) -> Result<()> {
        let mut activities = self.activities.write().await;
        for (id, status) in updates {
            if let Some(activity) = activities.get_mut(id) {
                activity.status = *status;
            }
        }
        Ok(())
    }

    async fn save_counters(&self, activity_id: i64, counters: &ActivityCounters) -> Result<()> {
        let mut activities = self.activities.write().await;
        let activity = activities
            .get_mut(&activity_id)
            .ok_or_else(|| TuangouError::not_found("activity not found"))?;
        activity.link_count = counters.link_count;
        activity.registered_count = counters.registered_count;
        activity.buy_count = counters.buy_count;
        activity.preorder_item_count = counters.preorder_item_count;
        Ok(())
    }

    async fn save_pricing(
        &self,
        activity_id: i64,
        discount_level: i32,
        final_price: i64,
    ) -> Result<()> {
        let mut activities = self.activities.write().await;
        let activity = activities
            .get_mut(&activity_id)
            .ok_or_else(|| TuangouError::not_found("activity not found"))?;
        activity.discount_level = discount_level;
        activity.final_price = final_price;
        Ok(())
    }

    async fn delete_activity(&self, id: i64) -> Result<()> {
        self.activities.write().await.remove(&id);
        self.publishes
            .write()
            .await
            .retain(|_, p| p.activity_id != id);
        Ok(())
    }

    async fn find_publish(&self, id: i64) -> Result<Option<Publish>> {
        Ok(self.publishes.read().await.get(&id).cloned())
    }

    async fn find_publishes_with_orders(
        &self,
        activity_id: i64,
    ) -> Result<Vec<(Publish, Vec<Order>)>> {
        let publishes: Vec<Publish> = self
            .publishes
            .read()
            .await
            .values()
            .filter(|p| p.activity_id == activity_id)
            .cloned()
            .collect();
        let orders = self.orders.read().await;
        Ok(publishes
            .into_iter()
            .map(|p| {
                let matching: Vec<Order> = orders
                    .values()
                    .filter(|o| o.publish_id == p.id)
                    .cloned()
                    .collect();
                (p, matching)
            })
            .collect())
    }

    async fn recount_publish_orders(&self, publish_id: i64) -> Result<i64> {
        let count = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.publish_id == publish_id)
            .count() as i64;
        let mut publishes = self.publishes.write().await;
        let publish = publishes
            .get_mut(&publish_id)
            .ok_or_else(|| TuangouError::not_found("publish not found"))?;
        publish.link_count = count;
        Ok(count)
    }

    async fn list_machine_publishes(&self, machine_id: i64) -> Result<Vec<(Publish, Activity)>> {
        let activities = self.activities.read().await;
        Ok(self
            .publishes
            .read()
            .await
            .values()
            .filter(|p| p.machine_id == machine_id && p.published)
            .filter_map(|p| {
                activities
                    .get(&p.activity_id)
                    .map(|a| (p.clone(), a.clone()))
            })
            .collect())
    }

    async fn create_order(&self, mut order: Order) -> Result<Order> {
        order.id = self.alloc_id();
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let publishes = self.publishes.read().await;
        let activities = self.activities.read().await;
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| {
                let Some(publish) = publishes.get(&o.publish_id) else {
                    return false;
                };
                let Some(activity) = activities.get(&publish.activity_id) else {
                    return false;
                };
                filter.user_id.is_none_or(|u| activity.user_id == u)
                    && filter.activity_id.is_none_or(|a| publish.activity_id == a)
                    && filter.machine_id.is_none_or(|m| publish.machine_id == m)
                    && filter.status.is_none_or(|s| o.status == s)
            })
            .cloned()
            .collect())
    }

    async fn find_orders_with_customers(
        &self,
        activity_id: i64,
    ) -> Result<Vec<(Order, Customer)>> {
        let publishes = self.publishes.read().await;
        let customers = self.customers.read().await;
        let mut result: Vec<(Order, Customer)> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| {
                publishes
                    .get(&o.publish_id)
                    .is_some_and(|p| p.activity_id == activity_id)
            })
            .map(|o| {
                let customer = customers
                    .get(&o.customer_id)
                    .cloned()
                    .expect("order customer must exist");
                (o.clone(), customer)
            })
            .collect();
        result.sort_by_key(|(o, _)| o.id);
        Ok(result)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn find_or_create_customer(&self, phone: &str) -> Result<Customer> {
        let mut customers = self.customers.write().await;
        if let Some(existing) = customers.values().find(|c| c.phone == phone) {
            return Ok(existing.clone());
        }
        let customer = Customer {
            id: self.alloc_id(),
            phone: phone.to_string(),
            name: None,
            email: None,
            address: None,
        };
        customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn save_customer(&self, customer: &Customer) -> Result<()> {
        self.customers
            .write()
            .await
            .insert(customer.id, customer.clone());
        Ok(())
    }
}

// =============================================================================
// Test environment
// =============================================================================

pub const DAY: i64 = 24 * 60 * 60;

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub activities: Arc<ActivityService>,
    pub orders: Arc<OrderService>,
    pub clock: Arc<FixedClock>,
    pub rx: UnboundedReceiver<NotifyEvent>,
}

impl TestEnv {
    pub fn drain(&mut self) -> Vec<NotifyEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn pages() -> PagesConfig {
    PagesConfig {
        order_page: "http://localhost:3000/mobile/order".to_string(),
        publish_page: "http://localhost:3000/mobile/publish".to_string(),
    }
}

pub fn setup(now: i64) -> TestEnv {
    setup_with_pricing(now, false)
}

pub fn setup_with_pricing(now: i64, recompute_price_on_end: bool) -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(now));
    let (notify_handle, rx) = notify_channel();

    let dyn_store: Arc<dyn Store> = store.clone();
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let activities = Arc::new(ActivityService::new(
        dyn_store.clone(),
        notify_handle.clone(),
        dyn_clock.clone(),
        pages(),
        &PricingConfig {
            recompute_price_on_end,
        },
    ));
    let orders = Arc::new(OrderService::new(
        dyn_store,
        activities.clone(),
        notify_handle,
        dyn_clock,
        pages(),
    ));

    TestEnv {
        store,
        activities,
        orders,
        clock,
        rx,
    }
}

/// Seed an activity directly in the store, bypassing service validation.
pub async fn seed_activity(
    store: &MemoryStore,
    status: ActivityStatus,
    price: i64,
    total_count: Option<i64>,
    tiers: &[(i64, i32)],
    now: i64,
) -> Activity {
    let activity = Activity {
        id: 0,
        user_id: 1,
        code: "GB-001".to_string(),
        name: "團購活動".to_string(),
        description: None,
        start_at: now - DAY,
        end_at: now + DAY,
        pay_end_at: now + 2 * DAY,
        price,
        total_count,
        status,
        discount_level: 0,
        final_price: price,
        link_count: 0,
        registered_count: 0,
        buy_count: 0,
        preorder_item_count: 0,
        discounts: tiers
            .iter()
            .enumerate()
            .map(|(index, (people_count, percent))| Discount {
                id: 0,
                level: index as i32 + 1,
                people_count: *people_count,
                percent: *percent,
            })
            .collect(),
        images: vec![MediaFile {
            file_name: "cover.jpg".to_string(),
            position: 0,
        }],
        videos: Vec::new(),
        created_at: chrono::Utc::now(),
    };
    store.save_activity(activity).await.expect("seed activity")
}

/// Seed a pre-order for `phone` through `publish`, bypassing admission.
pub async fn seed_order(store: &MemoryStore, publish_id: i64, phone: &str, pre_count: i64) -> Order {
    let customer = store
        .find_or_create_customer(phone)
        .await
        .expect("seed customer");
    store
        .create_order(Order {
            id: 0,
            publish_id,
            customer_id: customer.id,
            pre_count,
            buy_count: 0,
            total_price: 0,
            status: OrderStatus::Preorder,
            created_at: chrono::Utc::now(),
        })
        .await
        .expect("seed order")
}
