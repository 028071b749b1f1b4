//! Persistence layer
//!
//! Domain models plus the [`Store`] trait the service layer talks to. The
//! sea-orm backed implementation lives in [`backend`]; tests substitute an
//! in-memory store.

pub mod backend;
pub mod models;

pub use backend::SeaOrmStore;
pub use models::{
    Activity, ActivityCounters, ActivityStatus, Customer, Discount, MediaFile, Order, OrderFilter,
    OrderStatus, Publish,
};

use async_trait::async_trait;

use crate::errors::Result;

#[async_trait]
pub trait Store: Send + Sync {
    // ---- activities ----

    /// Load an activity with its discount table and media lists.
    async fn find_activity(&self, id: i64) -> Result<Option<Activity>>;

    async fn find_activity_by_code(&self, user_id: i64, code: &str) -> Result<Option<Activity>>;

    async fn list_activities(
        &self,
        user_id: i64,
        status: Option<ActivityStatus>,
    ) -> Result<Vec<Activity>>;

    /// 列出指定用户除某状态外的所有活动
    async fn list_user_activities_excluding(
        &self,
        user_id: i64,
        status: ActivityStatus,
    ) -> Result<Vec<Activity>>;

    /// 列出全部未达某状态的活动（定时任务用）
    async fn list_activities_excluding(&self, status: ActivityStatus) -> Result<Vec<Activity>>;

    /// Insert (id == 0) or update an activity. Discount tiers and media
    /// lists are replaced wholesale. Returns the persisted activity.
    async fn save_activity(&self, activity: Activity) -> Result<Activity>;

    /// Bulk status persistence for the scheduler.
    async fn save_statuses(&self, updates: &[(i64, ActivityStatus)]) -> Result<()>;

    async fn save_counters(&self, activity_id: i64, counters: &ActivityCounters) -> Result<()>;

    async fn save_pricing(
        &self,
        activity_id: i64,
        discount_level: i32,
        final_price: i64,
    ) -> Result<()>;

    async fn delete_activity(&self, id: i64) -> Result<()>;

    // ---- publishes ----

    async fn find_publish(&self, id: i64) -> Result<Option<Publish>>;

    async fn find_publishes_with_orders(
        &self,
        activity_id: i64,
    ) -> Result<Vec<(Publish, Vec<Order>)>>;

    /// Recount a publish's orders, persist the count, and return it.
    async fn recount_publish_orders(&self, publish_id: i64) -> Result<i64>;

    /// 机台上架中的发布及其活动
    async fn list_machine_publishes(&self, machine_id: i64) -> Result<Vec<(Publish, Activity)>>;

    // ---- orders ----

    /// Persist a new order; the id in the argument is ignored.
    async fn create_order(&self, order: Order) -> Result<Order>;

    async fn find_order(&self, id: i64) -> Result<Option<Order>>;

    async fn save_order(&self, order: &Order) -> Result<()>;

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>>;

    /// Every order on the activity joined with its customer, for
    /// notification fan-out.
    async fn find_orders_with_customers(&self, activity_id: i64)
        -> Result<Vec<(Order, Customer)>>;

    // ---- customers ----

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>>;

    async fn find_or_create_customer(&self, phone: &str) -> Result<Customer>;

    async fn save_customer(&self, customer: &Customer) -> Result<()>;
}
