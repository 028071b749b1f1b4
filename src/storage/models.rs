use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum::FromRepr;

/// 活动状态，只能单向推进
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr, FromRepr,
)]
#[repr(i32)]
pub enum ActivityStatus {
    NotStarted = 0,
    Start = 1,
    End = 2,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr, FromRepr,
)]
#[repr(i32)]
pub enum OrderStatus {
    Preorder = 0,
    Paid = 1,
    Shipped = 2,
    Closed = 3,
}

/// One discount tier: unlocked once registrations reach `people_count`,
/// applying `percent` of the base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    pub level: i32,
    pub people_count: i64,
    pub percent: i32,
}

/// Ordered media attachment (file name only; upload handling lives elsewhere).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub file_name: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// 报名区间与付款截止（Unix 秒）
    pub start_at: i64,
    pub end_at: i64,
    pub pay_end_at: i64,
    /// 原价
    pub price: i64,
    /// 库存上限，None 表示不限量
    pub total_count: Option<i64>,
    pub status: ActivityStatus,
    pub discount_level: i32,
    pub final_price: i64,
    // 以下计数均为缓存，可随时由订单重新推导
    pub link_count: i64,
    pub registered_count: i64,
    pub buy_count: i64,
    pub preorder_item_count: i64,
    pub discounts: Vec<Discount>,
    pub images: Vec<MediaFile>,
    pub videos: Vec<MediaFile>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publish {
    pub id: i64,
    pub activity_id: i64,
    pub machine_id: i64,
    pub link_count: i64,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub publish_id: i64,
    pub customer_id: i64,
    pub pre_count: i64,
    pub buy_count: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Cached aggregate counters, always recomputable from the activity's orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounters {
    pub link_count: i64,
    pub registered_count: i64,
    pub buy_count: i64,
    pub preorder_item_count: i64,
}

/// Query filter for order listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub machine_id: Option<i64>,
    pub status: Option<OrderStatus>,
}
