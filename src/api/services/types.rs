//! API 类型定义

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetActivitiesQuery {
    /// 筛选指定状态
    pub status: Option<i32>,
    /// 排除指定状态（与 status 互斥，优先生效）
    pub exclude_status: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetOrdersQuery {
    pub activity_id: Option<i64>,
    pub machine_id: Option<i64>,
    pub status: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SetOrderStatusBody {
    pub status: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RegisterCountResponse {
    pub activity_id: i64,
    pub registered_count: i64,
}
