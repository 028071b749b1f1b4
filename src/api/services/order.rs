//! 订单 API（后台查询 + 行动端预购/补款）

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder, Result as ActixResult};

use crate::services::{CheckoutRequest, CreateOrderRequest, OrderService};
use crate::storage::models::{OrderFilter, OrderStatus};

use super::helpers::{error_from_tuangou, error_response, require_user_id, success_response};
use super::types::{GetOrdersQuery, SetOrderStatusBody};

fn parse_status(value: i32) -> Result<OrderStatus, HttpResponse> {
    OrderStatus::from_repr(value).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            -1,
            &format!("unknown order status: {}", value),
        )
    })
}

/// 后台订单查询
pub async fn get_orders(
    req: HttpRequest,
    query: web::Query<GetOrdersQuery>,
    orders: web::Data<Arc<OrderService>>,
) -> ActixResult<impl Responder> {
    let user_id = match require_user_id(&req) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let status = match query.status.map(parse_status).transpose() {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let filter = OrderFilter {
        user_id: None,
        activity_id: query.activity_id,
        machine_id: query.machine_id,
        status,
    };

    match orders.find(user_id, filter).await {
        Ok(list) => Ok(success_response(list)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 行动端建立预购单
pub async fn post_order(
    body: web::Json<CreateOrderRequest>,
    orders: web::Data<Arc<OrderService>>,
) -> ActixResult<impl Responder> {
    match orders.create(body.into_inner()).await {
        Ok(order) => Ok(success_response(order)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 行动端订单明细
pub async fn get_order(
    path: web::Path<i64>,
    orders: web::Data<Arc<OrderService>>,
) -> ActixResult<impl Responder> {
    match orders.find_for_mobile(path.into_inner()).await {
        Ok(order) => Ok(success_response(order)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 行动端补款购买
pub async fn post_checkout(
    path: web::Path<i64>,
    body: web::Json<CheckoutRequest>,
    orders: web::Data<Arc<OrderService>>,
) -> ActixResult<impl Responder> {
    match orders.checkout(path.into_inner(), body.into_inner()).await {
        Ok(()) => Ok(success_response(())),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 后台调整订单状态
pub async fn put_order_status(
    path: web::Path<i64>,
    body: web::Json<SetOrderStatusBody>,
    orders: web::Data<Arc<OrderService>>,
) -> ActixResult<impl Responder> {
    let status = match parse_status(body.status) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    match orders.set_status(path.into_inner(), status).await {
        Ok(order) => Ok(success_response(order)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}
