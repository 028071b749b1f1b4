//! 活动管理 API

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder, Result as ActixResult};
use tracing::trace;

use crate::services::{ActivityDraft, ActivityService};
use crate::storage::models::ActivityStatus;

use super::helpers::{error_from_tuangou, error_response, require_user_id, success_response};
use super::types::{GetActivitiesQuery, RegisterCountResponse};

fn parse_status(value: i32) -> Result<ActivityStatus, HttpResponse> {
    ActivityStatus::from_repr(value).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            -1,
            &format!("unknown activity status: {}", value),
        )
    })
}

/// 查询活动列表（可按状态筛选或排除）
pub async fn get_activities(
    req: HttpRequest,
    query: web::Query<GetActivitiesQuery>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    let user_id = match require_user_id(&req) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    trace!("Activity API: list for user {} with {:?}", user_id, query);

    let result = if let Some(excluded) = query.exclude_status {
        let status = match parse_status(excluded) {
            Ok(s) => s,
            Err(resp) => return Ok(resp),
        };
        activities.find_all_excluding(user_id, status).await
    } else {
        let status = match query.status.map(parse_status).transpose() {
            Ok(s) => s,
            Err(resp) => return Ok(resp),
        };
        activities.find_all(user_id, status).await
    };

    match result {
        Ok(list) => Ok(success_response(list)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 建立活动
pub async fn post_activity(
    req: HttpRequest,
    draft: web::Json<ActivityDraft>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    let user_id = match require_user_id(&req) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match activities.create(user_id, draft.into_inner()).await {
        Ok(activity) => Ok(success_response(activity)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 查询单一活动
pub async fn get_activity(
    path: web::Path<i64>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    match activities.find(path.into_inner()).await {
        Ok(activity) => Ok(success_response(activity)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 更新活动（整表替换折扣阶层与媒体清单）
pub async fn put_activity(
    req: HttpRequest,
    path: web::Path<i64>,
    draft: web::Json<ActivityDraft>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    let user_id = match require_user_id(&req) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let mut draft = draft.into_inner();
    draft.id = path.into_inner();

    match activities.update(user_id, draft).await {
        Ok(activity) => Ok(success_response(activity)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 删除活动
pub async fn delete_activity(
    path: web::Path<i64>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    match activities.delete(path.into_inner()).await {
        Ok(()) => Ok(success_response(())),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 机台端列出进行中的活动
pub async fn get_machine_activities(
    path: web::Path<i64>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    match activities.find_published_for_machine(path.into_inner()).await {
        Ok(list) => Ok(success_response(list)),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}

/// 查询活动报名人数
pub async fn get_register_count(
    path: web::Path<i64>,
    activities: web::Data<Arc<ActivityService>>,
) -> ActixResult<impl Responder> {
    let activity_id = path.into_inner();
    match activities.register_count(activity_id).await {
        Ok(registered_count) => Ok(success_response(RegisterCountResponse {
            activity_id,
            registered_count,
        })),
        Err(e) => Ok(error_from_tuangou(&e)),
    }
}
