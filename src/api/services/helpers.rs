//! API 帮助函数

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::errors::TuangouError;

use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: i32,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, 0, "OK", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, code: i32, message: &str) -> HttpResponse {
    json_response::<()>(status, code, message, None)
}

/// 从 TuangouError 构建错误响应（自动映射 HTTP 状态码）
pub fn error_from_tuangou(err: &TuangouError) -> HttpResponse {
    error_response(err.http_status(), numeric_code(err), err.message())
}

fn numeric_code(err: &TuangouError) -> i32 {
    // "E007" -> 7
    err.code().trim_start_matches('E').parse().unwrap_or(-1)
}

/// 取上游网关写入的 X-User-Id 头
pub fn require_user_id(req: &HttpRequest) -> Result<i64, HttpResponse> {
    req.headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            error_response(StatusCode::UNAUTHORIZED, -1, "missing or invalid X-User-Id")
        })
}
