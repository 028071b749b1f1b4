//! 健康检查

use actix_web::{HttpResponse, Responder, Result as ActixResult};
use serde::Serialize;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

pub async fn health_check() -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
