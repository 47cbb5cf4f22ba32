// 健康检查处理器
// 提供服务状态和存储连通性查询

use actix_web::{http::StatusCode, web, HttpResponse, Result as ActixResult};
use serde::Serialize;

use crate::state::AppState;

/// 系统健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 版本信息
    pub version: String,
    /// 数据库连接状态
    pub database: String,
    /// SIPS运行模式
    pub sips_mode: String,
    /// 当前时间戳
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// 基础健康检查
///
/// GET /health
///
/// 响应: HealthResponse
pub async fn health_check(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let mut health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "connected".to_string(),
        sips_mode: data.config.sips.mode.to_string(),
        timestamp: chrono::Utc::now(),
    };

    if let Err(e) = data.store.ping().await {
        log::error!("Database health check failed: {}", e);
        health.database = "disconnected".to_string();
        health.status = "unhealthy".to_string();
    }

    let status_code = if health.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok(HttpResponse::build(status_code).json(health))
}
