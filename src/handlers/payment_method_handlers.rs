// 支付方式API处理器
// 处理SIPS支付方式的创建、删除以及可选卡组织查询

use actix_web::{web, HttpResponse, Result as ActixResult};

use crate::models::{ApiResponse, CreatePaymentMethodRequest, PaymentMethodResponse};
use crate::state::AppState;

/// 创建支付方式
///
/// POST /api/v1/payment-methods
///
/// 请求体: CreatePaymentMethodRequest
/// 响应: PaymentMethodResponse
pub async fn create_payment_method(
    data: web::Data<AppState>,
    request: web::Json<CreatePaymentMethodRequest>,
) -> ActixResult<HttpResponse> {
    let method = data
        .payment_method_service()
        .create_payment_method(request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(PaymentMethodResponse::from(&method))))
}

/// 删除支付方式
///
/// DELETE /api/v1/payment-methods/{method_id}
pub async fn delete_payment_method(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let method_id = path.into_inner();
    data.payment_method_service()
        .delete_payment_method(method_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "id": method_id,
        "deleted": true
    }))))
}

/// 可选卡组织列表
///
/// GET /api/v1/payment-methods/options
pub async fn payment_method_options(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(data.payment_method_service().options())))
}
