// 结账流程处理器
// 发起SIPS跳转、接收买家回跳、选择支付方式

use actix_web::{
    cookie::Cookie, http::header, web, HttpResponse, Result as ActixResult,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use uuid::Uuid;

use crate::models::{ApiResponse, SelectPaymentMethodRequest};
use crate::services::{CallbackOutcome, InitiateOutcome};
use crate::state::AppState;

/// 买家提示的 cookie 名称，值为 base64url 编码的文本
pub const FLASH_COOKIE: &str = "sips_message";

/// 站内跳转，可附带一次性提示
fn redirect_with_message(location: &str, message: Option<&str>) -> HttpResponse {
    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, location.to_string()));

    if let Some(message) = message {
        let cookie = Cookie::build(FLASH_COOKIE, URL_SAFE_NO_PAD.encode(message))
            .path("/")
            .http_only(true)
            .finish();
        response.cookie(cookie);
    }

    response.finish()
}

/// 发起SIPS支付并输出跳转页面
///
/// POST /checkout/{order_id}/sips/redirect
///
/// 响应: SIPS返回的HTML，或校验失败时跳转到购物车
pub async fn sips_redirect(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let order_id = path.into_inner();

    match data.payment_service().initiate_payment(order_id).await? {
        InitiateOutcome::Render(body) => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body)),
        InitiateOutcome::Abort { redirect, message, .. } => Ok(redirect_with_message(
            &redirect.to_path(&data.config.checkout.cart_path),
            Some(&message),
        )),
    }
}

fn callback_response(data: &AppState, outcome: CallbackOutcome) -> HttpResponse {
    redirect_with_message(
        &outcome.redirect.to_path(&data.config.checkout.cart_path),
        outcome.message.as_deref(),
    )
}

/// 买家从SIPS回跳 (GET)
///
/// GET /checkout/{order_id}/payment/{payment_id}/sips/return
pub async fn sips_return_get(
    data: web::Data<AppState>,
    path: web::Path<(i64, Uuid)>,
    query: web::Query<Vec<(String, String)>>,
) -> ActixResult<HttpResponse> {
    let (order_id, payment_id) = path.into_inner();

    let outcome = data
        .payment_service()
        .handle_callback(order_id, payment_id, query.into_inner())
        .await?;

    Ok(callback_response(&data, outcome))
}

/// 买家从SIPS回跳 (POST)
///
/// POST /checkout/{order_id}/payment/{payment_id}/sips/return
///
/// 查询串和表单参数合并后一起校验
pub async fn sips_return_post(
    data: web::Data<AppState>,
    path: web::Path<(i64, Uuid)>,
    query: web::Query<Vec<(String, String)>>,
    form: web::Form<Vec<(String, String)>>,
) -> ActixResult<HttpResponse> {
    let (order_id, payment_id) = path.into_inner();

    let mut raw = query.into_inner();
    raw.extend(form.into_inner());

    let outcome = data
        .payment_service()
        .handle_callback(order_id, payment_id, raw)
        .await?;

    Ok(callback_response(&data, outcome))
}

/// 为订单选择支付方式
///
/// POST /checkout/{order_id}/payment-information
///
/// 请求体: SelectPaymentMethodRequest
pub async fn select_payment_information(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<SelectPaymentMethodRequest>,
) -> ActixResult<HttpResponse> {
    let order = data
        .payment_method_service()
        .select_for_order(path.into_inner(), request.payment_method_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(order)))
}
