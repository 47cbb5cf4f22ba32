// API路由配置
// 定义所有HTTP接口的路由规则

use actix_web::{web, Scope};

use crate::handlers::*;

/// API v1路由配置
pub fn api_v1_routes() -> Scope {
    web::scope("/api/v1")
        // 支付方式路由
        .service(payment_method_routes())
}

/// 支付方式路由
fn payment_method_routes() -> Scope {
    // options 必须先于 {method_id} 注册
    web::scope("/payment-methods")
        .route("", web::post().to(create_payment_method))
        .route("/options", web::get().to(payment_method_options))
        .route("/{method_id}", web::delete().to(delete_payment_method))
}

/// 结账流程路由 (买家浏览器访问)
pub fn checkout_routes() -> Scope {
    web::scope("/checkout/{order_id}")
        .route("/payment-information", web::post().to(select_payment_information))
        .route("/sips/redirect", web::post().to(sips_redirect))
        .route(
            "/payment/{payment_id}/sips/return",
            web::get().to(sips_return_get),
        )
        .route(
            "/payment/{payment_id}/sips/return",
            web::post().to(sips_return_post),
        )
}

/// 公共路由
pub fn public_routes() -> Scope {
    web::scope("")
        .route("/health", web::get().to(health_check))
}
