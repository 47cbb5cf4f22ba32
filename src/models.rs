// SIPS 线下跳转支付数据模型定义
// 包含订单、结账流程、支付记录、支付方式以及SIPS请求/响应报文

mod checkout;
mod order;
mod payment;
mod payment_method;
mod sips_request;
mod sips_response;

// 重新导出核心类型
pub use checkout::*;
pub use order::*;
pub use payment::*;
pub use payment_method::*;
pub use sips_request::*;
pub use sips_response::*;

use serde::Serialize;

/// 标准API响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 响应状态码
    pub code: i32,
    /// 响应消息
    pub message: String,
    /// 响应数据
    pub data: Option<T>,
    /// 响应时间戳
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }

    /// 创建错误响应
    pub fn error(code: i32, message: String) -> ApiResponse<()> {
        ApiResponse {
            code,
            message,
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }
}
