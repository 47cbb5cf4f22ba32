// 服务层模块
// 包含请求构造、平台下发、回调校验和支付状态流转

pub mod payment_method_service;
pub mod payment_service;
pub mod request_builder;
pub mod response_validator;
pub mod sips_client;

// 重新导出服务
pub use payment_method_service::PaymentMethodService;
pub use payment_service::{CallbackOutcome, InitiateOutcome, PaymentService};
pub use sips_client::{GatewayClient, SipsClient};
