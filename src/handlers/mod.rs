// HTTP处理器模块
// 包含结账流程、支付方式管理和健康检查

pub mod checkout_handlers;
pub mod health_handlers;
pub mod payment_method_handlers;

// 重新导出处理器
pub use checkout_handlers::*;
pub use health_handlers::*;
pub use payment_method_handlers::*;
