// 应用状态管理
// 包含存储、SIPS客户端、配置信息等全局状态

use std::sync::Arc;

use crate::config::Config;
use crate::services::{GatewayClient, PaymentMethodService, PaymentService};
use crate::storage::CheckoutStore;

/// 应用全局状态
pub struct AppState {
    /// 订单、支付记录和支付方式的存储
    pub store: Arc<dyn CheckoutStore>,
    /// SIPS平台客户端
    pub gateway: Arc<dyn GatewayClient>,
    /// 应用配置
    pub config: Config,
}

impl AppState {
    /// 创建新的应用状态实例
    ///
    /// # Arguments
    /// * `store` - 存储实现
    /// * `gateway` - SIPS平台客户端
    /// * `config` - 应用配置
    ///
    /// # Returns
    /// * 应用状态实例
    pub fn new(store: Arc<dyn CheckoutStore>, gateway: Arc<dyn GatewayClient>, config: Config) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(
            self.store.clone(),
            self.gateway.clone(),
            self.config.sips.clone(),
            self.config.checkout.clone(),
            self.config.server.public_base_url.clone(),
        )
    }

    pub fn payment_method_service(&self) -> PaymentMethodService {
        PaymentMethodService::new(self.store.clone(), self.config.sips.gateway_id.clone())
    }

    /// 创建测试用的应用状态
    #[cfg(test)]
    pub fn new_for_test(
        store: Arc<crate::storage::MemoryCheckoutStore>,
        gateway: Arc<crate::services::sips_client::testing::ScriptedGateway>,
    ) -> Self {
        use crate::utils::Passphrase;

        let mut config = Config::default();
        config.sips.passphrase = Passphrase::new("test_passphrase");
        config.sips.merchant_id = "011223344550000".to_string();
        config.server.public_base_url = "https://shop.example.com".to_string();

        Self::new(store, gateway, config)
    }
}

