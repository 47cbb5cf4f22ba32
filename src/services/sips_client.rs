// SIPS 平台客户端
// 将封印后的支付请求以表单形式提交到当前模式对应的端点

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::errors::SipsError;
use crate::models::PaymentRequest;

const USER_AGENT: &str = "SipsOffsite/1.0";

/// 出站下发接口
///
/// 成功时返回平台生成的跳转页面，原样交给买家浏览器
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn dispatch(&self, request: &PaymentRequest) -> Result<String, SipsError>;
}

/// 基于 reqwest 的 SIPS 客户端
#[derive(Clone)]
pub struct SipsClient {
    client: Client,
}

impl SipsClient {
    /// 创建客户端
    ///
    /// # Arguments
    /// * `timeout` - 请求超时时间 (秒)
    pub fn new(timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl GatewayClient for SipsClient {
    async fn dispatch(&self, request: &PaymentRequest) -> Result<String, SipsError> {
        let seal = request
            .seal()
            .ok_or_else(|| SipsError::Dispatch("Payment request has not been sealed".to_string()))?;

        let data = request.to_parameter_string();
        let form = [
            ("Data", data.as_str()),
            ("InterfaceVersion", request.interface_version.as_str()),
            ("Seal", seal),
        ];

        let start_time = std::time::Instant::now();

        let response = self
            .client
            .post(request.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| SipsError::Dispatch(format!("Failed to reach {}: {}", request.endpoint(), e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SipsError::Dispatch(format!("Failed to read response body: {}", e)))?;

        log::info!(
            "SIPS responded {} for transaction {} in {}ms",
            status.as_u16(),
            request.transaction_reference,
            start_time.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(SipsError::Dispatch(format!(
                "SIPS returned status {}",
                status.as_u16()
            )));
        }

        Ok(body)
    }
}
