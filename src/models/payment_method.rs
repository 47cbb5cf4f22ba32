// 支付方式数据模型
// SIPS 支付方式保存买家选择的卡组织，以及最近一次的封印和响应码

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::PaymentBrand;

/// 支付方式模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PaymentMethod {
    /// 支付方式ID
    pub id: i64,
    /// 所属支付网关
    pub payment_gateway: String,
    /// 卡组织选项 (VISA、MASTERCARD 等)
    pub payment_option: String,
    /// 最近一次SIPS响应码
    pub response_code: Option<String>,
    /// 最近一次请求使用的封印
    pub seal: Option<String>,
    /// 是否可复用
    pub reusable: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    /// 展示用标签
    pub fn label(&self) -> String {
        format!("SIPS option: {}", self.payment_option)
    }
}

/// 待创建的支付方式
#[derive(Debug, Clone)]
pub struct NewPaymentMethod {
    pub payment_gateway: String,
    pub payment_option: PaymentBrand,
    pub created_at: DateTime<Utc>,
}

/// 创建支付方式请求
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePaymentMethodRequest {
    /// 网关特定的支付信息，必须包含 payment_option
    pub payment_details: HashMap<String, String>,
}

/// 为订单选择支付方式的请求
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectPaymentMethodRequest {
    pub payment_method_id: i64,
}

/// 支付方式查询响应
#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub id: i64,
    pub label: String,
    pub payment_option: String,
    pub payment_gateway: String,
    pub reusable: bool,
    pub created_at: DateTime<Utc>,
}

/// 可选的卡组织
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PaymentOption {
    pub key: &'static str,
    pub label: &'static str,
}

/// 买家可选择的卡组织列表
pub fn payment_options() -> Vec<PaymentOption> {
    [PaymentBrand::Visa, PaymentBrand::Mastercard, PaymentBrand::Maestro]
        .iter()
        .map(|brand| PaymentOption {
            key: brand.as_str(),
            label: brand.label(),
        })
        .collect()
}

impl From<&PaymentMethod> for PaymentMethodResponse {
    fn from(method: &PaymentMethod) -> Self {
        Self {
            id: method.id,
            label: method.label(),
            payment_option: method.payment_option.clone(),
            payment_gateway: method.payment_gateway.clone(),
            reusable: method.reusable,
            created_at: method.created_at,
        }
    }
}
