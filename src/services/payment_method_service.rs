// 支付方式服务
// 负责SIPS支付方式的创建、删除，以及结账时为订单选定支付方式

use std::sync::Arc;

use chrono::Utc;

use crate::errors::{SipsError, ValidationError};
use crate::models::{
    payment_options, CreatePaymentMethodRequest, NewPaymentMethod, Order, PaymentBrand,
    PaymentMethod, PaymentOption,
};
use crate::storage::CheckoutStore;

/// 创建请求中必须提供的字段
const PAYMENT_OPTION_FIELD: &str = "payment_option";

/// 支付方式服务
pub struct PaymentMethodService {
    store: Arc<dyn CheckoutStore>,
    gateway_id: String,
}

impl PaymentMethodService {
    pub fn new(store: Arc<dyn CheckoutStore>, gateway_id: String) -> Self {
        Self { store, gateway_id }
    }

    /// 可选的卡组织
    pub fn options(&self) -> Vec<PaymentOption> {
        payment_options()
    }

    /// 创建支付方式
    ///
    /// # Arguments
    /// * `request` - 包含 payment_option 的支付信息
    ///
    /// # Returns
    /// * 新建的 (不可复用的) 支付方式
    pub async fn create_payment_method(
        &self,
        request: CreatePaymentMethodRequest,
    ) -> Result<PaymentMethod, SipsError> {
        let option = request
            .payment_details
            .get(PAYMENT_OPTION_FIELD)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ValidationError::single(PAYMENT_OPTION_FIELD, "This field is required")
            })?;

        let brand: PaymentBrand = option.parse().map_err(|_| {
            ValidationError::single(
                PAYMENT_OPTION_FIELD,
                &format!("Unsupported payment option '{}'", option),
            )
        })?;

        if !payment_options().iter().any(|offered| offered.key == brand.as_str()) {
            return Err(ValidationError::single(
                PAYMENT_OPTION_FIELD,
                &format!("Payment option '{}' is not offered", brand.as_str()),
            )
            .into());
        }

        let method = self
            .store
            .insert_payment_method(NewPaymentMethod {
                payment_gateway: self.gateway_id.clone(),
                payment_option: brand,
                created_at: Utc::now(),
            })
            .await?;

        log::info!("Created payment method {} ({})", method.id, method.label());
        Ok(method)
    }

    /// 删除支付方式
    pub async fn delete_payment_method(&self, method_id: i64) -> Result<(), SipsError> {
        if !self.store.delete_payment_method(method_id).await? {
            return Err(SipsError::NotFound(format!("payment method {}", method_id)));
        }

        log::info!("Deleted payment method {}", method_id);
        Ok(())
    }

    /// 为订单选定支付方式，同时写入网关
    ///
    /// 订单总价为零时不需要支付信息
    pub async fn select_for_order(
        &self,
        order_id: i64,
        method_id: i64,
    ) -> Result<Order, SipsError> {
        let mut order = self
            .store
            .load_order(order_id)
            .await?
            .ok_or_else(|| SipsError::NotFound(format!("order {}", order_id)))?;

        if !order.requires_payment() {
            return Err(ValidationError::single(
                "payment_method",
                "Order total is zero, no payment information is needed",
            )
            .into());
        }

        let method = self
            .store
            .load_payment_method(method_id)
            .await?
            .ok_or_else(|| SipsError::NotFound(format!("payment method {}", method_id)))?;

        if method.payment_gateway != self.gateway_id {
            return Err(ValidationError::single(
                "payment_method",
                "Payment method belongs to another gateway",
            )
            .into());
        }

        order.payment_gateway = Some(method.payment_gateway.clone());
        order.payment_method_id = Some(method.id);
        self.store.save_order(&order).await?;

        log::info!("Order {} will be paid with {}", order.id, method.label());
        Ok(order)
    }
}
