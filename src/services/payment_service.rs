// 支付服务
// 负责发起SIPS跳转支付，以及处理买家回跳时的校验和状态流转

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{CheckoutConfig, SipsConfig};
use crate::errors::{SipsError, ValidationError};
use crate::models::{
    response_code_description, CheckoutFlow, NewPayment, Order, OrderTransition, Payment,
    PaymentMethod, PaymentResolution, PaymentResponse, PaymentState, RedirectTarget,
};
use crate::services::request_builder::build_payment_request;
use crate::services::response_validator;
use crate::services::sips_client::GatewayClient;
use crate::storage::CheckoutStore;

/// 校验失败、重放等情况下展示给买家的通用提示
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// 发起支付的结果
#[derive(Debug)]
pub enum InitiateOutcome {
    /// SIPS 返回的跳转页面，原样输出给买家
    Render(String),
    /// 请求未通过校验，未联系SIPS
    Abort {
        redirect: RedirectTarget,
        message: String,
        reason: SipsError,
    },
}

/// 回跳处理结果
#[derive(Debug)]
pub struct CallbackOutcome {
    pub redirect: RedirectTarget,
    /// 展示给买家的提示
    pub message: Option<String>,
    /// 内部错误分类，只用于日志和测试
    pub error: Option<SipsError>,
}

impl CallbackOutcome {
    fn to_cart(message: Option<&str>, error: Option<SipsError>) -> Self {
        Self {
            redirect: RedirectTarget::Cart,
            message: message.map(str::to_string),
            error,
        }
    }
}

/// 支付服务
pub struct PaymentService {
    store: Arc<dyn CheckoutStore>,
    gateway: Arc<dyn GatewayClient>,
    sips: SipsConfig,
    checkout: CheckoutConfig,
    public_base_url: String,
}

impl PaymentService {
    /// 创建新的支付服务实例
    pub fn new(
        store: Arc<dyn CheckoutStore>,
        gateway: Arc<dyn GatewayClient>,
        sips: SipsConfig,
        checkout: CheckoutConfig,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            gateway,
            sips,
            checkout,
            public_base_url,
        }
    }

    fn flow(&self) -> &CheckoutFlow {
        &self.checkout.flow
    }

    /// 买家回跳地址
    fn return_url(&self, order_id: i64, payment_id: Uuid) -> String {
        format!(
            "{}/checkout/{}/payment/{}/sips/return",
            self.public_base_url.trim_end_matches('/'),
            order_id,
            payment_id
        )
    }

    /// 发起SIPS支付
    ///
    /// # Arguments
    /// * `order_id` - 订单ID
    ///
    /// # Returns
    /// * 待渲染的跳转页面，或校验失败时的回退跳转
    /// * 下发失败时返回 `SipsError::Dispatch`，支付记录保持 pending
    pub async fn initiate_payment(&self, order_id: i64) -> Result<InitiateOutcome, SipsError> {
        self.sips
            .validate()
            .map_err(|e| SipsError::Configuration(e.to_string()))?;

        let order = self
            .store
            .load_order(order_id)
            .await?
            .ok_or_else(|| SipsError::NotFound(format!("order {}", order_id)))?;

        let mut payment_method = match self.selected_payment_method(&order).await? {
            Ok(method) => method,
            Err(reason) => {
                log::warn!("Order {} cannot be sent to SIPS: {}", order.id, reason);
                return Ok(InitiateOutcome::Abort {
                    redirect: RedirectTarget::Cart,
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                    reason: reason.into(),
                });
            }
        };

        let payment = self
            .store
            .insert_payment(NewPayment::for_order(
                &order,
                payment_method.id,
                &self.sips.gateway_id,
                self.sips.mode,
                Utc::now(),
            ))
            .await?;

        log::info!(
            "Created payment {} for order {} with reference {}",
            payment.id,
            order.id,
            payment.remote_id
        );

        let request = match build_payment_request(
            &order.snapshot(),
            &self.sips,
            &payment.remote_id,
            &payment_method.payment_option,
            &self.return_url(order.id, payment.id),
        ) {
            Ok(request) => request,
            Err(SipsError::Validation(reason)) => {
                log::warn!("Payment request did not validate. Reason: {}", reason);
                return Ok(InitiateOutcome::Abort {
                    redirect: RedirectTarget::Cart,
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                    reason: SipsError::Validation(reason),
                });
            }
            Err(e) => return Err(e),
        };

        // 保存本次请求的封印以便对账
        payment_method.seal = request.seal().map(str::to_string);
        self.store.save_payment_method(&payment_method).await?;

        match self.gateway.dispatch(&request).await {
            Ok(body) => {
                log::info!(
                    "Redirecting order {} to SIPS ({})",
                    order.id,
                    self.sips.mode
                );
                Ok(InitiateOutcome::Render(body))
            }
            Err(e) => {
                log::error!(
                    "Failed to dispatch payment {} for order {}: {}",
                    payment.id,
                    order.id,
                    e
                );
                Err(e)
            }
        }
    }

    /// 订单选定的SIPS支付方式
    ///
    /// 外层错误为存储错误，内层错误说明订单无法发起支付的原因
    async fn selected_payment_method(
        &self,
        order: &Order,
    ) -> Result<Result<PaymentMethod, ValidationError>, SipsError> {
        if order.payment_gateway.as_deref() != Some(self.sips.gateway_id.as_str()) {
            return Ok(Err(ValidationError::single(
                "payment_gateway",
                "Order is not set up for the SIPS gateway",
            )));
        }

        let method_id = match order.payment_method_id {
            Some(id) => id,
            None => {
                return Ok(Err(ValidationError::single(
                    "payment_method",
                    "Order has no payment method",
                )))
            }
        };

        Ok(self
            .store
            .load_payment_method(method_id)
            .await?
            .ok_or_else(|| {
                ValidationError::single("payment_method", "Payment method does not exist")
            }))
    }

    /// 处理买家从SIPS回跳
    ///
    /// # Arguments
    /// * `order_id` - 回跳地址中的订单ID
    /// * `payment_id` - 回跳地址中的支付记录ID
    /// * `raw` - 回跳携带的全部参数 (查询串和表单)
    ///
    /// # Returns
    /// * 跳转目标和提示；只有存储错误才返回 Err
    pub async fn handle_callback(
        &self,
        order_id: i64,
        payment_id: Uuid,
        raw: Vec<(String, String)>,
    ) -> Result<CallbackOutcome, SipsError> {
        let order = match self.store.load_order(order_id).await? {
            Some(order) => order,
            None => {
                log::warn!("SIPS return received for unknown order {}", order_id);
                return Ok(CallbackOutcome::to_cart(
                    None,
                    Some(SipsError::NotFound(format!("order {}", order_id))),
                ));
            }
        };

        let payment = match self.store.load_payment(payment_id).await? {
            Some(payment) if payment.state == PaymentState::New => payment,
            _ => {
                log::warn!(
                    "SIPS return for order {} without a valid payment ({})",
                    order_id,
                    payment_id
                );
                return Ok(CallbackOutcome::to_cart(None, Some(SipsError::Replay(payment_id))));
            }
        };

        if payment.order_id != order.id {
            log::warn!(
                "Payment {} does not belong to order {}",
                payment.id,
                order.id
            );
            return Ok(CallbackOutcome::to_cart(
                None,
                Some(SipsError::NotFound(format!("payment {}", payment_id))),
            ));
        }

        // 过期时间只作提示，清理由外部任务负责
        if payment.is_authorization_expired(Utc::now()) {
            log::warn!(
                "SIPS return for payment {} after its authorization expired at {}",
                payment.id,
                payment.authorization_expires
            );
        }

        let response = PaymentResponse::from_raw(raw);
        let result = response_validator::validate(
            &response,
            &payment.remote_id,
            payment.remote_state,
            &self.sips.composer(),
        );

        if let Some(error) = result.to_error(payment.id) {
            if matches!(error, SipsError::Replay(_)) {
                log::warn!("Suspicious SIPS return for already resolved payment {}", payment.id);
            }
            return Ok(CallbackOutcome::to_cart(Some(GENERIC_ERROR_MESSAGE), Some(error)));
        }

        let resolution = if result.successful {
            PaymentResolution::Completed
        } else {
            PaymentResolution::Voided
        };

        // 先在副本上推进结账流程，订单无法下单时不写入任何状态
        let mut updated = order.clone();
        let redirect = match resolution {
            PaymentResolution::Completed => match self.advance_checkout(&mut updated) {
                Ok(redirect) => redirect,
                Err(e) => {
                    log::error!(
                        "Order {} cannot be placed for payment {}: {}",
                        order.id,
                        payment.id,
                        e
                    );
                    return Ok(CallbackOutcome::to_cart(Some(GENERIC_ERROR_MESSAGE), Some(e)));
                }
            },
            PaymentResolution::Voided => self.revert_checkout(&mut updated),
        };

        // 条件写入：并发回调中只有一个能完成流转
        if !self.store.resolve_payment(payment.id, resolution).await? {
            log::warn!(
                "Suspicious SIPS return: payment {} was resolved concurrently",
                payment.id
            );
            return Ok(CallbackOutcome::to_cart(
                Some(GENERIC_ERROR_MESSAGE),
                Some(SipsError::Replay(payment.id)),
            ));
        }

        let code = result.response_code.clone().unwrap_or_default();
        self.record_response_code(&payment, &code).await?;

        match resolution {
            PaymentResolution::Completed => {
                log::info!("Payment {} for order {} completed", payment.id, order.id);
                if updated.state != order.state {
                    log::info!("Order {} placed", order.id);
                }
                self.store.save_order(&updated).await?;
                Ok(CallbackOutcome {
                    redirect,
                    message: None,
                    error: None,
                })
            }
            PaymentResolution::Voided => {
                let description = response_code_description(&code);
                log::info!(
                    "Payment {} for order {} declined: [{}] {}",
                    payment.id,
                    order.id,
                    code,
                    description
                );
                self.store.save_order(&updated).await?;
                Ok(CallbackOutcome {
                    redirect,
                    message: Some(format!(
                        "An error occurred in the SIPS platform: [{}] {}",
                        code, description
                    )),
                    error: Some(SipsError::Declined { code, description }),
                })
            }
        }
    }

    /// 记录响应码到支付方式
    async fn record_response_code(&self, payment: &Payment, code: &str) -> Result<(), SipsError> {
        match self.store.load_payment_method(payment.payment_method_id).await? {
            Some(mut method) => {
                method.response_code = Some(code.to_string());
                self.store.save_payment_method(&method).await?;
            }
            None => log::warn!(
                "Payment method {} of payment {} no longer exists",
                payment.payment_method_id,
                payment.id
            ),
        }
        Ok(())
    }

    /// 成功后前进一步；下一步为 complete 时下单
    fn advance_checkout(&self, order: &mut Order) -> Result<RedirectTarget, SipsError> {
        let next_step = self
            .flow()
            .next_step_id(&order.checkout_step)
            .map(str::to_string);

        if let Some(next_step) = next_step {
            if CheckoutFlow::is_complete_step(&next_step) {
                order.apply_transition(OrderTransition::Place)?;
            }
            order.checkout_step = next_step;
        }

        Ok(RedirectTarget::CheckoutStep {
            order_id: order.id,
            step: order.checkout_step.clone(),
        })
    }

    /// 失败后回退一步，买家可以重新发起支付
    fn revert_checkout(&self, order: &mut Order) -> RedirectTarget {
        if let Some(previous) = self.flow().previous_step_id(&order.checkout_step) {
            order.checkout_step = previous.to_string();
        }

        RedirectTarget::CheckoutStep {
            order_id: order.id,
            step: order.checkout_step.clone(),
        }
    }
}
