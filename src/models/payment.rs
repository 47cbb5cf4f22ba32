// 支付记录数据模型
// 定义支付尝试的状态机：new/pending -> capture_completed/done 或 void/failed

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{OperatingMode, Order};

/// 授权有效期 (小时)
pub const AUTHORIZATION_WINDOW_HOURS: i64 = 24;

/// 支付记录模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    /// 支付记录唯一标识符
    pub id: Uuid,
    /// 关联订单ID
    pub order_id: i64,
    /// 关联支付方式ID
    pub payment_method_id: i64,
    /// 支付网关标识
    pub payment_gateway: String,
    /// 本地状态
    pub state: PaymentState,
    /// 远端(SIPS)状态
    pub remote_state: RemoteState,
    /// 交易参考号，用于与SIPS回调关联
    pub remote_id: String,
    /// 支付金额
    pub amount: Decimal,
    /// 支付币种
    pub currency: String,
    /// 授权过期时间 (仅供外部清理任务参考)
    pub authorization_expires: DateTime<Utc>,
    /// 是否为测试交易
    pub test: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 本地支付状态
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
pub enum PaymentState {
    #[sqlx(rename = "new")]
    #[serde(rename = "new")]
    New,
    #[sqlx(rename = "capture_completed")]
    #[serde(rename = "capture_completed")]
    CaptureCompleted,
    #[sqlx(rename = "void")]
    #[serde(rename = "void")]
    Void,
}

/// 远端支付状态
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
pub enum RemoteState {
    /// 买家仍在SIPS页面，或中途放弃
    #[sqlx(rename = "pending")]
    #[serde(rename = "pending")]
    Pending,
    #[sqlx(rename = "done")]
    #[serde(rename = "done")]
    Done,
    #[sqlx(rename = "failed")]
    #[serde(rename = "failed")]
    Failed,
}

impl Default for PaymentState {
    fn default() -> Self {
        PaymentState::New
    }
}

impl Default for RemoteState {
    fn default() -> Self {
        RemoteState::Pending
    }
}

/// 支付的终态结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentResolution {
    /// 授权成功
    Completed,
    /// 授权失败
    Voided,
}

impl PaymentResolution {
    pub fn states(&self) -> (PaymentState, RemoteState) {
        match self {
            PaymentResolution::Completed => (PaymentState::CaptureCompleted, RemoteState::Done),
            PaymentResolution::Voided => (PaymentState::Void, RemoteState::Failed),
        }
    }
}

/// 待创建的支付记录
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub order_id: i64,
    pub payment_method_id: i64,
    pub payment_gateway: String,
    pub remote_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub authorization_expires: DateTime<Utc>,
    pub test: bool,
    pub created_at: DateTime<Utc>,
}

impl NewPayment {
    /// 为订单创建一次新的支付尝试
    ///
    /// 交易参考号由订单ID、当前时间戳和本次尝试的后缀拼接而成，
    /// 同一秒内的多次尝试也不会重复
    pub fn for_order(
        order: &Order,
        payment_method_id: i64,
        payment_gateway: &str,
        mode: OperatingMode,
        now: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            order_id: order.id,
            payment_method_id,
            payment_gateway: payment_gateway.to_string(),
            remote_id: format!("{}{}{}", order.id, now.timestamp(), attempt_suffix(&id)),
            amount: order.total,
            currency: order.currency.clone(),
            authorization_expires: now + Duration::hours(AUTHORIZATION_WINDOW_HOURS),
            test: mode != OperatingMode::Production,
            created_at: now,
        }
    }

    pub fn into_payment(self) -> Payment {
        Payment {
            id: self.id,
            order_id: self.order_id,
            payment_method_id: self.payment_method_id,
            payment_gateway: self.payment_gateway,
            state: PaymentState::New,
            remote_state: RemoteState::Pending,
            remote_id: self.remote_id,
            amount: self.amount,
            currency: self.currency,
            authorization_expires: self.authorization_expires,
            test: self.test,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// 参考号后缀长度
const ATTEMPT_SUFFIX_LEN: usize = 6;

/// 由支付ID派生的定长 base36 后缀
///
/// 订单ID(最多19位) + 时间戳(10位) + 后缀(6位) 不超过 35 个字符
fn attempt_suffix(id: &Uuid) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut value = id.as_u128();
    let mut suffix = [b'0'; ATTEMPT_SUFFIX_LEN];
    for slot in suffix.iter_mut().rev() {
        *slot = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    suffix.iter().map(|&b| b as char).collect()
}

impl Payment {
    /// 是否仍可接受回调
    pub fn is_pending(&self) -> bool {
        self.state == PaymentState::New && self.remote_state == RemoteState::Pending
    }

    /// 授权是否已过期
    pub fn is_authorization_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.authorization_expires
    }

    /// 应用终态结果
    ///
    /// 只允许从 new/pending 流转一次，返回是否发生了流转
    pub fn resolve(&mut self, resolution: PaymentResolution, now: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        let (state, remote_state) = resolution.states();
        self.state = state;
        self.remote_state = remote_state;
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderState;
    use crate::utils::{validate_transaction_reference, MAX_TRANSACTION_REFERENCE_LENGTH};

    fn order() -> Order {
        Order {
            id: 42,
            total: Decimal::new(1999, 2),
            currency: "EUR".to_string(),
            language: "en".to_string(),
            checkout_step: "order_information".to_string(),
            state: OrderState::Draft,
            payment_gateway: Some("sips_payment".to_string()),
            payment_method_id: Some(3),
            placed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_payment_for_order() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let new_payment = NewPayment::for_order(&order(), 3, "sips_payment", OperatingMode::Test, now);

        assert!(new_payment.remote_id.starts_with(&format!("42{}", now.timestamp())));
        assert_eq!(new_payment.remote_id.len(), 2 + 10 + ATTEMPT_SUFFIX_LEN);
        assert_eq!(new_payment.authorization_expires, now + Duration::hours(24));
        assert!(new_payment.test);
        assert_eq!(new_payment.amount, Decimal::new(1999, 2));

        let production = NewPayment::for_order(&order(), 3, "sips_payment", OperatingMode::Production, now);
        assert!(!production.test);

        let id = new_payment.id;
        let payment = new_payment.into_payment();
        assert_eq!(payment.id, id);
        assert_eq!(payment.state, PaymentState::New);
        assert_eq!(payment.remote_state, RemoteState::Pending);
        assert!(!payment.is_authorization_expired(now + Duration::hours(23)));
        assert!(payment.is_authorization_expired(now + Duration::hours(25)));
    }

    #[test]
    fn test_resolve_happens_once() {
        let now = Utc::now();
        let mut payment = NewPayment::for_order(&order(), 3, "sips_payment", OperatingMode::Test, now)
            .into_payment();

        assert!(payment.resolve(PaymentResolution::Completed, now));
        assert_eq!(payment.state, PaymentState::CaptureCompleted);
        assert_eq!(payment.remote_state, RemoteState::Done);

        // 终态之后不再流转
        assert!(!payment.resolve(PaymentResolution::Voided, now));
        assert_eq!(payment.state, PaymentState::CaptureCompleted);
        assert_eq!(payment.remote_state, RemoteState::Done);
    }

    #[test]
    fn test_references_differ_within_the_same_second() {
        let now = Utc::now();
        let first = NewPayment::for_order(&order(), 3, "sips_payment", OperatingMode::Test, now);
        let second = NewPayment::for_order(&order(), 3, "sips_payment", OperatingMode::Test, now);

        assert_ne!(first.remote_id, second.remote_id);
        assert!(validate_transaction_reference(&first.remote_id));
        assert!(validate_transaction_reference(&second.remote_id));
    }

    #[test]
    fn test_longest_reference_fits() {
        let mut order = order();
        order.id = i64::MAX;
        let new_payment = NewPayment::for_order(&order, 3, "sips_payment", OperatingMode::Test, Utc::now());

        assert_eq!(new_payment.remote_id.len(), MAX_TRANSACTION_REFERENCE_LENGTH);
        assert!(validate_transaction_reference(&new_payment.remote_id));
    }

    #[test]
    fn test_attempt_suffix() {
        assert_eq!(attempt_suffix(&Uuid::nil()), "000000");
        assert_eq!(attempt_suffix(&Uuid::from_u128(35)), "00000Z");
        assert_eq!(attempt_suffix(&Uuid::from_u128(36)), "000010");
    }

    #[test]
    fn test_voided_states() {
        assert_eq!(
            PaymentResolution::Voided.states(),
            (PaymentState::Void, RemoteState::Failed)
        );
    }
}
