// 订单数据模型
// 订单由宿主商城维护，这里只读取快照并驱动结账步骤和 place 流转

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::ValidationError;

/// 订单模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Order {
    /// 订单ID
    pub id: i64,
    /// 订单总价
    pub total: Decimal,
    /// 币种 (ISO 4217 字母代码)
    pub currency: String,
    /// 订单语言 (ISO 639-1)
    pub language: String,
    /// 当前结账步骤
    pub checkout_step: String,
    /// 订单工作流状态
    pub state: OrderState,
    /// 选定的支付网关
    pub payment_gateway: Option<String>,
    /// 选定的支付方式
    pub payment_method_id: Option<i64>,
    /// 下单时间
    pub placed_at: Option<DateTime<Utc>>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 订单工作流状态
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
pub enum OrderState {
    #[sqlx(rename = "draft")]
    Draft,
    #[sqlx(rename = "completed")]
    Completed,
    #[sqlx(rename = "canceled")]
    Canceled,
}

/// 订单工作流流转
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    /// 确认下单 (不可逆)
    Place,
}

impl OrderTransition {
    pub fn id(&self) -> &'static str {
        match self {
            OrderTransition::Place => "place",
        }
    }

    fn from_state(&self) -> OrderState {
        OrderState::Draft
    }

    fn to_state(&self) -> OrderState {
        match self {
            OrderTransition::Place => OrderState::Completed,
        }
    }
}

/// 构造支付请求所需的订单快照
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    pub id: i64,
    pub total: Decimal,
    pub currency: String,
    pub language: String,
}

impl Order {
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            id: self.id,
            total: self.total,
            currency: self.currency.clone(),
            language: self.language.clone(),
        }
    }

    /// 订单总价为零时无需选择支付方式
    pub fn requires_payment(&self) -> bool {
        !self.total.is_zero()
    }

    /// 执行工作流流转
    pub fn apply_transition(&mut self, transition: OrderTransition) -> Result<(), ValidationError> {
        if self.state != transition.from_state() {
            return Err(ValidationError::single(
                "state",
                &format!(
                    "Transition '{}' is not allowed from state {:?}",
                    transition.id(),
                    self.state
                ),
            ));
        }

        self.state = transition.to_state();
        if transition == OrderTransition::Place {
            self.placed_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_order() -> Order {
        Order {
            id: 42,
            total: Decimal::new(1999, 2),
            currency: "EUR".to_string(),
            language: "fr".to_string(),
            checkout_step: "order_information".to_string(),
            state: OrderState::Draft,
            payment_gateway: None,
            payment_method_id: None,
            placed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_place_transition() {
        let mut order = draft_order();
        order.apply_transition(OrderTransition::Place).unwrap();

        assert_eq!(order.state, OrderState::Completed);
        assert!(order.placed_at.is_some());

        // 已下单的订单不能再次 place
        assert!(order.apply_transition(OrderTransition::Place).is_err());
    }

    #[test]
    fn test_requires_payment() {
        let mut order = draft_order();
        assert!(order.requires_payment());
        order.total = Decimal::ZERO;
        assert!(!order.requires_payment());
    }

    #[test]
    fn test_snapshot() {
        let snapshot = draft_order().snapshot();
        assert_eq!(snapshot.id, 42);
        assert_eq!(snapshot.total, Decimal::new(1999, 2));
        assert_eq!(snapshot.currency, "EUR");
    }
}
