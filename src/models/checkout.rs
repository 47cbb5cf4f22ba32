// 结账流程模型
// 描述结账步骤顺序以及支付结果对应的跳转目标

/// 终止步骤，进入该步骤时订单需要执行 place 流转
pub const COMPLETE_STEP: &str = "complete";

/// 结账流程 (有序步骤列表)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutFlow {
    steps: Vec<String>,
}

impl CheckoutFlow {
    pub fn new(steps: Vec<String>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s == step_id)
    }

    /// 下一个步骤；当前步骤未知或已是最后一步时返回 None
    pub fn next_step_id(&self, current: &str) -> Option<&str> {
        let index = self.position(current)?;
        self.steps.get(index + 1).map(String::as_str)
    }

    /// 上一个步骤；当前步骤未知或已是第一步时返回 None
    pub fn previous_step_id(&self, current: &str) -> Option<&str> {
        let index = self.position(current)?;
        index
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .map(String::as_str)
    }

    pub fn is_complete_step(step_id: &str) -> bool {
        step_id == COMPLETE_STEP
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new(
            ["login", "order_information", "review", COMPLETE_STEP]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

/// 支付流程结束后的跳转目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// 购物车 (安全回退页)
    Cart,
    /// 结账表单的某个步骤
    CheckoutStep { order_id: i64, step: String },
}

impl RedirectTarget {
    /// 生成站内跳转路径
    pub fn to_path(&self, cart_path: &str) -> String {
        match self {
            RedirectTarget::Cart => cart_path.to_string(),
            RedirectTarget::CheckoutStep { order_id, step } => {
                format!("/checkout/{}/{}", order_id, step)
            }
        }
    }
}
