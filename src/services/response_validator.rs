// 回调响应校验
// 封印、交易参考号、支付状态三项检查全部通过才认为回调可信

use crate::errors::SipsError;
use crate::models::{PaymentResponse, RemoteState};
use crate::utils::ShaComposer;

/// 各项检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationChecks {
    /// 封印与本地重算结果一致
    pub seal_valid: bool,
    /// 回传的交易参考号与支付记录一致
    pub reference_matches: bool,
    /// 支付仍处于 pending
    pub state_pending: bool,
}

impl ValidationChecks {
    pub fn all_passed(&self) -> bool {
        self.seal_valid && self.reference_matches && self.state_pending
    }
}

/// 回调校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    pub response_code: Option<String>,
    /// 响应码为 "00"
    pub successful: bool,
    pub checks: ValidationChecks,
    pub received_reference: Option<String>,
}

impl ValidationResult {
    /// 校验失败时转换为对应的错误
    ///
    /// 非 pending 视为重放，其余视为真实性失败
    pub fn to_error(&self, payment_id: uuid::Uuid) -> Option<SipsError> {
        if self.ok {
            return None;
        }
        if !self.checks.state_pending {
            return Some(SipsError::Replay(payment_id));
        }
        Some(SipsError::Authenticity {
            seal_valid: self.checks.seal_valid,
            reference_matches: self.checks.reference_matches,
        })
    }
}

/// 校验回调
///
/// # Arguments
/// * `response` - 解析后的回调参数
/// * `expected_reference` - 支付记录保存的交易参考号
/// * `remote_state` - 支付记录当前的远端状态
/// * `composer` - 与出站请求相同配置的封印计算器
///
/// # Returns
/// * 三项检查的结果；不会修改任何状态
pub fn validate(
    response: &PaymentResponse,
    expected_reference: &str,
    remote_state: RemoteState,
    composer: &ShaComposer,
) -> ValidationResult {
    log::debug!(
        "Validating SIPS response for transaction {} (interface version {})",
        expected_reference,
        response.interface_version().unwrap_or("unknown")
    );

    let seal_valid = match response.seal() {
        Some(candidate) => match composer.verify(response.signed_parameters(), candidate) {
            Ok(valid) => valid,
            Err(e) => {
                log::error!("Failed to compute seal for SIPS response: {}", e);
                false
            }
        },
        None => false,
    };

    let received_reference = response.transaction_reference().map(str::to_string);
    let reference_matches = received_reference.as_deref() == Some(expected_reference);
    let state_pending = remote_state == RemoteState::Pending;

    let checks = ValidationChecks {
        seal_valid,
        reference_matches,
        state_pending,
    };

    if !checks.all_passed() {
        log::warn!(
            "SIPS response rejected for transaction {}: seal valid: {}, reference matches: {} (received {:?}), state pending: {}",
            expected_reference,
            seal_valid,
            reference_matches,
            received_reference,
            state_pending
        );
    }

    let response_code = response.response_code().map(str::to_string);

    ValidationResult {
        ok: checks.all_passed(),
        successful: response.is_successful(),
        response_code,
        checks,
        received_reference,
    }
}
