// 支付请求构造
// 把订单快照和网关配置组装为带封印的 SIPS 请求

use crate::config::SipsConfig;
use crate::errors::{SipsError, ValidationError};
use crate::models::{resolve_language, to_minor_units, OrderSnapshot, PaymentRequest};

/// 构造并封印支付请求
///
/// # Arguments
/// * `order` - 订单快照
/// * `config` - 网关配置
/// * `transaction_reference` - 交易参考号 (支付记录的 remote_id)
/// * `payment_brand` - 买家选择的卡组织
/// * `return_url` - 买家完成支付后的回跳地址
///
/// # Returns
/// * 已封印的请求；任一字段不合法时返回包含全部字段错误的 `SipsError::Validation`
pub fn build_payment_request(
    order: &OrderSnapshot,
    config: &SipsConfig,
    transaction_reference: &str,
    payment_brand: &str,
    return_url: &str,
) -> Result<PaymentRequest, SipsError> {
    let amount = to_minor_units(order.total).ok_or_else(|| {
        ValidationError::single("amount", "Order total cannot be expressed in minor units")
    })?;

    let request = PaymentRequest::new(
        config.merchant_id.clone(),
        config.key_version,
        config.interface_version.clone(),
        amount,
        order.currency.to_ascii_uppercase(),
        transaction_reference.to_string(),
        return_url.to_string(),
        resolve_language(&order.language).to_string(),
        payment_brand.to_string(),
        config.mode,
    );

    request.validate()?;

    let composer = config.composer();
    let seal = composer.seal(&request.parameters())?;
    log::debug!(
        "Sealed payment request {} with {}",
        request.transaction_reference,
        composer.algorithm().as_str()
    );

    Ok(request.with_seal(seal))
}
