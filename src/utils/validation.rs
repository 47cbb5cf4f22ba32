// 数据验证工具函数
// 提供出站请求字段校验和格式检查功能

use std::collections::BTreeMap;

use regex::Regex;

use crate::errors::ValidationError;

/// SIPS交易参考号最大长度
pub const MAX_TRANSACTION_REFERENCE_LENGTH: usize = 35;

/// 验证绝对URL格式
///
/// # Arguments
/// * `url` - URL字符串
///
/// # Returns
/// * URL是否有效
pub fn validate_url(url: &str) -> bool {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$")
        .map(|re| re.is_match(url))
        .unwrap_or(false)
}

/// 验证交易参考号格式
///
/// 只允许字母和数字，长度不超过35
pub fn validate_transaction_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= MAX_TRANSACTION_REFERENCE_LENGTH
        && reference.chars().all(|c| c.is_ascii_alphanumeric())
}

/// 通用输入验证器
pub struct InputValidator {
    errors: BTreeMap<String, Vec<String>>,
}

impl InputValidator {
    /// 创建新的验证器
    pub fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }

    /// 添加字段验证错误
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    /// 验证必填字段
    pub fn validate_required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "This field is required");
        }
    }

    /// 验证字符串最大长度
    pub fn validate_max_length(&mut self, field: &str, value: &str, max: usize) {
        if value.len() > max {
            self.add_error(field, &format!("Must be at most {} characters", max));
        }
    }

    /// 验证URL格式
    pub fn validate_url_field(&mut self, field: &str, url: &str) {
        if !url.is_empty() && !validate_url(url) {
            self.add_error(field, "Invalid URL format");
        }
    }

    /// 验证取值是否在允许列表中
    pub fn validate_one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !value.is_empty() && !allowed.contains(&value) {
            self.add_error(field, &format!("Value '{}' is not allowed", value));
        }
    }

    /// 验证正整数
    pub fn validate_positive(&mut self, field: &str, value: i64) {
        if value <= 0 {
            self.add_error(field, "Must be positive");
        }
    }

    /// 检查是否有验证错误
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 转换为错误结果
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.has_errors() {
            return Err(ValidationError::new(self.errors));
        }
        Ok(())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://shop.example.com/checkout/1/payment/2/sips/return"));
        assert!(validate_url("http://127.0.0.1:8080/return"));

        assert!(!validate_url("/checkout/1/return")); // 相对路径
        assert!(!validate_url("ftp://example.com"));
        assert!(!validate_url("https://exa mple.com"));
    }

    #[test]
    fn test_validate_transaction_reference() {
        assert!(validate_transaction_reference("421700000000"));
        assert!(validate_transaction_reference("ABC123"));

        assert!(!validate_transaction_reference(""));
        assert!(!validate_transaction_reference("order-42"));
        assert!(!validate_transaction_reference(&"1".repeat(36)));
    }

    #[test]
    fn test_input_validator() {
        let mut validator = InputValidator::new();

        validator.validate_required("merchantId", "");
        validator.validate_positive("amount", 0);
        validator.validate_one_of("currencyCode", "XYZ", &["EUR", "USD"]);
        validator.validate_url_field("normalReturnUrl", "not a url");

        assert!(validator.has_errors());
        let error = validator.into_result().unwrap_err();
        assert_eq!(error.fields().len(), 4);
        assert!(error.has_field("currencyCode"));
    }

    #[test]
    fn test_input_validator_passes() {
        let mut validator = InputValidator::default();
        validator.validate_required("merchantId", "011223344550000");
        validator.validate_positive("amount", 1999);
        assert!(validator.into_result().is_ok());
    }
}
