// 错误类型定义
// 区分请求校验、下发、真实性、重放、拒付等错误场景

use std::collections::BTreeMap;
use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ApiResponse;

/// 字段级校验错误集合
///
/// 按字段名排序，便于日志和测试中稳定比较
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self { fields }
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.to_string()]);
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "Validation failed: {}", summary)
    }
}

impl std::error::Error for ValidationError {}

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    Missing(String),
}

/// 网关业务错误
#[derive(Error, Debug)]
pub enum SipsError {
    /// 出站请求不合法，未发起任何网络调用
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 与SIPS平台通信失败，支付保持pending
    #[error("Dispatch to SIPS failed: {0}")]
    Dispatch(String),

    /// 回调封印或交易参考号不匹配
    #[error(
        "SIPS response failed authenticity checks \
         (seal valid: {seal_valid}, reference matches: {reference_matches})"
    )]
    Authenticity {
        seal_valid: bool,
        reference_matches: bool,
    },

    /// 支付已处理完毕，再次回调
    #[error("Payment {0} has already been resolved")]
    Replay(Uuid),

    /// 校验通过但平台拒绝授权
    #[error("Authorisation declined: [{code}] {description}")]
    Declined { code: String, description: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for SipsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SipsError::Validation(_) => StatusCode::BAD_REQUEST,
            SipsError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            SipsError::Authenticity { .. } | SipsError::Replay(_) => StatusCode::BAD_REQUEST,
            SipsError::Declined { .. } => StatusCode::PAYMENT_REQUIRED,
            SipsError::NotFound(_) => StatusCode::NOT_FOUND,
            SipsError::Store(_) | SipsError::Configuration(_) | SipsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // 字段错误原样返回，便于调用方定位
        if let SipsError::Validation(e) = self {
            return HttpResponse::build(status).json(ApiResponse {
                code: status.as_u16() as i32,
                message: e.to_string(),
                data: Some(e.fields()),
                timestamp: chrono::Utc::now(),
            });
        }

        // 内部细节只写日志，不返回给买家
        let message = match self {
            SipsError::NotFound(what) => format!("Not found: {}", what),
            SipsError::Dispatch(_) => {
                "An error occurred while contacting the payment platform. Please try again."
                    .to_string()
            }
            SipsError::Declined { code, description } => {
                format!("An error occurred in the SIPS platform: [{}] {}", code, description)
            }
            _ => "An error occurred while processing your request.".to_string(),
        };
        HttpResponse::build(status).json(ApiResponse::<()>::error(status.as_u16() as i32, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_is_sorted() {
        let mut fields = BTreeMap::new();
        fields.insert("merchantId".to_string(), vec!["This field is required".to_string()]);
        fields.insert("amount".to_string(), vec!["Must be positive".to_string()]);
        let error = ValidationError::new(fields);

        assert_eq!(
            error.to_string(),
            "Validation failed: amount: Must be positive; merchantId: This field is required"
        );
        assert!(error.has_field("amount"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SipsError::Dispatch("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            SipsError::Replay(Uuid::new_v4()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SipsError::Store(StoreError::Missing("order 1".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
