// SIPS 出站支付请求报文
// 包含运行模式、卡组织、语言/币种白名单以及请求字段校验

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::utils::{validate_transaction_reference, InputValidator, MAX_TRANSACTION_REFERENCE_LENGTH};

/// SIPS 支持的买家语言
pub const ALLOWED_LANGUAGES: [&str; 7] = ["nl", "fr", "de", "it", "es", "cy", "en"];

/// 语言不在白名单时的回退语言
pub const DEFAULT_LANGUAGE: &str = "en";

/// SIPS 支持的币种 (字母代码 -> 数字代码)
const CURRENCIES: [(&str, &str); 21] = [
    ("EUR", "978"),
    ("USD", "840"),
    ("CHF", "756"),
    ("GBP", "826"),
    ("CAD", "124"),
    ("JPY", "392"),
    ("MXN", "484"),
    ("TRY", "949"),
    ("AUD", "036"),
    ("NZD", "554"),
    ("NOK", "578"),
    ("BRL", "986"),
    ("ARS", "032"),
    ("KHR", "116"),
    ("TWD", "901"),
    ("SEK", "752"),
    ("DKK", "208"),
    ("KRW", "410"),
    ("SGD", "702"),
    ("XPF", "953"),
    ("XOF", "952"),
];

/// 运行模式，决定请求发往哪个SIPS端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    #[serde(rename = "TEST")]
    Test,
    #[serde(rename = "SIMU")]
    Simulation,
    #[serde(rename = "PRODUCTION")]
    Production,
}

impl OperatingMode {
    /// 支付初始化端点
    pub fn endpoint(&self) -> &'static str {
        match self {
            OperatingMode::Test => "https://payment-webinit.test.sips-atos.com/paymentInit",
            OperatingMode::Simulation => "https://payment-webinit.simu.sips-atos.com/paymentInit",
            OperatingMode::Production => "https://payment-webinit.sips-atos.com/paymentInit",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Test => "TEST",
            OperatingMode::Simulation => "SIMU",
            OperatingMode::Production => "PRODUCTION",
        }
    }
}

impl FromStr for OperatingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        // 兼容旧配置中按下标保存的模式
        match s.trim().to_ascii_uppercase().as_str() {
            "TEST" | "0" => Ok(OperatingMode::Test),
            "SIMU" | "SIMULATION" | "1" => Ok(OperatingMode::Simulation),
            "PRODUCTION" | "2" => Ok(OperatingMode::Production),
            other => anyhow::bail!("Unknown SIPS operating mode: {}", other),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 卡组织 / 支付品牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentBrand {
    #[serde(rename = "VISA")]
    Visa,
    #[serde(rename = "MASTERCARD")]
    Mastercard,
    #[serde(rename = "MAESTRO")]
    Maestro,
    #[serde(rename = "AMEX")]
    Amex,
    #[serde(rename = "CB")]
    Cb,
    #[serde(rename = "VPAY")]
    Vpay,
    #[serde(rename = "VISA ELECTRON")]
    VisaElectron,
    #[serde(rename = "BCMC")]
    Bcmc,
    #[serde(rename = "IDEAL")]
    Ideal,
    #[serde(rename = "PAYPAL")]
    Paypal,
}

impl PaymentBrand {
    const ALL: [PaymentBrand; 10] = [
        PaymentBrand::Visa,
        PaymentBrand::Mastercard,
        PaymentBrand::Maestro,
        PaymentBrand::Amex,
        PaymentBrand::Cb,
        PaymentBrand::Vpay,
        PaymentBrand::VisaElectron,
        PaymentBrand::Bcmc,
        PaymentBrand::Ideal,
        PaymentBrand::Paypal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentBrand::Visa => "VISA",
            PaymentBrand::Mastercard => "MASTERCARD",
            PaymentBrand::Maestro => "MAESTRO",
            PaymentBrand::Amex => "AMEX",
            PaymentBrand::Cb => "CB",
            PaymentBrand::Vpay => "VPAY",
            PaymentBrand::VisaElectron => "VISA ELECTRON",
            PaymentBrand::Bcmc => "BCMC",
            PaymentBrand::Ideal => "IDEAL",
            PaymentBrand::Paypal => "PAYPAL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentBrand::Visa => "Visa",
            PaymentBrand::Mastercard => "MasterCard",
            PaymentBrand::Maestro => "Maestro",
            PaymentBrand::Amex => "American Express",
            PaymentBrand::Cb => "Carte Bancaire",
            PaymentBrand::Vpay => "V PAY",
            PaymentBrand::VisaElectron => "Visa Electron",
            PaymentBrand::Bcmc => "Bancontact",
            PaymentBrand::Ideal => "iDEAL",
            PaymentBrand::Paypal => "PayPal",
        }
    }

    fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(PaymentBrand::as_str).collect()
    }
}

impl FromStr for PaymentBrand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|brand| brand.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::single(
                    "paymentMeanBrandList",
                    &format!("Unsupported payment brand '{}'", s),
                )
            })
    }
}

/// 将语言代码限制在 SIPS 白名单内
pub fn resolve_language(code: &str) -> &'static str {
    let code = code.trim().to_ascii_lowercase();
    ALLOWED_LANGUAGES
        .iter()
        .copied()
        .find(|allowed| *allowed == code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// 获取币种数字代码
pub fn currency_numeric_code(alpha: &str) -> Option<&'static str> {
    CURRENCIES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(alpha))
        .map(|(_, numeric)| *numeric)
}

/// 订单总价转换为最小货币单位 (乘以100后截断)
///
/// 溢出时返回 None
pub fn to_minor_units(total: Decimal) -> Option<i64> {
    total.checked_mul(Decimal::from(100))?.trunc().to_i64()
}

/// SIPS 支付请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub merchant_id: String,
    pub key_version: u32,
    pub interface_version: String,
    /// 最小货币单位金额
    pub amount: i64,
    /// ISO 4217 字母代码
    pub currency_code: String,
    pub transaction_reference: String,
    pub normal_return_url: String,
    pub language: String,
    pub payment_brand: String,
    pub mode: OperatingMode,
    seal: Option<String>,
}

impl PaymentRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        merchant_id: String,
        key_version: u32,
        interface_version: String,
        amount: i64,
        currency_code: String,
        transaction_reference: String,
        normal_return_url: String,
        language: String,
        payment_brand: String,
        mode: OperatingMode,
    ) -> Self {
        Self {
            merchant_id,
            key_version,
            interface_version,
            amount,
            currency_code,
            transaction_reference,
            normal_return_url,
            language,
            payment_brand,
            mode,
            seal: None,
        }
    }

    /// 请求发往的端点
    pub fn endpoint(&self) -> &'static str {
        self.mode.endpoint()
    }

    pub fn seal(&self) -> Option<&str> {
        self.seal.as_deref()
    }

    pub fn with_seal(mut self, seal: String) -> Self {
        self.seal = Some(seal);
        self
    }

    /// 参与封印的参数，按协议声明顺序排列
    pub fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("amount".to_string(), self.amount.to_string()),
            (
                "currencyCode".to_string(),
                currency_numeric_code(&self.currency_code)
                    .unwrap_or_default()
                    .to_string(),
            ),
            ("merchantId".to_string(), self.merchant_id.clone()),
            ("normalReturnUrl".to_string(), self.normal_return_url.clone()),
            (
                "transactionReference".to_string(),
                self.transaction_reference.clone(),
            ),
            ("keyVersion".to_string(), self.key_version.to_string()),
            ("customerLanguage".to_string(), self.language.clone()),
            ("paymentMeanBrandList".to_string(), self.payment_brand.clone()),
        ]
    }

    /// `Data` 表单字段：key=value 以竖线分隔
    pub fn to_parameter_string(&self) -> String {
        self.parameters()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// 校验所有必填字段，一次性列出全部错误
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = InputValidator::new();

        validator.validate_required("merchantId", &self.merchant_id);
        if !self.merchant_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            validator.add_error("merchantId", "Must be alphanumeric");
        }

        if self.key_version == 0 {
            validator.add_error("keyVersion", "Must be positive");
        }

        validator.validate_required("interfaceVersion", &self.interface_version);
        validator.validate_positive("amount", self.amount);

        validator.validate_required("currencyCode", &self.currency_code);
        if !self.currency_code.is_empty() && currency_numeric_code(&self.currency_code).is_none() {
            validator.add_error(
                "currencyCode",
                &format!("Currency '{}' is not allowed", self.currency_code),
            );
        }

        validator.validate_required("transactionReference", &self.transaction_reference);
        validator.validate_max_length(
            "transactionReference",
            &self.transaction_reference,
            MAX_TRANSACTION_REFERENCE_LENGTH,
        );
        if !self.transaction_reference.is_empty()
            && !validate_transaction_reference(&self.transaction_reference)
        {
            validator.add_error("transactionReference", "Must be alphanumeric");
        }

        validator.validate_required("normalReturnUrl", &self.normal_return_url);
        validator.validate_url_field("normalReturnUrl", &self.normal_return_url);

        validator.validate_one_of("customerLanguage", &self.language, &ALLOWED_LANGUAGES);

        validator.validate_required("paymentMeanBrandList", &self.payment_brand);
        validator.validate_one_of(
            "paymentMeanBrandList",
            &self.payment_brand,
            &PaymentBrand::allowed(),
        );

        validator.into_result()
    }
}
