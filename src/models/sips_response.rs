// SIPS 回调响应报文
// 解析平台回传的参数，并提供响应码描述表

/// 授权成功的响应码
pub const SUCCESS_RESPONSE_CODE: &str = "00";

const SEAL_FIELD: &str = "Seal";
const DATA_FIELD: &str = "Data";
const INTERFACE_VERSION_FIELD: &str = "InterfaceVersion";

/// 响应码描述表
const RESPONSE_CODE_DESCRIPTIONS: [(&str, &str); 21] = [
    ("00", "Authorisation accepted"),
    ("02", "Authorisation request to be performed via telephone with the issuer, as the card authorisation threshold has been exceeded, if the forcing is authorised for the merchant"),
    ("03", "Invalid distance selling contract"),
    ("05", "Authorisation refused"),
    ("12", "Invalid transaction, verify the parameters transferred in the request."),
    ("14", "invalid bank details or card security code"),
    ("17", "Buyer cancellation"),
    ("24", "Operation impossible. The operation the merchant wishes to perform is not compatible with the status of the transaction."),
    ("25", "Transaction not found in the Sips database"),
    ("30", "Format error"),
    ("34", "Suspicion of fraud"),
    ("40", "Function not supported: the operation that the merchant would like to perform is not part of the list of operations for which the merchant is authorised"),
    ("51", "mount too high"),
    ("54", "Card is past expiry date"),
    ("60", "Transaction pending"),
    ("63", "Security rules not observed, transaction stopped"),
    ("75", "Number of attempts at entering the card number exceeded"),
    ("90", "Service temporarily unavailable"),
    ("94", "Duplicated transaction: for a given day, the TransactionReference has already been used"),
    ("97", "Timeframe exceeded, transaction refused"),
    ("99", "Temporary problem at the Sips Office Server level"),
];

/// 获取响应码的可读描述
pub fn response_code_description(code: &str) -> String {
    RESPONSE_CODE_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| format!("Unknown error code - [{}]", code))
}

/// SIPS 回调响应
///
/// 平台可能以 `Data` 字段 (key=value|key=value) 回传，也可能直接平铺为表单字段。
/// 两种形式都按收到的顺序保留参数，封印字段单独存放。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResponse {
    parameters: Vec<(String, String)>,
    seal: Option<String>,
    interface_version: Option<String>,
}

impl PaymentResponse {
    /// 从原始请求参数构造
    pub fn from_raw(raw: Vec<(String, String)>) -> Self {
        let field = |name: &str| {
            raw.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
        };

        let seal = field(SEAL_FIELD);
        let interface_version = field(INTERFACE_VERSION_FIELD);

        let parameters = match field(DATA_FIELD) {
            Some(data) => parse_data_field(&data),
            None => raw
                .iter()
                .filter(|(key, _)| !key.eq_ignore_ascii_case(SEAL_FIELD))
                .cloned()
                .collect(),
        };

        Self {
            parameters,
            seal,
            interface_version,
        }
    }

    /// 参与封印校验的参数 (不含封印本身)
    pub fn signed_parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn seal(&self) -> Option<&str> {
        self.seal.as_deref()
    }

    pub fn interface_version(&self) -> Option<&str> {
        self.interface_version.as_deref()
    }

    /// 按名称读取参数 (大小写不敏感)
    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn transaction_reference(&self) -> Option<&str> {
        self.param("transactionReference")
    }

    pub fn response_code(&self) -> Option<&str> {
        self.param("responseCode")
    }

    pub fn is_successful(&self) -> bool {
        self.response_code() == Some(SUCCESS_RESPONSE_CODE)
    }
}

/// 解析 `Data` 字段；没有等号的片段视为空值参数
fn parse_data_field(data: &str) -> Vec<(String, String)> {
    data.split('|')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}
