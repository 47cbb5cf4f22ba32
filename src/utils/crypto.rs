// 封印(Seal)计算工具
// 负责参数规范化拼接、HMAC/SHA签名生成与校验

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// 商户与SIPS平台之间共享的密钥
///
/// `Debug` 输出会被屏蔽，避免密钥出现在日志中
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// 封印算法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealAlgorithm {
    /// HMAC-SHA-256，密钥为共享密钥
    HmacSha256,
    /// 对规范字符串直接做SHA-256
    Sha256,
}

impl SealAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SealAlgorithm::HmacSha256 => "HMAC-SHA-256",
            SealAlgorithm::Sha256 => "SHA-256",
        }
    }
}

impl FromStr for SealAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HMAC-SHA-256" | "HMAC-SHA256" => Ok(SealAlgorithm::HmacSha256),
            "SHA-256" | "SHA256" => Ok(SealAlgorithm::Sha256),
            other => anyhow::bail!("Unsupported seal algorithm: {}", other),
        }
    }
}

/// 封印输出编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealEncoding {
    Hex,
    Base64,
}

impl FromStr for SealEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(SealEncoding::Hex),
            "base64" => Ok(SealEncoding::Base64),
            other => anyhow::bail!("Unsupported seal encoding: {}", other),
        }
    }
}

/// 生成规范字符串
///
/// 按调用方给定的顺序直接拼接所有参数值(无分隔符)，末尾追加共享密钥。
/// 参数名不参与拼接，顺序由调用方的参数策略决定。
pub fn compose(parameters: &[(String, String)], passphrase: &Passphrase) -> String {
    let mut canonical = String::with_capacity(
        parameters.iter().map(|(_, value)| value.len()).sum::<usize>() + passphrase.0.len(),
    );
    for (_, value) in parameters {
        canonical.push_str(value);
    }
    canonical.push_str(passphrase.expose());
    canonical
}

/// 对规范字符串计算封印
///
/// # Arguments
/// * `canonical` - `compose` 产生的规范字符串
/// * `passphrase` - HMAC 密钥
/// * `algorithm` - 封印算法
/// * `encoding` - 输出编码
///
/// # Returns
/// * 编码后的封印字符串
pub fn sign(
    canonical: &str,
    passphrase: &Passphrase,
    algorithm: SealAlgorithm,
    encoding: SealEncoding,
) -> Result<String> {
    let digest: Vec<u8> = match algorithm {
        SealAlgorithm::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(passphrase.expose().as_bytes())
                .context("Invalid HMAC key")?;
            mac.update(canonical.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        SealAlgorithm::Sha256 => Sha256::digest(canonical.as_bytes()).to_vec(),
    };

    Ok(match encoding {
        SealEncoding::Hex => hex::encode(digest),
        SealEncoding::Base64 => STANDARD.encode(digest),
    })
}

/// 常量时间字符串比较 (防止时序攻击)
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// "全部参数"封印策略
///
/// 持有共享密钥和算法配置，出站请求签名与回调校验共用同一实例
#[derive(Debug, Clone)]
pub struct ShaComposer {
    passphrase: Passphrase,
    algorithm: SealAlgorithm,
    encoding: SealEncoding,
}

impl ShaComposer {
    pub fn new(passphrase: Passphrase, algorithm: SealAlgorithm, encoding: SealEncoding) -> Self {
        Self {
            passphrase,
            algorithm,
            encoding,
        }
    }

    pub fn algorithm(&self) -> SealAlgorithm {
        self.algorithm
    }

    /// 计算参数集的封印
    pub fn seal(&self, parameters: &[(String, String)]) -> Result<String> {
        let canonical = compose(parameters, &self.passphrase);
        sign(&canonical, &self.passphrase, self.algorithm, self.encoding)
    }

    /// 校验候选封印
    ///
    /// 十六进制封印按大小写不敏感比较，base64 按原样比较
    pub fn verify(&self, parameters: &[(String, String)], candidate: &str) -> Result<bool> {
        let expected = self.seal(parameters)?;
        let candidate = candidate.trim();
        Ok(match self.encoding {
            SealEncoding::Hex => constant_time_eq(&expected, &candidate.to_ascii_lowercase()),
            SealEncoding::Base64 => constant_time_eq(&expected, candidate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("amount".to_string(), "1999".to_string()),
            ("currencyCode".to_string(), "978".to_string()),
            ("merchantId".to_string(), "011223344550000".to_string()),
            ("transactionReference".to_string(), "421700000000".to_string()),
        ]
    }

    fn composer() -> ShaComposer {
        ShaComposer::new(
            Passphrase::new("002001000000001_KEY1"),
            SealAlgorithm::HmacSha256,
            SealEncoding::Hex,
        )
    }

    #[test]
    fn test_compose_concatenates_values_then_passphrase() {
        let canonical = compose(&params(), &Passphrase::new("secret"));
        assert_eq!(canonical, "1999978011223344550000421700000000secret");
    }

    #[test]
    fn test_sha256_known_vector() {
        let parameters = vec![
            ("a".to_string(), "ab".to_string()),
            ("b".to_string(), "c".to_string()),
        ];
        let passphrase = Passphrase::new("");
        let canonical = compose(&parameters, &passphrase);
        let seal = sign(&canonical, &passphrase, SealAlgorithm::Sha256, SealEncoding::Hex).unwrap();
        assert_eq!(
            seal,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hmac_known_vector() {
        let seal = sign(
            "what do ya want for nothing?",
            &Passphrase::new("Jefe"),
            SealAlgorithm::HmacSha256,
            SealEncoding::Hex,
        )
        .unwrap();
        assert_eq!(
            seal,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_seal_is_deterministic() {
        let composer = composer();
        let first = composer.seal(&params()).unwrap();
        let second = composer.seal(&params()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(composer.verify(&params(), &first).unwrap());
        assert!(composer.verify(&params(), &first.to_uppercase()).unwrap());
    }

    #[test]
    fn test_any_single_character_mutation_fails_verification() {
        let composer = composer();
        let seal = composer.seal(&params()).unwrap();

        for index in 0..params().len() {
            let original = params()[index].1.clone();
            for position in 0..original.len() {
                let mut mutated = params();
                let mut chars: Vec<char> = original.chars().collect();
                chars[position] = if chars[position] == 'X' { 'Y' } else { 'X' };
                mutated[index].1 = chars.into_iter().collect();
                assert!(
                    !composer.verify(&mutated, &seal).unwrap(),
                    "mutation of {} at {} was accepted",
                    mutated[index].0,
                    position
                );
            }
        }
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let seal = composer().seal(&params()).unwrap();
        let other = ShaComposer::new(
            Passphrase::new("another-key"),
            SealAlgorithm::HmacSha256,
            SealEncoding::Hex,
        );
        assert!(!other.verify(&params(), &seal).unwrap());
        assert!(!composer().verify(&params(), "not-a-seal").unwrap());
    }

    #[test]
    fn test_algorithms_and_encodings_differ() {
        let passphrase = Passphrase::new("secret");
        let hmac = ShaComposer::new(passphrase.clone(), SealAlgorithm::HmacSha256, SealEncoding::Hex)
            .seal(&params())
            .unwrap();
        let sha = ShaComposer::new(passphrase.clone(), SealAlgorithm::Sha256, SealEncoding::Hex)
            .seal(&params())
            .unwrap();
        let b64 = ShaComposer::new(passphrase, SealAlgorithm::Sha256, SealEncoding::Base64)
            .seal(&params())
            .unwrap();

        assert_ne!(hmac, sha);
        assert_eq!(b64.len(), 44);
        assert_eq!(STANDARD.decode(&b64).unwrap(), hex::decode(&sha).unwrap());
    }

    #[test]
    fn test_parse_algorithm_and_encoding() {
        assert_eq!("HMAC-SHA-256".parse::<SealAlgorithm>().unwrap(), SealAlgorithm::HmacSha256);
        assert_eq!("sha-256".parse::<SealAlgorithm>().unwrap(), SealAlgorithm::Sha256);
        assert!("MD5".parse::<SealAlgorithm>().is_err());
        assert_eq!("BASE64".parse::<SealEncoding>().unwrap(), SealEncoding::Base64);
    }

    #[test]
    fn test_passphrase_is_redacted() {
        let rendered = format!("{:?}", composer());
        assert!(!rendered.contains("002001000000001_KEY1"));
        assert!(rendered.contains("Passphrase(***)"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hello world"));
    }
}
