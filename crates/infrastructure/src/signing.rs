//! 附件访问链接签名
//!
//! 链接格式：`{base}/attachments/{key}?expires={unix秒}&signature={base64url(HMAC-SHA256)}`，
//! 签名内容为 `{key}:{expires}`。

use std::time::Duration;

use chrono::{DateTime, Utc};
use data_encoding::BASE64URL_NOPAD;
use ring::hmac;
use thiserror::Error;

/// 链接签名校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("link expired")]
    Expired,
    #[error("malformed signature")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
}

/// 访问链接签名器
pub struct UrlSigner {
    key: hmac::Key,
    base_url: String,
}

impl UrlSigner {
    pub fn new(secret: &[u8], base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sign(&self, key: &str, expires: i64) -> String {
        let tag = hmac::sign(&self.key, Self::message(key, expires).as_bytes());
        BASE64URL_NOPAD.encode(tag.as_ref())
    }

    /// 生成从 `now` 起 `ttl` 内有效的链接
    pub fn presign(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> String {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.timestamp().saturating_add(ttl_secs);
        format!(
            "{}/attachments/{}?expires={}&signature={}",
            self.base_url,
            key,
            expires,
            self.sign(key, expires)
        )
    }

    /// 校验链接，比较在常数时间内完成
    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        let tag = BASE64URL_NOPAD
            .decode(signature.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        hmac::verify(&self.key, Self::message(key, expires).as_bytes(), &tag)
            .map_err(|_| SignatureError::Mismatch)
    }

    fn message(key: &str, expires: i64) -> String {
        format!("{key}:{expires}")
    }
}
