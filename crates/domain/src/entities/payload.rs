//! 入站消息
//!
//! 线上格式：`{ "message": string, "targetUser": string,
//! "image"?: { "data": base64, "contentType": string } }`，缺失的字段按空值处理。

use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// 客户端发送的消息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InboundPayload {
    pub message: String,
    pub target_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Attachment>,
}

impl InboundPayload {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_user = target.into();
        self
    }

    pub fn with_image(mut self, attachment: Attachment) -> Self {
        self.image = Some(attachment);
        self
    }

    /// 空字符串表示没有指定接收者
    pub fn target(&self) -> Option<Identity> {
        if self.target_user.is_empty() {
            None
        } else {
            Some(Identity::from(self.target_user.as_str()))
        }
    }

    /// 文本和附件都为空
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.image.is_none()
    }
}

/// 附件（二进制内容 + 内容类型）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub content_type: String,
}

impl Attachment {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    /// 保存时使用的内容类型，非光栅图片一律按二进制内容保存
    pub fn stored_content_type(&self) -> &'static str {
        inline_image_type(&self.content_type).unwrap_or(OPAQUE_CONTENT_TYPE)
    }
}

/// 无法内联展示的内容统一使用的类型
pub const OPAQUE_CONTENT_TYPE: &str = "application/octet-stream";

/// 归一化可以内联展示的光栅图片类型
///
/// 只接受 png、jpeg、gif 和 webp。SVG 可以携带脚本，不在其列。
pub fn inline_image_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Some("image/png"),
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/gif" => Some("image/gif"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

/// 二进制字段按标准 base64（带填充）编码
mod base64_bytes {
    use data_encoding::BASE64;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}
