//! 出站事件
//!
//! 线上格式：`{ "from": string, "type": string, "message": string | [string] }`，
//! 只有 `UserList` 的 `message` 是数组。

use serde::{Deserialize, Serialize};

use super::identity::{Identity, SERVER_IDENTITY};

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// 有新会话加入
    Joined,
    /// 文本消息
    Chat,
    /// 会话离开
    #[serde(rename = "Leave")]
    Left,
    /// 空消息
    Empty,
    /// 服务器通知
    System,
    /// 图片链接
    Image,
    /// 在线列表
    #[serde(rename = "UserList")]
    RosterUpdate,
}

impl EventKind {
    /// 是否携带需要写入内容日志的正文
    pub fn carries_content(&self) -> bool {
        matches!(self, Self::Chat | Self::Image)
    }
}

/// 事件正文：文本或者身份列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventBody {
    Text(String),
    Roster(Vec<Identity>),
}

impl EventBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Roster(_) => None,
        }
    }

    pub fn as_roster(&self) -> Option<&[Identity]> {
        match self {
            Self::Roster(roster) => Some(roster),
            Self::Text(_) => None,
        }
    }
}

/// 出站事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: EventBody,
}

impl Event {
    fn text(from: &Identity, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            from: from.as_str().to_string(),
            kind,
            message: EventBody::Text(message.into()),
        }
    }

    pub fn joined(from: &Identity) -> Self {
        Self::text(from, EventKind::Joined, "")
    }

    pub fn chat(from: &Identity, message: impl Into<String>) -> Self {
        Self::text(from, EventKind::Chat, message)
    }

    pub fn left(from: &Identity) -> Self {
        Self::text(from, EventKind::Left, "")
    }

    pub fn empty(from: &Identity) -> Self {
        Self::text(from, EventKind::Empty, "")
    }

    pub fn image(from: &Identity, url: impl Into<String>) -> Self {
        Self::text(from, EventKind::Image, url)
    }

    /// 服务器通知，来源固定为 `Server`
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            from: SERVER_IDENTITY.to_string(),
            kind: EventKind::System,
            message: EventBody::Text(message.into()),
        }
    }

    /// 在线列表，来源固定为 `Server`
    pub fn roster(identities: Vec<Identity>) -> Self {
        Self {
            from: SERVER_IDENTITY.to_string(),
            kind: EventKind::RosterUpdate,
            message: EventBody::Roster(identities),
        }
    }
}
