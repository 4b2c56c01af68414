//! 领域模型错误定义
//!
//! 聊天中枢的错误分类。所有错误都不会终止进程：要么在本地恢复
//! （继续读取、跳过某个接收者），要么只驱逐受影响的那一个会话。

use thiserror::Error;

use crate::entities::SessionId;

/// 聊天中枢错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HubError {
    /// 请求的显示名称为空，连接在准入前被拒绝
    #[error("请求无效: {message}")]
    BadRequest { message: String },

    /// 单个帧无法解析，会话保持活跃
    #[error("读取消息失败: {message}")]
    TransportRead { message: String },

    /// 传输层已关闭，会话进入离开流程
    #[error("连接已关闭: {reason}")]
    TransportClosed { reason: String },

    /// 会话已从注册表中移除（并发清理竞争）
    #[error("未知会话: {session_id}")]
    UnknownSession { session_id: SessionId },

    /// 对象存储不可达或写入失败
    #[error("对象存储不可用: {message}")]
    StorageUnavailable { message: String },

    /// 向某个会话投递失败，该会话将被驱逐
    #[error("投递到会话 {session_id} 失败: {reason}")]
    DeliveryFailure {
        session_id: SessionId,
        reason: String,
    },
}

impl HubError {
    /// 创建请求无效错误
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// 创建读取错误
    pub fn transport_read(message: impl Into<String>) -> Self {
        Self::TransportRead {
            message: message.into(),
        }
    }

    /// 创建连接关闭错误
    pub fn transport_closed(reason: impl Into<String>) -> Self {
        Self::TransportClosed {
            reason: reason.into(),
        }
    }

    pub fn unknown_session(session_id: SessionId) -> Self {
        Self::UnknownSession { session_id }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn delivery_failure(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self::DeliveryFailure {
            session_id,
            reason: reason.into(),
        }
    }

    /// 是否为终止会话的传输错误
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TransportClosed { .. })
    }
}

/// 对象存储协作方错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectStoreError {
    #[error("object store unreachable: {0}")]
    Unreachable(String),
    #[error("failed to write object {key}: {message}")]
    Write { key: String, message: String },
    #[error("failed to presign object {key}: {message}")]
    Presign { key: String, message: String },
    #[error("object not found: {0}")]
    NotFound(String),
}

impl From<ObjectStoreError> for HubError {
    fn from(value: ObjectStoreError) -> Self {
        HubError::storage_unavailable(value.to_string())
    }
}
