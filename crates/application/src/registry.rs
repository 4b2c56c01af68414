//! 会话注册表
//!
//! "谁在线"的唯一事实来源。所有读写都经过同一把 `RwLock`，
//! 身份分配和准入在同一个写锁临界区内完成。

use std::collections::HashMap;

use domain::identity_allocator;
use domain::{HubError, Identity, SessionId};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::session::SessionHandle;

struct RegistryEntry {
    identity: Identity,
    handle: SessionHandle,
}

/// 内存中的会话注册表
#[derive(Default)]
pub struct SessionRegistry {
    entries: RwLock<HashMap<SessionId, RegistryEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配身份并准入会话
    ///
    /// 分配与插入在同一个写锁内完成，两个并发加入不会得到同一个身份。
    pub async fn admit(&self, handle: SessionHandle, requested: &str) -> Identity {
        let mut entries = self.entries.write().await;
        let identity = identity_allocator::allocate(requested, |candidate| {
            entries.values().any(|entry| entry.identity == candidate)
        });

        let session_id = handle.id();
        entries.insert(
            session_id,
            RegistryEntry {
                identity: identity.clone(),
                handle,
            },
        );

        info!(
            session_id = %session_id,
            requested = requested,
            identity = %identity,
            online = entries.len(),
            "会话已加入注册表"
        );
        identity
    }

    /// 移除会话，不存在时什么也不做
    pub async fn remove(&self, session_id: SessionId) -> Option<Identity> {
        let removed = self.entries.write().await.remove(&session_id);
        match &removed {
            Some(entry) => info!(
                session_id = %session_id,
                identity = %entry.identity,
                "会话已从注册表移除"
            ),
            None => debug!(session_id = %session_id, "会话已不在注册表中"),
        }
        removed.map(|entry| entry.identity)
    }

    /// 当前在线身份的快照，顺序不保证
    pub async fn roster(&self) -> Vec<Identity> {
        self.entries
            .read()
            .await
            .values()
            .map(|entry| entry.identity.clone())
            .collect()
    }

    /// 查找持有该身份的会话，排除发送者自己
    pub async fn resolve(&self, target: &Identity, exclude: SessionId) -> Option<SessionHandle> {
        self.entries
            .read()
            .await
            .iter()
            .find(|(id, entry)| **id != exclude && entry.identity == *target)
            .map(|(_, entry)| entry.handle.clone())
    }

    pub async fn identity_of(&self, session_id: SessionId) -> Result<Identity, HubError> {
        self.entries
            .read()
            .await
            .get(&session_id)
            .map(|entry| entry.identity.clone())
            .ok_or_else(|| HubError::unknown_session(session_id))
    }

    /// 扇出用的接收者快照
    pub async fn recipients(&self, exclude: Option<SessionId>) -> Vec<SessionHandle> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .map(|(_, entry)| entry.handle.clone())
            .collect()
    }

    pub async fn contains(&self, session_id: SessionId) -> bool {
        self.entries.read().await.contains_key(&session_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
