//! 本地对象存储
//!
//! 内存或文件系统后端，访问链接由 `UrlSigner` 签名，
//! 由 web 层的 `/attachments/{key}` 路由校验后返回内容。
//! 内存后端中的对象在保留期后丢弃，保留期与访问链接有效期一致。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use domain::{ObjectStore, ObjectStoreError, OPAQUE_CONTENT_TYPE};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, info, warn};

use crate::signing::UrlSigner;

/// 文件系统后端保存内容类型的旁路文件后缀
const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// 已保存的对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

struct MemoryEntry {
    object: StoredObject,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

enum Backend {
    Memory {
        objects: RwLock<HashMap<String, MemoryEntry>>,
        retention: Duration,
    },
    Filesystem(PathBuf),
}

/// 本地对象存储
pub struct LocalObjectStore {
    backend: Backend,
    signer: UrlSigner,
}

impl LocalObjectStore {
    /// 创建内存后端，对象写入 `retention` 之后不再可读
    pub fn in_memory(signer: UrlSigner, retention: Duration) -> Self {
        Self {
            backend: Backend::Memory {
                objects: RwLock::new(HashMap::new()),
                retention,
            },
            signer,
        }
    }

    /// 创建文件系统后端，根目录不存在时自动创建
    pub async fn filesystem(
        root: impl Into<PathBuf>,
        signer: UrlSigner,
    ) -> Result<Self, ObjectStoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|err| {
            ObjectStoreError::Unreachable(format!("{}: {err}", root.display()))
        })?;
        info!(root = %root.display(), "文件系统对象存储已就绪");
        Ok(Self {
            backend: Backend::Filesystem(root),
            signer,
        })
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// 读取对象
    pub async fn fetch(&self, key: &str) -> Result<StoredObject, ObjectStoreError> {
        if !is_valid_key(key) {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        match &self.backend {
            Backend::Memory { objects, .. } => {
                let now = Instant::now();
                let mut objects = objects.write().await;
                let expired = match objects.get(key) {
                    Some(entry) if !entry.is_expired(now) => return Ok(entry.object.clone()),
                    Some(_) => true,
                    None => false,
                };
                if expired {
                    objects.remove(key);
                    debug!(key, "对象已过期");
                }
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Backend::Filesystem(root) => {
                let bytes = match tokio::fs::read(root.join(key)).await {
                    Ok(bytes) => bytes,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        return Err(ObjectStoreError::NotFound(key.to_string()))
                    }
                    Err(err) => return Err(ObjectStoreError::Unreachable(err.to_string())),
                };
                let content_type = tokio::fs::read_to_string(content_type_path(root, key))
                    .await
                    .unwrap_or_else(|_| OPAQUE_CONTENT_TYPE.to_string());
                Ok(StoredObject {
                    bytes,
                    content_type,
                })
            }
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        if !is_valid_key(key) {
            return Err(ObjectStoreError::Write {
                key: key.to_string(),
                message: "invalid object key".to_string(),
            });
        }
        let size = bytes.len();

        match &self.backend {
            Backend::Memory { objects, retention } => {
                let now = Instant::now();
                let mut objects = objects.write().await;
                let before = objects.len();
                objects.retain(|_, entry| !entry.is_expired(now));
                let purged = before - objects.len();
                if purged > 0 {
                    debug!(purged, "已清理过期对象");
                }
                objects.insert(
                    key.to_string(),
                    MemoryEntry {
                        object: StoredObject {
                            bytes,
                            content_type: content_type.to_string(),
                        },
                        expires_at: now + *retention,
                    },
                );
            }
            Backend::Filesystem(root) => {
                let write_error = |err: std::io::Error| ObjectStoreError::Write {
                    key: key.to_string(),
                    message: err.to_string(),
                };
                let object_path = root.join(key);
                tokio::fs::write(&object_path, bytes)
                    .await
                    .map_err(write_error)?;
                // 没有内容类型的对象不保留
                if let Err(err) = tokio::fs::write(content_type_path(root, key), content_type).await {
                    if let Err(cleanup) = tokio::fs::remove_file(&object_path).await {
                        warn!(key, error = %cleanup, "清理未完成的对象失败");
                    }
                    return Err(write_error(err));
                }
            }
        }

        debug!(key, size, content_type, "对象已写入");
        Ok(())
    }

    async fn presigned_get(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        if !is_valid_key(key) {
            return Err(ObjectStoreError::Presign {
                key: key.to_string(),
                message: "invalid object key".to_string(),
            });
        }
        Ok(self.signer.presign(key, ttl, Utc::now()))
    }
}

/// 对象键只允许字母、数字、`-`、`_` 和 `.`，且不能以 `.` 开头
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.ends_with(CONTENT_TYPE_SUFFIX)
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn content_type_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!("{key}{CONTENT_TYPE_SUFFIX}"))
}
