//! 对象存储协作方接口
//!
//! 中枢只通过这个接口持久化附件并获取限时访问链接，不依赖任何具体存储。

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::ObjectStoreError;

/// 对象存储接口
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 写入对象
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), ObjectStoreError>;

    /// 生成限时访问链接
    async fn presigned_get(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError>;
}
