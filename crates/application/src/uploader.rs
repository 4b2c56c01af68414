//! 附件上传
//!
//! 通过对象存储协作方持久化附件，并返回限时访问链接。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::{inline_image_type, Attachment, HubError, ObjectStore};
use tracing::{debug, warn};
use uuid::Uuid;

/// 附件上传器
#[derive(Clone)]
pub struct AttachmentUploader {
    store: Arc<dyn ObjectStore>,
    url_ttl: Duration,
}

impl AttachmentUploader {
    pub fn new(store: Arc<dyn ObjectStore>, url_ttl: Duration) -> Self {
        Self { store, url_ttl }
    }

    /// 写入附件并生成访问链接，每次上传一个新键
    ///
    /// 非光栅图片按 `application/octet-stream` 保存。
    pub async fn upload(&self, attachment: Attachment) -> Result<String, HubError> {
        let content_type = attachment.stored_content_type();
        let key = object_key(content_type);
        let size = attachment.data.len();

        self.store
            .put(&key, attachment.data, content_type)
            .await
            .map_err(|err| {
                warn!(key = %key, error = %err, "附件写入失败");
                HubError::from(err)
            })?;

        let url = self
            .store
            .presigned_get(&key, self.url_ttl)
            .await
            .map_err(|err| {
                warn!(key = %key, error = %err, "生成附件链接失败");
                HubError::from(err)
            })?;

        debug!(key = %key, size, content_type, "附件已上传");
        Ok(url)
    }
}

/// 生成对象键：秒级时间前缀 + UUID，同一秒内的并发上传也不会冲突
pub fn object_key(content_type: &str) -> String {
    format!(
        "{}-{}{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple(),
        extension_for(content_type)
    )
}

fn extension_for(content_type: &str) -> &'static str {
    match inline_image_type(content_type) {
        Some("image/png") => ".png",
        Some("image/jpeg") => ".jpg",
        Some("image/gif") => ".gif",
        Some("image/webp") => ".webp",
        _ => "",
    }
}
