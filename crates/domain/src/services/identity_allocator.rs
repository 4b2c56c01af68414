//! 显示身份分配
//!
//! 从请求的名称推导出当前未被占用的身份：`name`、`name1`、`name2`……
//! 调用方必须在与准入相同的临界区内调用，否则两个并发加入可能算出同一个后缀。

use crate::entities::Identity;
use crate::errors::HubError;

/// 校验连接时请求的名称，去掉首尾空白，空名称直接拒绝
pub fn validate_requested(requested: &str) -> Result<&str, HubError> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(HubError::bad_request("Username cannot be empty"));
    }
    Ok(trimmed)
}

/// 分配一个未被占用的身份
///
/// 后缀总是追加在原始名称之后，不会累积成 `name12`。
pub fn allocate<F>(requested: &str, is_taken: F) -> Identity
where
    F: Fn(&str) -> bool,
{
    if !is_taken(requested) {
        return Identity::from(requested);
    }

    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{requested}{suffix}");
        if !is_taken(&candidate) {
            return Identity::from(candidate);
        }
        suffix += 1;
    }
}
