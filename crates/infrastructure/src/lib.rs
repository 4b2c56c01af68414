//! 基础设施层实现。
//!
//! 提供对象存储和附件链接签名等适配器，实现领域层定义的接口。

pub mod builder;
pub mod object_store;
pub mod signing;

pub use builder::{Infrastructure, InfrastructureError};
pub use object_store::{is_valid_key, LocalObjectStore, StoredObject};
pub use signing::{SignatureError, UrlSigner};
