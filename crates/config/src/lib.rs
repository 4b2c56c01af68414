//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 服务监听地址
//! - 会话出站队列
//! - 附件存储与访问链接签名
//!
//! 加载顺序：默认值 -> 可选配置文件（`APP_CONFIG_FILE`）-> 环境变量（`APP_*`，层级用 `__` 分隔）

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// 开发环境默认签名密钥，生产环境必须覆盖
const DEV_SIGNING_SECRET: &str = "dev-signing-secret-not-for-production-use";

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// 服务配置
    #[validate(nested)]
    pub server: ServerConfig,
    /// 中枢配置
    #[validate(nested)]
    pub hub: HubConfig,
    /// 附件存储配置
    #[validate(nested)]
    pub storage: StorageConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

/// 中枢配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HubConfig {
    /// 每个会话出站队列的容量，队列满视为投递失败
    #[validate(range(min = 1, max = 65536))]
    pub outbound_queue_capacity: usize,
}

/// 附件存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Filesystem,
}

/// 附件存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// 文件系统后端的根目录
    pub root_dir: PathBuf,
    /// 生成访问链接时使用的外部地址
    #[validate(url)]
    pub public_base_url: String,
    /// 访问链接 HMAC 签名密钥
    #[validate(length(min = 32))]
    pub signing_secret: String,
    /// 访问链接有效期（小时）
    #[validate(range(min = 1))]
    pub url_ttl_hours: u64,
}

impl StorageConfig {
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_hours.saturating_mul(3600))
    }

    /// 是否仍在使用开发环境的签名密钥
    pub fn uses_development_secret(&self) -> bool {
        self.signing_secret == DEV_SIGNING_SECRET
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
            },
            hub: HubConfig {
                outbound_queue_capacity: 64,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                root_dir: PathBuf::from("./data/attachments"),
                public_base_url: "http://127.0.0.1:8080".into(),
                signing_secret: DEV_SIGNING_SECRET.into(),
                url_ttl_hours: 168,
            },
        }
    }
}

impl AppConfig {
    /// 按默认值 -> 配置文件 -> 环境变量的顺序加载并校验
    pub fn load() -> Result<Self, ConfigError> {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig = fig.merge(Env::prefixed("APP_").split("__"));

        let cfg: AppConfig = fig.extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
