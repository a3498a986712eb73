// 配置管理模块

mod validator;

pub use validator::ConfigValidator;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 默认监听地址
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";
/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8080;
/// 默认拨号超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// 根据扩展名判断格式，`.toml` 以外一律按 JSON 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// 代理配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// 监听地址
    #[serde(default = "default_address", alias = "ip")]
    pub address: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 上游拨号超时（秒），0 表示不限制
    #[serde(default = "default_timeout", alias = "timeout_seconds")]
    pub timeout: u64,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            timeout: default_timeout(),
        }
    }
}

impl ProxyConfig {
    /// 监听地址 `address:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// 拨号超时
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// 验证配置
    pub fn validate(&self) -> anyhow::Result<()> {
        ConfigValidator::validate_proxy_config(self)
    }

    /// 从字符串解析配置
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> anyhow::Result<Self> {
        let config: ProxyConfig = match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).context("Failed to parse JSON configuration")?
            }
            ConfigFormat::Toml => {
                toml::from_str(content).context("Failed to parse TOML configuration")?
            }
        };
        config
            .validate()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    /// 从文件加载配置，路径支持 `~`
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str_with_format(&content, ConfigFormat::from_path(path))
    }

    /// 序列化为指定格式（用于生成模板）
    pub fn to_string_with_format(&self, format: ConfigFormat) -> anyhow::Result<String> {
        match format {
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ConfigFormat::Toml => Ok(toml::to_string(self)?),
        }
    }
}
