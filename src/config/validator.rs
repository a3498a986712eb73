use anyhow::{bail, Result};
use tracing::warn;

use super::ProxyConfig;

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证端口号
    pub fn validate_port(port: u16, context: &str) -> Result<()> {
        if port == 0 {
            bail!("{}: port cannot be 0", context);
        }
        Ok(())
    }

    /// 验证地址不为空
    pub fn validate_address(addr: &str, context: &str) -> Result<()> {
        if addr.trim().is_empty() {
            bail!("{}: address cannot be empty", context);
        }
        Ok(())
    }

    /// 验证代理配置
    pub fn validate_proxy_config(config: &ProxyConfig) -> Result<()> {
        Self::validate_address(&config.address, "Proxy address")?;
        Self::validate_port(config.port, "Proxy port")?;

        if config.timeout == 0 {
            warn!("Dial timeout is 0, upstream connects are not time-bounded");
        }

        Ok(())
    }
}
