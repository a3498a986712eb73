use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ConfigFormat;

#[derive(Parser, Debug)]
#[command(name = "relay-proxy")]
#[command(author, version, about = "Minimal HTTP forwarding proxy with CONNECT tunnels", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 配置文件路径（JSON 或 TOML），省略时监听 0.0.0.0:8080，超时 8 秒
    pub config: Option<String>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 检查配置文件格式是否正确
    Check {
        /// 配置文件路径
        config: String,
    },
    /// 生成默认配置文件
    Template {
        /// 输出文件路径（省略时输出到标准输出）
        #[arg(short, long)]
        output: Option<String>,

        /// 配置格式
        #[arg(short, long, value_enum, default_value_t = TemplateFormat::Json)]
        format: TemplateFormat,
    },
}

/// 模板格式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Json,
    Toml,
}

impl From<TemplateFormat> for ConfigFormat {
    fn from(format: TemplateFormat) -> Self {
        match format {
            TemplateFormat::Json => ConfigFormat::Json,
            TemplateFormat::Toml => ConfigFormat::Toml,
        }
    }
}
