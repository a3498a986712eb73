/// 自定义错误类型
///
/// 所有错误都只影响单个会话：记录日志后关闭连接，不会向客户端返回 HTTP 错误响应
use std::io;
use std::time::Duration;
use thiserror::Error;

/// 会话级错误
#[derive(Error, Debug)]
pub enum RelayError {
    /// 读取客户端首包失败（EOF 不算错误）
    #[error("Failed to read request from client: {0}")]
    ReadError(#[source] io::Error),

    /// 请求行不足三个字段
    #[error("Underspecified request line: expected 3 tokens, got {tokens}")]
    UnderspecifiedRequest { tokens: usize },

    /// 目标无法解析为 URI
    #[error("Invalid target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: BoxError,
    },

    /// 连接上游失败或超时
    #[error("Failed to dial {addr}: {source}")]
    DialFailure {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// 转发阶段的 I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// 目标解析错误的来源（url 或 http 的解析错误）
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result 类型别名
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// 创建目标解析错误
    pub fn invalid_target(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            source: source.into(),
        }
    }

    /// 创建拨号失败错误
    pub fn dial_failed(addr: impl Into<String>, source: io::Error) -> Self {
        Self::DialFailure {
            addr: addr.into(),
            source,
        }
    }

    /// 创建拨号超时错误
    pub fn dial_timeout(addr: impl Into<String>, duration: Duration) -> Self {
        Self::dial_failed(
            addr,
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect timed out after {:?}", duration),
            ),
        )
    }

    /// 检查是否为拨号超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DialFailure { source, .. } if source.kind() == io::ErrorKind::TimedOut)
    }

    /// 检查是否为不完整的请求行
    pub fn is_underspecified(&self) -> bool {
        matches!(self, Self::UnderspecifiedRequest { .. })
    }
}
