/// 上游连接建立
use async_trait::async_trait;
use std::borrow::Cow;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::warn;

use crate::error::{RelayError, Result};

/// 上游拨号器
#[async_trait]
pub trait Dialer: Send + Sync {
    /// 拨号得到的连接类型
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// 连接到 `host:port`，名称解析在这里完成
    async fn dial(&self, addr: &str) -> io::Result<Self::Stream>;
}

/// 直连 TCP 拨号器
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, addr: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(&*local_if_empty_host(addr)).await?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }
        Ok(stream)
    }
}

/// 空 host（如 `:80`）表示本机
fn local_if_empty_host(addr: &str) -> Cow<'_, str> {
    if addr.starts_with(':') {
        Cow::Owned(format!("localhost{}", addr))
    } else {
        Cow::Borrowed(addr)
    }
}

/// 带超时的拨号，超时为 0 表示不限制
pub async fn dial_with_timeout<D>(dialer: &D, addr: &str, timeout: Duration) -> Result<D::Stream>
where
    D: Dialer,
{
    if timeout.is_zero() {
        return dialer
            .dial(addr)
            .await
            .map_err(|e| RelayError::dial_failed(addr, e));
    }

    match tokio::time::timeout(timeout, dialer.dial(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(RelayError::dial_failed(addr, e)),
        Err(_) => Err(RelayError::dial_timeout(addr, timeout)),
    }
}
