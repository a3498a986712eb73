/// 单个客户端连接的转发流程
///
/// 读取首包 -> 解析请求行 -> 解析目标 -> 拨号上游 -> CONNECT 应答或转发首包 -> 双向复制
///
/// 两条连接都归本会话独占，函数返回时随作用域释放（包括出错和 panic 的路径）。
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dialer::{dial_with_timeout, Dialer};
use crate::error::{RelayError, Result};
use crate::request::RequestLine;
use crate::resolver::resolve;

/// 首包读取缓冲区大小
pub const INITIAL_READ_SIZE: usize = 1024;

/// CONNECT 成功后写给客户端的应答
pub const CONNECT_ESTABLISHED: &[u8] = b"HTTP/1.1 200 Connection established\r\n\r\n";

/// 数据复制缓冲区大小
const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// 会话结束时的流量统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// 客户端 -> 上游（不含 CONNECT 模式下被消费的首包）
    pub bytes_sent: u64,
    /// 上游 -> 客户端（会话结束时已复制的字节数）
    pub bytes_received: u64,
}

/// 反向复制任务的句柄，drop 时终止任务
///
/// 会话不等待反向复制结束；句柄随会话作用域释放时任务被取消，
/// 其持有的连接半边也随之关闭，不会泄漏。
struct ReverseCopy {
    handle: JoinHandle<()>,
    copied: Arc<AtomicU64>,
}

impl ReverseCopy {
    fn spawn<R, W>(mut reader: R, mut writer: W, peer: String) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let copied = Arc::new(AtomicU64::new(0));
        let counter = copied.clone();

        let handle = tokio::spawn(async move {
            match copy_counted(&mut reader, &mut writer, &counter).await {
                Ok(n) => {
                    debug!("Session {}: upstream closed after {} bytes", peer, n);
                    // 把上游的 EOF 传递给客户端
                    if let Err(e) = writer.shutdown().await {
                        debug!("Session {}: failed to shut down client write: {}", peer, e);
                    }
                }
                Err(e) => debug!("Session {}: upstream to client error: {}", peer, e),
            }
        });

        Self { handle, copied }
    }

    fn copied(&self) -> u64 {
        self.copied.load(Ordering::Relaxed)
    }
}

impl Drop for ReverseCopy {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 复制数据直到 EOF 或出错，每次写入后更新计数
async fn copy_counted<R, W>(
    reader: &mut R,
    writer: &mut W,
    counter: &AtomicU64,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        writer.write_all(&buf[..n]).await?;
        total += n as u64;
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    Ok(total)
}

/// 运行一个完整会话
///
/// 出错时直接返回错误，不向客户端写任何响应；调用方负责记录日志。
pub async fn relay<C, D>(
    mut client: C,
    dialer: &D,
    timeout: Duration,
    peer: &str,
) -> Result<SessionStats>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    D: Dialer,
{
    // 只读一次，不循环；EOF 时 n == 0
    let mut buf = [0u8; INITIAL_READ_SIZE];
    let n = client.read(&mut buf).await.map_err(RelayError::ReadError)?;
    let initial = &buf[..n];

    let request = RequestLine::parse(initial)?;
    let addr = resolve(&request.target)?;

    debug!(
        "Session {}: {} {} -> dialing {}",
        peer, request.method, request.target, addr
    );

    let mut upstream = dial_with_timeout(dialer, &addr, timeout).await?;

    if request.is_connect() {
        client.write_all(CONNECT_ESTABLISHED).await?;
    } else {
        upstream.write_all(initial).await?;
    }

    info!("Session {}: relaying to {}", peer, addr);

    let (mut client_read, client_write) = tokio::io::split(client);
    let (upstream_read, mut upstream_write) = tokio::io::split(upstream);

    let reverse = ReverseCopy::spawn(upstream_read, client_write, peer.to_string());

    let forward = AtomicU64::new(0);
    if let Err(e) = copy_counted(&mut client_read, &mut upstream_write, &forward).await {
        debug!("Session {}: client to upstream error: {}", peer, e);
    }

    let mut stats = SessionStats {
        bytes_sent: forward.load(Ordering::Relaxed),
        bytes_received: reverse.copied(),
    };
    if !request.is_connect() {
        stats.bytes_sent += n as u64;
    }

    Ok(stats)
}

/// 处理一个客户端连接，所有错误都只记录日志
pub async fn handle_connection<C, D>(client: C, dialer: &D, timeout: Duration, peer: &str)
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    D: Dialer,
{
    match relay(client, dialer, timeout, peer).await {
        Ok(stats) => info!(
            "Session {}: closed (sent {} bytes, received {} bytes)",
            peer, stats.bytes_sent, stats.bytes_received
        ),
        Err(e) if e.is_underspecified() => debug!("Session {}: dropped: {}", peer, e),
        Err(e) => warn!("Session {}: {}", peer, e),
    }
}
