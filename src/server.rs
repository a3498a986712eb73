/// 监听循环：每个连接一个独立任务，不做并发限制
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::ProxyConfig;
use crate::dialer::{Dialer, TcpDialer};
use crate::relay::handle_connection;

/// accept 失败后的等待时间
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// 绑定监听地址
pub async fn bind(config: &ProxyConfig) -> Result<TcpListener> {
    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind proxy to {}", addr))?;
    Ok(listener)
}

/// 运行代理，直到进程退出
pub async fn run_proxy(config: ProxyConfig) -> Result<()> {
    run_proxy_until(config, std::future::pending()).await
}

/// 运行代理，`shutdown` 完成后停止接受新连接
pub async fn run_proxy_until<F>(config: ProxyConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = bind(&config).await?;
    info!("Listening on {}", listener.local_addr()?);
    info!("Dial timeout: {:?}", config.dial_timeout());

    serve(listener, Arc::new(TcpDialer), config.dial_timeout(), shutdown).await;
    Ok(())
}

/// 在已绑定的监听器上接受连接
///
/// 已经建立的会话不受 `shutdown` 影响，会继续运行到自然结束。
pub async fn serve<D, F>(listener: TcpListener, dialer: Arc<D>, timeout: Duration, shutdown: F)
where
    D: Dialer + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY: {}", e);
                        }

                        let dialer = dialer.clone();
                        tokio::spawn(async move {
                            let peer = peer_addr.to_string();
                            handle_connection(stream, dialer.as_ref(), timeout, &peer).await;
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                        sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down, no longer accepting connections");
                break;
            }
        }
    }
}
