//! Common utilities for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use relay_proxy::dialer::{Dialer, TcpDialer};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener as TokioTcpListener, TcpStream};
use tokio::sync::mpsc;

/// Find an available port
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to random port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Start the proxy on an ephemeral loopback port
pub async fn start_proxy(timeout: Duration) -> SocketAddr {
    start_proxy_with_dialer(Arc::new(TcpDialer), timeout).await
}

/// Dialer that records every requested address and connects to a fixed local one
///
/// Lets tests use real host names such as `example.com:443` without leaving loopback.
pub struct RedirectDialer {
    target: SocketAddr,
    dialed: Mutex<Vec<String>>,
}

impl RedirectDialer {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            target,
            dialed: Mutex::new(Vec::new()),
        }
    }

    pub fn dialed(&self) -> Vec<String> {
        self.dialed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for RedirectDialer {
    type Stream = TcpStream;

    async fn dial(&self, addr: &str) -> io::Result<TcpStream> {
        self.dialed.lock().unwrap().push(addr.to_string());
        TcpStream::connect(self.target).await
    }
}

/// Start the proxy on an ephemeral loopback port with a custom dialer
pub async fn start_proxy_with_dialer<D: Dialer + 'static>(
    dialer: Arc<D>,
    timeout: Duration,
) -> SocketAddr {
    let listener = TokioTcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind proxy");
    let addr = listener.local_addr().expect("Failed to get proxy addr");

    tokio::spawn(relay_proxy::serve(
        listener,
        dialer,
        timeout,
        std::future::pending(),
    ));

    addr
}

/// Create a simple echo server for testing
pub async fn start_echo_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TokioTcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind echo server");
    let addr = listener.local_addr().expect("Failed to get echo addr");

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) => break, // Connection closed
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                                Err(_) => break,
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, handle)
}

/// Upstream that hands every accepted connection to the test
pub async fn start_stub_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<TcpStream>) {
    let listener = TokioTcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub upstream");
    let addr = listener.local_addr().expect("Failed to get stub addr");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            if tx.send(socket).is_err() {
                break;
            }
        }
    });

    (addr, rx)
}

/// Read until `len` bytes have arrived or the peer closes
pub async fn read_at_least(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = vec![0u8; 8192];

    while data.len() < len {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }

    data
}

/// Wait for server to be ready
pub async fn wait_for_server(addr: SocketAddr, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}
