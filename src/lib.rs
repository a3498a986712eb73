/// relay-proxy 库入口
///
/// 将核心模块导出为库，方便测试和复用
pub mod cli;
pub mod config;
pub mod dialer;
pub mod error;
pub mod relay;
pub mod request;
pub mod resolver;
pub mod server;

// 重新导出常用类型
pub use config::{ConfigFormat, ProxyConfig};
pub use dialer::{Dialer, TcpDialer};
pub use error::{RelayError, Result};
pub use relay::{handle_connection, relay, SessionStats, CONNECT_ESTABLISHED};
pub use request::RequestLine;
pub use resolver::resolve;
pub use server::{run_proxy, run_proxy_until, serve};
