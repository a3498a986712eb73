/// 目标地址解析
///
/// 把请求行中的 target 规范化为 `host:port`，不做 DNS 解析（留给拨号阶段）
use http::uri::Authority;
use url::Url;

use crate::error::{RelayError, Result};

/// 未指定端口时使用的默认 HTTP 端口
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// CONNECT 隧道识别的端口
const TUNNEL_PORT: &str = "443";

/// 解析目标地址
///
/// - `host:443` 形式的 CONNECT authority 会被 URI 解析器当作 `scheme:opaque`，
///   此时 scheme 即主机名，返回 `scheme:443`
/// - 主机部分已带端口时原样使用（包括与 scheme 默认端口相同的端口）
/// - 否则追加 `:80`
///
/// 相对引用（如 `/index.html`）和其他端口的裸 authority（如 `example.com:8443`）
/// 没有 host 部分，得到 `:80`，由拨号器连接本机。
pub fn resolve(target: &str) -> Result<String> {
    let host = match Url::parse(target) {
        Ok(url) => {
            if url.cannot_be_a_base() && url.path() == TUNNEL_PORT {
                return Ok(format!("{}:{}", url.scheme(), TUNNEL_PORT));
            }
            if url.has_authority() {
                let authority = target
                    .split_once("://")
                    .map(|(_, rest)| authority_text(rest))
                    .unwrap_or_default();
                host_component(target, authority)?
            } else {
                String::new()
            }
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => relative_host(target)?,
        Err(e) => return Err(RelayError::invalid_target(target, e)),
    };

    if host.contains(':') {
        Ok(host)
    } else {
        Ok(format!("{}:{}", host, DEFAULT_HTTP_PORT))
    }
}

/// 相对引用的 host 部分：`//authority/...` 取 authority，其余为空
fn relative_host(target: &str) -> Result<String> {
    if let Some(rest) = target.strip_prefix("//") {
        return host_component(target, authority_text(rest));
    }

    // RFC 3986 4.2：相对路径的第一段不能包含 ':'
    let first_segment = &target[..target.find(['/', '?', '#']).unwrap_or(target.len())];
    if first_segment.contains(':') {
        return Err(RelayError::invalid_target(
            target,
            "first path segment in relative reference contains ':'",
        ));
    }

    Ok(String::new())
}

/// `//` 之后直到 path、query 或 fragment 的原始 authority
fn authority_text(rest: &str) -> &str {
    &rest[..rest.find(['/', '?', '#']).unwrap_or(rest.len())]
}

/// authority 中的 `host[:port]`，保留书写时的端口，去掉 userinfo
fn host_component(target: &str, authority: &str) -> Result<String> {
    if authority.is_empty() {
        return Ok(String::new());
    }

    let authority: Authority = authority
        .parse()
        .map_err(|e| RelayError::invalid_target(target, e))?;

    match authority.port() {
        Some(port) => Ok(format!("{}:{}", authority.host(), port.as_str())),
        None => Ok(authority.host().to_string()),
    }
}
