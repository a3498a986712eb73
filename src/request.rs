/// 请求行解析
///
/// 只解析 `METHOD SP TARGET SP REST`，不解析任何 header
use crate::error::{RelayError, Result};

/// CONNECT 方法
pub const CONNECT_METHOD: &str = "CONNECT";

/// 首包中解析出的请求行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    /// 第二个空格之后的全部内容（版本号以及后续 header）
    pub rest: String,
}

impl RequestLine {
    /// 按空格最多拆分为 3 段，不足 3 段视为不可路由
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let parts: Vec<&str> = text.splitn(3, ' ').collect();

        match parts.as_slice() {
            [method, target, rest] => Ok(Self {
                method: method.to_string(),
                target: target.to_string(),
                rest: rest.to_string(),
            }),
            _ => Err(RelayError::UnderspecifiedRequest {
                tokens: parts.len(),
            }),
        }
    }

    /// 是否为 CONNECT 隧道请求
    pub fn is_connect(&self) -> bool {
        self.method == CONNECT_METHOD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect() {
        let line = RequestLine::parse(
            b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n",
        )
        .unwrap();
        assert_eq!(line.method, "CONNECT");
        assert_eq!(line.target, "example.com:443");
        assert!(line.rest.starts_with("HTTP/1.1\r\n"));
        assert!(line.is_connect());
    }

    #[test]
    fn test_parse_plain_get() {
        let line = RequestLine::parse(b"GET http://example.com/ HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.target, "http://example.com/");
        assert!(!line.is_connect());
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let line = RequestLine::parse(b"connect example.com:443 HTTP/1.1\r\n").unwrap();
        assert!(!line.is_connect());
    }

    #[test]
    fn test_underspecified() {
        let inputs: [&[u8]; 3] = [b"", b"GET", b"GET /index.html\r\n\r\n"];
        for data in inputs {
            let err = RequestLine::parse(data).unwrap_err();
            assert!(err.is_underspecified(), "{:?}", data);
        }
    }

    #[test]
    fn test_non_utf8_bytes() {
        let line = RequestLine::parse(b"GET http://example.com/ \xff\xfe").unwrap();
        assert_eq!(line.target, "http://example.com/");
    }
}
