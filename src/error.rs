//! 客户端错误类型

use thiserror::Error;

/// 单次用户操作失败的原因。任何错误都只终止当前操作，会话保持可用。
#[derive(Debug, Error)]
pub enum ClientError {
    /// 服务器拒绝令牌，或登录请求本身没能完成
    #[error("invalid token{}", status_suffix(.status))]
    AuthRejected { status: Option<u16> },

    #[error("please login first")]
    NotAuthenticated,

    #[error("select a file first")]
    NoFileSelected,

    /// 上传 / 删除 / 下载返回非 2xx
    #[error("{op} failed with HTTP {status}")]
    RequestFailed { op: Operation, status: u16 },

    #[error("could not refresh file list")]
    ListFailed,

    #[error("file not found: {name}")]
    NotFound { name: String },

    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 发起请求的操作，用于错误信息和日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Auth,
    Upload,
    List,
    Download,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Auth => "auth",
            Operation::Upload => "upload",
            Operation::List => "list",
            Operation::Download => "download",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

/// 配置校验错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("server.url must start with http:// or https://, got {0}")]
    InvalidServerUrl(String),

    #[error("server.timeout_secs must be between 1 and 3600, got {0}")]
    InvalidTimeout(u64),

    #[error("log.level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
