// src/error.rs

use thiserror::Error;

/// 适配器在 I/O 边界上的错误（配置、网络、渲染器）。
/// 请求/响应转换本身不会返回错误，只会降级为空结果。
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transport: request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("renderer for bid {bid_id} is already installed")]
    RendererAlreadyInstalled { bid_id: String },

    #[error("renderer for bid {bid_id} has no player installed")]
    RendererNotInstalled { bid_id: String },

    #[error("renderer: {0}")]
    Render(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
