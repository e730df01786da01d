// src/config/config_manager.rs

use serde::{Deserialize, Serialize};

/// Prebid 中注册的 bidder code
pub const BIDDER_CODE: &str = "michao";
/// Michao SSP 的 OpenRTB 竞价入口
pub const ENDPOINT: &str = "https://michao-ssp.com/openrtb/prebid";
/// iframe cookie sync 入口
pub const SYNC_ENDPOINT: &str = "https://sync.michao-ssp.com/cookie-syncs";
/// outstream 视频渲染脚本
pub const RENDERER_URL: &str =
    "https://cdn.jsdelivr.net/npm/in-renderer-js@1/dist/in-video-renderer.umd.min.js";
pub const DEFAULT_CURRENCY: &str = "USD";
/// 部署 profile 的 bid 缓存时间（秒）
pub const DEFAULT_TTL_SECS: u32 = 360;
pub const NET_REVENUE: bool = true;
/// 传输层对单个 wire request 的超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// 适配器配置，默认值即线上部署 profile，可由 static/michao.json 覆盖
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterConfig {
    pub bidder_code: String,
    pub endpoint: String,
    pub sync_endpoint: String,
    pub renderer_url: String,
    pub currency: String,
    pub ttl: u32,
    pub net_revenue: bool,
    pub timeout_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            bidder_code: BIDDER_CODE.to_string(),
            endpoint: ENDPOINT.to_string(),
            sync_endpoint: SYNC_ENDPOINT.to_string(),
            renderer_url: RENDERER_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            ttl: DEFAULT_TTL_SECS,
            net_revenue: NET_REVENUE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AdapterConfig {
    /// 命令行传入的 endpoint 优先于配置文件
    pub fn with_endpoint(mut self, endpoint: Option<&str>) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint.to_string();
        }
        self
    }
}
