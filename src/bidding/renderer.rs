// src/bidding/renderer.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};
use crate::model::bid::InternalBid;

/// outstream 视频渲染能力（页面上的视频渲染库）
pub trait OutstreamPlayer: Send + Sync {
    fn render(&self, ad_unit_code: &str, bid: &InternalBid) -> Result<()>;
}

/// 绑定在 outstream 视频 bid 上的渲染钩子。
/// 解析响应时只记录脚本地址和广告位；播放器在展示前安装一次，之后由渲染库调用。
#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Renderer {
    pub id: String,
    pub url: String,
    pub ad_unit_code: String,
    #[serde(skip)]
    player: OnceCell<Arc<dyn OutstreamPlayer>>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("ad_unit_code", &self.ad_unit_code)
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl Renderer {
    pub fn new(id: &str, url: &str, ad_unit_code: &str) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            ad_unit_code: ad_unit_code.to_string(),
            player: OnceCell::new(),
        }
    }

    pub fn install(&self, player: Arc<dyn OutstreamPlayer>) -> Result<()> {
        self.player
            .set(player)
            .map_err(|_| AdapterError::RendererAlreadyInstalled { bid_id: self.id.clone() })
    }

    pub fn is_installed(&self) -> bool {
        self.player.get().is_some()
    }

    /// 渲染库回调入口：render(adUnitCode, bid)。
    /// 尚未安装播放器时，按脚本地址在 registry 中查找已加载的播放器并安装
    pub fn render(&self, registry: &PlayerRegistry, bid: &InternalBid) -> Result<()> {
        let player = self.player.get_or_try_init(|| {
            registry
                .lookup(&self.url)
                .ok_or_else(|| AdapterError::RendererNotInstalled { bid_id: self.id.clone() })
        })?;
        player.render(&self.ad_unit_code, bid)
    }
}

/// 按脚本地址查找播放器，相当于页面加载脚本后暴露的全局构造器
#[derive(Default, Clone)]
pub struct PlayerRegistry {
    players: HashMap<String, Arc<dyn OutstreamPlayer>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, url: &str, player: Arc<dyn OutstreamPlayer>) {
        self.players.insert(url.to_string(), player);
    }

    pub fn lookup(&self, url: &str) -> Option<Arc<dyn OutstreamPlayer>> {
        self.players.get(url).cloned()
    }
}
