// src/model/bid.rs

use serde::{Deserialize, Serialize};

use crate::bidding::renderer::Renderer;
use crate::model::bid_request::MediaType;

/// 返回给框架的 bid
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InternalBid {
    /// 对应 BidRequest.bidId（OpenRTB impid）
    pub request_id: String,
    /// SSP 返回的 bid.id
    pub seat_bid_id: String,
    pub cpm: f64,
    pub currency: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vast_xml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    pub ttl: u32,
    pub net_revenue: bool,
    pub media_type: MediaType,
    pub meta: BidMeta,
    /// 计费 URL 模板，宏在计费时才替换
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lurl: Option<String>,
    /// 框架做 bid adjustment 之前的价格
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_cpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<Renderer>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BidMeta {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advertiser_domains: Vec<String>,
}

impl InternalBid {
    /// 计费使用的价格：优先 originalCpm
    pub fn billable_cpm(&self) -> f64 {
        self.original_cpm.unwrap_or(self.cpm)
    }
}
