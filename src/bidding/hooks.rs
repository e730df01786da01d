// src/bidding/hooks.rs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::config_manager::AdapterConfig;
use crate::model::bid::InternalBid;
use crate::model::context::GdprConsent;
use crate::model::wire::WireResponse;

pub const AUCTION_PRICE_MACRO: &str = "${AUCTION_PRICE}";

/// 计费像素的发送方式，发出即忘，不关心响应
pub trait BillingPixel: Send + Sync {
    fn fire(&self, url: &str);
}

/// 替换 burl 中的成交价宏，优先使用 adjustment 之前的 originalCpm
pub fn resolve_billing_url(bid: &InternalBid) -> Option<String> {
    let template = bid.burl.as_deref()?;
    Some(template.replace(AUCTION_PRICE_MACRO, &bid.billable_cpm().to_string()))
}

pub fn on_bid_billable(bid: &InternalBid, pixel: &dyn BillingPixel) -> Option<String> {
    let url = resolve_billing_url(bid)?;
    debug!(request_id = %bid.request_id, %url, "firing billing pixel");
    pixel.fire(&url);
    Some(url)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncOptions {
    pub iframe_enabled: bool,
    pub pixel_enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    Iframe,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSync {
    #[serde(rename = "type")]
    pub sync_type: SyncType,
    pub url: String,
}

/// 只支持 iframe sync；URL 的查询串携带 GDPR 同意信息
pub fn get_user_syncs(
    config: &AdapterConfig,
    options: &SyncOptions,
    _server_responses: &[WireResponse],
    gdpr_consent: Option<&GdprConsent>,
    _usp_consent: Option<&str>,
) -> Vec<UserSync> {
    if !options.iframe_enabled {
        return Vec::new();
    }
    vec![UserSync {
        sync_type: SyncType::Iframe,
        url: format!("{}?{}", config.sync_endpoint, gdpr_query(gdpr_consent)),
    }]
}

fn gdpr_query(consent: Option<&GdprConsent>) -> String {
    let Some(consent) = consent else {
        return String::new();
    };
    match (consent.gdpr_applies, consent.consent_string.as_deref()) {
        (Some(applies), consent_string) => format!(
            "gdpr={}&gdpr_consent={}",
            u8::from(applies),
            consent_string.unwrap_or_default()
        ),
        (None, Some(consent_string)) => format!("gdpr_consent={}", consent_string),
        (None, None) => String::new(),
    }
}
