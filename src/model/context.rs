// src/model/context.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 一次 auction 的上下文（bidderRequest），在调用时作为只读快照传入
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AuctionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<String>,
    /// auction 超时（毫秒），写入 tmax
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer_info: Option<RefererInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<GdprConsent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usp_consent: Option<String>,
    /// 框架共享的 OpenRTB first-party data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ortb2: Option<Value>,
    /// 全局 debug 开关
    pub debug: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RefererInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// GDPR 同意信息。任何格式不对的输入都退化为两个字段均为 None
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GdprConsent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_applies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_string: Option<String>,
}

impl GdprConsent {
    pub fn from_value(value: &Value) -> Self {
        Self {
            gdpr_applies: value.get("gdprApplies").and_then(Value::as_bool),
            consent_string: value
                .get("consentString")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

impl<'de> Deserialize<'de> for GdprConsent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
