// src/openrtb/response.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// OpenRTB Bid Response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct OpenRtbResponse {
    pub id: String,
    pub seatbid: Vec<SeatBid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbr: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SeatBid {
    pub bid: Vec<Bid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
}

/// impid 与 price 为必填，其余字段缺省时保持 None
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bid {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: String,
    pub impid: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adomain: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_scalar_string")]
    pub crid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_scalar_string")]
    pub dealid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    /// 1 = banner, 2 = video, 3 = audio, 4 = native
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtype: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lurl: Option<String>,
}

/// 字符串原样保留，数字转成字符串，其余类型视为缺失
fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar_string(deserializer)?.unwrap_or_default())
}

/// 按响应顺序展开所有 seatbid 下的 bid。
/// seatbid 缺失或结构不对时返回空列表；单条 bid 格式错误只跳过该条。
pub fn flatten_bids(body: &Value) -> Vec<Bid> {
    let Some(seatbids) = body.get("seatbid").and_then(Value::as_array) else {
        return Vec::new();
    };
    seatbids
        .iter()
        .filter_map(|seatbid| seatbid.get("bid").and_then(Value::as_array))
        .flatten()
        .filter_map(|raw| match Bid::deserialize(raw) {
            Ok(bid) => Some(bid),
            Err(e) => {
                warn!("skipping malformed bid entry: {}", e);
                None
            }
        })
        .collect()
}
