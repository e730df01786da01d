// src/model/wire.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::bid_request::{BidRequest, MediaType};
use crate::openrtb::request::OpenRtbRequest;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Post,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub content_type: String,
    pub with_credentials: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            with_credentials: true,
        }
    }
}

/// 发往 SSP 的单个请求，只覆盖一个 (BidRequest, 媒体类型) 组合
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub data: OpenRtbRequest,
    pub options: RequestOptions,
    pub media_type: MediaType,
    /// 只保留当前媒体类型的 BidRequest 副本，解析响应时使用
    pub bid_request: BidRequest,
}

/// SSP 的原始响应，body 为空表示 no-bid
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct WireResponse {
    pub body: Option<Value>,
}

impl WireResponse {
    pub fn from_body(body: Value) -> Self {
        Self { body: Some(body) }
    }

    /// 使用 simd-json 解析原始响应字节；空 body 或解析失败都视为没有出价
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        match simd_json::serde::from_slice::<Value>(&mut bytes) {
            Ok(body) => Self { body: Some(body) },
            Err(e) => {
                warn!("failed to parse SSP response body: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_response_bytes() {
        let bytes = br#"{"id":"r1","seatbid":[{"bid":[{"id":"b1","impid":"i1","price":0.18}]}]}"#.to_vec();
        let response = WireResponse::from_bytes(bytes);
        assert_eq!(response.body.unwrap()["seatbid"][0]["bid"][0]["price"], json!(0.18));
    }

    #[test]
    fn empty_or_broken_body_is_no_bid() {
        assert_eq!(WireResponse::from_bytes(Vec::new()), WireResponse::default());
        assert_eq!(WireResponse::from_bytes(b"  \n".to_vec()), WireResponse::default());
        assert_eq!(WireResponse::from_bytes(b"<html>".to_vec()), WireResponse::default());
    }

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Method::Post).unwrap(), json!("POST"));
        let options = serde_json::to_value(RequestOptions::default()).unwrap();
        assert_eq!(options, json!({ "contentType": "application/json", "withCredentials": true }));
    }
}
