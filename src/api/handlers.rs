use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::AppState;
use crate::bidding::hooks::{SyncOptions, UserSync};
use crate::bidding::ssp_client::TransportOutcome;
use crate::model::bid::InternalBid;
use crate::model::bid_request::{BidRequest, MediaType};
use crate::model::context::{AuctionContext, GdprConsent};
use crate::model::wire::{WireRequest, WireResponse};

#[derive(Serialize, Debug)]
pub struct ValidateReply {
    pub valid: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildPayload {
    /// 逐个解码，单个格式错误的广告位不影响其他广告位
    pub bid_requests: Vec<Value>,
    pub bidder_request: AuctionContext,
}

impl BuildPayload {
    pub fn decode_bid_requests(&self) -> Vec<BidRequest> {
        self.bid_requests.iter().filter_map(decode_bid_request).collect()
    }
}

fn decode_bid_request(raw: &Value) -> Option<BidRequest> {
    match BidRequest::deserialize(raw) {
        Ok(bid) => Some(bid),
        Err(e) => {
            let bid_id = raw.get("bidId").and_then(Value::as_str).unwrap_or_default();
            warn!(bid_id, "skipping malformed bid request: {}", e);
            None
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct InterpretPayload {
    #[serde(default)]
    pub response: WireResponse,
    pub request: WireRequest,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncPayload {
    pub sync_options: SyncOptions,
    pub server_responses: Vec<WireResponse>,
    pub gdpr_consent: Option<GdprConsent>,
    pub usp_consent: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct BillableReply {
    pub url: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSummary {
    pub media_type: MediaType,
    pub imp_id: String,
    pub outcome: TransportOutcome,
    pub elapsed_ms: u128,
}

#[derive(Serialize, Debug)]
pub struct BidsReply {
    pub bids: Vec<InternalBid>,
    pub exchanges: Vec<ExchangeSummary>,
}

fn record_skipped(state: &AppState, payload: &BuildPayload, decoded: usize) {
    let skipped = payload.bid_requests.len() - decoded;
    if skipped > 0 {
        state.event_log.warn(
            "bid_requests_skipped",
            payload.bidder_request.auction_id.as_deref(),
            json!({ "skipped": skipped, "decoded": decoded }),
        );
    }
}

/// **校验单个 BidRequest 的参数**
pub async fn handle_validate(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<Value>,
) -> Json<ValidateReply> {
    let valid = decode_bid_request(&raw).is_some_and(|bid| state.adapter.is_bid_request_valid(&bid));
    Json(ValidateReply { valid })
}

/// **构建 wire request**（调用方应先完成校验）
pub async fn handle_build(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BuildPayload>,
) -> Json<Vec<WireRequest>> {
    let bids = payload.decode_bid_requests();
    record_skipped(&state, &payload, bids.len());
    let requests = state.adapter.build_requests(&bids, &payload.bidder_request);
    state.event_log.info(
        "requests_built",
        payload.bidder_request.auction_id.as_deref(),
        json!({ "bid_requests": bids.len(), "wire_requests": requests.len() }),
    );
    Json(requests)
}

/// **解析 SSP 响应**
pub async fn handle_interpret(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InterpretPayload>,
) -> Json<Vec<InternalBid>> {
    let bids = state.adapter.interpret_response(&payload.response, &payload.request);
    state.event_log.info(
        "bids_interpreted",
        Some(payload.request.bid_request.auction_id.as_str()),
        json!({ "imp_id": payload.request.bid_request.bid_id, "bids": bids.len() }),
    );
    Json(bids)
}

pub async fn handle_syncs(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SyncPayload>,
) -> Json<Vec<UserSync>> {
    Json(state.adapter.get_user_syncs(
        &payload.sync_options,
        &payload.server_responses,
        payload.gdpr_consent.as_ref(),
        payload.usp_consent.as_deref(),
    ))
}

/// **计费回调**：没有 burl 时返回 204
pub async fn handle_billable(
    State(state): State<Arc<AppState>>,
    Json(bid): Json<InternalBid>,
) -> Result<Json<BillableReply>, StatusCode> {
    let url = state.adapter.on_bid_billable(&bid).ok_or(StatusCode::NO_CONTENT)?;
    state.event_log.info(
        "bid_billable",
        None,
        json!({ "request_id": bid.request_id, "cpm": bid.billable_cpm(), "url": url }),
    );
    Ok(Json(BillableReply { url }))
}

/// **完整流程**：校验 → 构建 → 发送 → 解析
pub async fn handle_bids(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BuildPayload>,
) -> Json<BidsReply> {
    let auction_id = payload.bidder_request.auction_id.clone();
    let decoded = payload.decode_bid_requests();
    record_skipped(&state, &payload, decoded.len());
    let valid: Vec<BidRequest> = decoded
        .into_iter()
        .filter(|bid| state.adapter.is_bid_request_valid(bid))
        .collect();
    let requests = state.adapter.build_requests(&valid, &payload.bidder_request);
    state.event_log.info(
        "requests_built",
        auction_id.as_deref(),
        json!({ "bid_requests": valid.len(), "wire_requests": requests.len() }),
    );

    let exchanges = state.transport.execute_all(requests).await;

    let mut bids = Vec::new();
    let mut summaries = Vec::with_capacity(exchanges.len());
    for exchange in exchanges {
        if let TransportOutcome::Failed(reason) = &exchange.outcome {
            state.event_log.error(
                "transport_failed",
                auction_id.as_deref(),
                json!({ "url": exchange.request.url, "imp_id": exchange.request.bid_request.bid_id, "reason": reason }),
            );
        }
        bids.extend(state.adapter.interpret_response(&exchange.response, &exchange.request));
        summaries.push(ExchangeSummary {
            media_type: exchange.request.media_type,
            imp_id: exchange.request.bid_request.bid_id.clone(),
            outcome: exchange.outcome,
            elapsed_ms: exchange.elapsed_ms,
        });
    }

    info!(auction_id = ?auction_id, bids = bids.len(), "Michao bids collected");
    state.event_log.info(
        "bids_interpreted",
        auction_id.as_deref(),
        json!({ "bids": bids.len(), "exchanges": summaries.len() }),
    );
    Json(BidsReply {
        bids,
        exchanges: summaries,
    })
}
