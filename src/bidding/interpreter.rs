// src/bidding/interpreter.rs

use tracing::debug;

use crate::bidding::renderer::Renderer;
use crate::config::config_manager::AdapterConfig;
use crate::model::bid::{BidMeta, InternalBid};
use crate::model::bid_request::{BidRequest, MediaType};
use crate::model::wire::{WireRequest, WireResponse};
use crate::openrtb::response::{flatten_bids, Bid};

/// 将 SSP 响应转换为框架的 bid 列表，顺序与响应中的 bid 顺序一致
pub fn interpret_response(
    config: &AdapterConfig,
    response: &WireResponse,
    request: &WireRequest,
) -> Vec<InternalBid> {
    let Some(body) = &response.body else {
        return Vec::new();
    };
    flatten_bids(body)
        .into_iter()
        .map(|bid| to_internal_bid(config, bid, request))
        .collect()
}

fn to_internal_bid(config: &AdapterConfig, bid: Bid, request: &WireRequest) -> InternalBid {
    let media_type = request.media_type;
    if let Some(mtype) = bid.mtype {
        if mtype != mtype_of(media_type) {
            debug!(bid_id = %bid.id, mtype, "bid mtype differs from requested media type");
        }
    }

    let (fallback_w, fallback_h) = requested_size(&request.bid_request, media_type).unwrap_or((0, 0));
    let mut internal = InternalBid {
        request_id: bid.impid,
        seat_bid_id: bid.id,
        cpm: bid.price,
        currency: config.currency.clone(),
        width: bid.w.unwrap_or(fallback_w),
        height: bid.h.unwrap_or(fallback_h),
        creative_id: bid.crid,
        deal_id: bid.dealid,
        ttl: config.ttl,
        net_revenue: config.net_revenue,
        media_type,
        meta: BidMeta {
            advertiser_domains: bid.adomain,
        },
        burl: bid.burl,
        nurl: bid.nurl,
        lurl: bid.lurl,
        ..Default::default()
    };

    if media_type == MediaType::Video {
        internal.vast_xml = bid.adm;
        let outstream = request
            .bid_request
            .media_types
            .video
            .as_ref()
            .is_some_and(|video| video.is_outstream());
        if outstream {
            internal.renderer = Some(Renderer::new(
                &internal.request_id,
                &config.renderer_url,
                &request.bid_request.ad_unit_code,
            ));
        }
    } else {
        internal.ad = bid.adm;
    }
    internal
}

fn requested_size(bid: &BidRequest, media_type: MediaType) -> Option<(u32, u32)> {
    match media_type {
        MediaType::Banner => bid.media_types.banner.as_ref()?.sizes.first(),
        MediaType::Video => bid.media_types.video.as_ref()?.player_size.first(),
        MediaType::Native => None,
    }
}

fn mtype_of(media_type: MediaType) -> u8 {
    match media_type {
        MediaType::Banner => 1,
        MediaType::Video => 2,
        MediaType::Native => 4,
    }
}
