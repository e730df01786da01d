// src/bidding/request_builder.rs

use serde_json::{json, Map};
use tracing::{debug, warn};

use crate::bidding::validator::{validate, ParamsValidation};
use crate::config::config_manager::AdapterConfig;
use crate::model::bid_request::{BannerConfig, BidRequest, MediaType, NativeConfig, VideoConfig};
use crate::model::context::AuctionContext;
use crate::model::params::MichaoParams;
use crate::model::wire::{Method, RequestOptions, WireRequest};
use crate::openrtb::request::{
    Banner, Format, Imp, ImpExt, Native, OpenRtbRequest, Publisher, PublisherExt, Regs, RegsExt, Source,
    User, UserExt, Video,
};

/// 原样透传到 imp.video 的 OpenRTB 参数（mimes / w / h 单独处理）
const ORTB_VIDEO_PARAMS: &[&str] = &[
    "minduration",
    "maxduration",
    "startdelay",
    "maxseq",
    "poddur",
    "protocols",
    "podid",
    "podseq",
    "rqddurs",
    "placement",
    "plcmt",
    "linearity",
    "skip",
    "skipmin",
    "skipafter",
    "sequence",
    "slotinseq",
    "battr",
    "maxextended",
    "minbitrate",
    "maxbitrate",
    "boxingallowed",
    "playbackmethod",
    "playbackend",
    "delivery",
    "pos",
    "api",
    "companiontype",
    "poddedupe",
];

const NATIVE_VERSION: &str = "1.2";

/// 为每个 (BidRequest, 媒体类型) 生成一个 wire request。
/// 顺序：按输入顺序，单个 BidRequest 内按 banner → video → native。
pub fn build_requests(
    config: &AdapterConfig,
    valid_bids: &[BidRequest],
    ctx: &AuctionContext,
) -> Vec<WireRequest> {
    valid_bids
        .iter()
        .flat_map(|bid| {
            let ParamsValidation::Valid(params) = validate(bid) else {
                debug!(bid_id = %bid.bid_id, "skipping bid request with invalid params");
                return Vec::new();
            };
            bid.media_types
                .declared()
                .into_iter()
                .map(|media_type| build_request(config, &bid.scoped_to(media_type), &params, media_type, ctx))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `bid` 必须已经只包含 `media_type` 一种媒体类型
pub fn build_request(
    config: &AdapterConfig,
    bid: &BidRequest,
    params: &MichaoParams,
    media_type: MediaType,
    ctx: &AuctionContext,
) -> WireRequest {
    let mut request = first_party_base(ctx);

    request.id = ctx
        .bidder_request_id
        .clone()
        .or_else(|| bid.bidder_request_id.clone())
        .unwrap_or_else(|| bid.auction_id.clone());
    request.imp = vec![build_imp(config, bid, params, media_type)];
    request.cur = vec![config.currency.clone()];
    request.test = i32::from(ctx.debug);
    if ctx.timeout.is_some() {
        request.tmax = ctx.timeout;
    }

    let site = request.site.get_or_insert_with(Default::default);
    site.id = Some(params.site.text.clone());
    if let Some(referer) = &ctx.referer_info {
        site.page = site.page.take().or_else(|| referer.page.clone());
        site.domain = site.domain.take().or_else(|| referer.domain.clone());
        site.referrer = site.referrer.take().or_else(|| referer.referrer.clone());
    }
    if let Some(partner) = &params.partner {
        site.publisher
            .get_or_insert_with(Publisher::default)
            .ext
            .get_or_insert_with(PublisherExt::default)
            .partner = Some(partner.clone());
    }

    let tid = ctx.auction_id.clone().unwrap_or_else(|| bid.auction_id.clone());
    if !tid.is_empty() {
        request.source.get_or_insert_with(Source::default).tid = Some(tid);
    }
    if let Some(schain) = bid.schain.as_ref().or(params.schain.as_ref()) {
        request.source.get_or_insert_with(Source::default).schain = Some(schain.clone());
    }

    if params.bcat.is_some() {
        request.bcat = params.bcat.clone();
    }
    if params.badv.is_some() {
        request.badv = params.badv.clone();
    }

    apply_privacy(&mut request, ctx);

    WireRequest {
        method: Method::Post,
        url: config.endpoint.clone(),
        data: request,
        options: RequestOptions::default(),
        media_type,
        bid_request: bid.clone(),
    }
}

/// ortb2 first-party data 作为请求基底，格式错误时忽略
fn first_party_base(ctx: &AuctionContext) -> OpenRtbRequest {
    match &ctx.ortb2 {
        Some(ortb2) => serde_json::from_value(ortb2.clone()).unwrap_or_else(|e| {
            warn!("ignoring malformed ortb2 first party data: {}", e);
            OpenRtbRequest::default()
        }),
        None => OpenRtbRequest::default(),
    }
}

fn apply_privacy(request: &mut OpenRtbRequest, ctx: &AuctionContext) {
    if let Some(consent) = &ctx.gdpr_consent {
        if let Some(applies) = consent.gdpr_applies {
            regs_ext(request).gdpr = Some(i32::from(applies));
        }
        if let Some(consent_string) = &consent.consent_string {
            request
                .user
                .get_or_insert_with(User::default)
                .ext
                .get_or_insert_with(UserExt::default)
                .consent = Some(consent_string.clone());
        }
    }
    if let Some(usp) = &ctx.usp_consent {
        regs_ext(request).us_privacy = Some(usp.clone());
    }
}

fn regs_ext(request: &mut OpenRtbRequest) -> &mut RegsExt {
    request
        .regs
        .get_or_insert_with(Regs::default)
        .ext
        .get_or_insert_with(RegsExt::default)
}

fn build_imp(config: &AdapterConfig, bid: &BidRequest, params: &MichaoParams, media_type: MediaType) -> Imp {
    let mut imp = Imp {
        id: bid.bid_id.clone(),
        bidfloor: params.bid_floor,
        bidfloorcur: (params.bid_floor > 0.0).then(|| config.currency.clone()),
        rwdd: i32::from(params.reward),
        secure: Some(1),
        ext: ImpExt {
            placement: params.placement.text.clone(),
            extra: Map::new(),
        },
        ..Default::default()
    };
    let media = &bid.media_types;
    match media_type {
        MediaType::Banner => imp.banner = media.banner.as_ref().map(banner_imp),
        MediaType::Video => imp.video = media.video.as_ref().map(video_imp),
        MediaType::Native => imp.native = media.native.as_ref().map(native_imp),
    }
    imp
}

fn banner_imp(banner: &BannerConfig) -> Banner {
    let format: Vec<Format> = banner.sizes.0.iter().map(|&(w, h)| Format { w, h }).collect();
    let first = banner.sizes.first();
    Banner {
        format,
        w: first.map(|(w, _)| w),
        h: first.map(|(_, h)| h),
        pos: banner.pos,
    }
}

fn video_imp(video: &VideoConfig) -> Video {
    let player = video.player_size.first();
    let params = video
        .params
        .iter()
        .filter(|(key, _)| ORTB_VIDEO_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Video {
        mimes: video.mimes.clone(),
        w: player.map(|(w, _)| w),
        h: player.map(|(_, h)| h),
        params,
    }
}

fn native_imp(native: &NativeConfig) -> Native {
    let request = native.ortb.clone().unwrap_or_else(|| json!({}));
    Native {
        request: request.to_string(),
        ver: NATIVE_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::context::{GdprConsent, RefererInfo};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn bid(media_types: Value, params: Value) -> BidRequest {
        serde_json::from_value(json!({
            "adUnitCode": "test-div",
            "auctionId": "b06c5141-fe8f-4cdf-9d7d-54415490a917",
            "bidId": "22c4871113f461",
            "bidderRequestId": "15246a574e859f",
            "mediaTypes": media_types,
            "params": params
        }))
        .unwrap()
    }

    fn banner_bid() -> BidRequest {
        bid(json!({ "banner": [[300, 250]] }), json!({ "site": 123, "placement": 456 }))
    }

    fn payload(request: &WireRequest) -> Value {
        serde_json::to_value(&request.data).unwrap()
    }

    #[test]
    fn banner_request_shape() {
        let requests = build_requests(&AdapterConfig::default(), &[banner_bid()], &AuctionContext::default());
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://michao-ssp.com/openrtb/prebid");
        assert_eq!(request.options.content_type, "application/json");
        assert!(request.options.with_credentials);

        let data = payload(request);
        assert_eq!(data["test"], 0);
        assert_eq!(data["cur"][0], "USD");
        assert_eq!(data["site"]["id"], "123");
        assert_eq!(data["imp"][0]["ext"]["placement"], "456");
        assert_eq!(data["imp"][0]["id"], "22c4871113f461");
        assert_eq!(data["imp"][0]["banner"]["format"], json!([{ "w": 300, "h": 250 }]));
        assert_eq!(data["imp"][0]["bidfloor"], 0.0);
        assert_eq!(data["imp"][0]["rwdd"], 0);
        assert_eq!(data["id"], "15246a574e859f");
        assert!(data.get("source").and_then(|s| s.get("schain")).is_none());
    }

    #[test]
    fn debug_mode_sets_test_flag() {
        let ctx = AuctionContext {
            debug: true,
            ..Default::default()
        };
        let requests = build_requests(&AdapterConfig::default(), &[banner_bid()], &ctx);
        assert_eq!(payload(&requests[0])["test"], 1);
    }

    #[test]
    fn mixed_media_types_are_split_without_leaking() {
        let mixed = bid(
            json!({
                "banner": { "sizes": [[300, 250]] },
                "video": { "context": "outstream", "playerSize": [640, 480], "mimes": ["video/mp4"] }
            }),
            json!({ "site": 123, "placement": 456 }),
        );
        let requests = build_requests(&AdapterConfig::default(), &[mixed], &AuctionContext::default());
        assert_eq!(requests.len(), 2);

        assert_eq!(requests[0].media_type, MediaType::Banner);
        let banner_imp = &payload(&requests[0])["imp"][0];
        assert!(banner_imp.get("banner").is_some());
        assert!(banner_imp.get("video").is_none());
        assert!(requests[0].bid_request.media_types.video.is_none());

        assert_eq!(requests[1].media_type, MediaType::Video);
        let video_imp = &payload(&requests[1])["imp"][0];
        assert!(video_imp.get("video").is_some());
        assert!(video_imp.get("banner").is_none());
        assert_eq!(video_imp["video"]["w"], 640);
        assert_eq!(video_imp["video"]["h"], 480);
        assert_eq!(video_imp["video"]["mimes"], json!(["video/mp4"]));
    }

    #[test]
    fn native_only_request() {
        let native = bid(
            json!({ "native": { "ortb": { "assets": [{ "id": 1, "required": 1, "title": { "len": 80 } }] } } }),
            json!({ "site": 1, "placement": 2 }),
        );
        let requests = build_requests(&AdapterConfig::default(), &[native], &AuctionContext::default());
        assert_eq!(requests.len(), 1);
        let imp = &payload(&requests[0])["imp"][0];
        assert!(imp.get("native").is_some());
        assert_eq!(imp["native"]["ver"], "1.2");
        let native_request: Value = serde_json::from_str(imp["native"]["request"].as_str().unwrap()).unwrap();
        assert_eq!(native_request["assets"][0]["title"]["len"], 80);
    }

    #[test]
    fn requests_follow_input_then_media_order() {
        let first = bid(
            json!({ "native": {}, "video": { "playerSize": [640, 480] }, "banner": [[300, 250]] }),
            json!({ "site": 1, "placement": 2 }),
        );
        let mut second = banner_bid();
        second.bid_id = "second".to_string();
        let requests = build_requests(&AdapterConfig::default(), &[first, second], &AuctionContext::default());
        let order: Vec<_> = requests
            .iter()
            .map(|r| (r.data.imp[0].id.clone(), r.media_type))
            .collect();
        assert_eq!(
            order,
            vec![
                ("22c4871113f461".to_string(), MediaType::Banner),
                ("22c4871113f461".to_string(), MediaType::Video),
                ("22c4871113f461".to_string(), MediaType::Native),
                ("second".to_string(), MediaType::Banner),
            ]
        );
    }

    #[test]
    fn invalid_bids_are_skipped() {
        let invalid = bid(json!({ "banner": [[300, 250]] }), json!({ "site": "abc", "placement": 1 }));
        let requests = build_requests(&AdapterConfig::default(), &[invalid, banner_bid()], &AuctionContext::default());
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn optional_params_are_passed_through() {
        let mut full = bid(
            json!({ "video": { "playerSize": [[640, 480]], "minduration": 5, "maxduration": 30, "protocols": [2, 3], "custom": "x" } }),
            json!({
                "site": "123",
                "placement": 456,
                "reward": 1,
                "bidFloor": 0.5,
                "partner": "acme",
                "bcat": ["IAB2"],
                "badv": ["blocked.example"]
            }),
        );
        full.schain = Some(json!({ "ver": "1.0", "complete": 1, "nodes": [{ "asi": "example.com", "sid": "1", "hp": 1 }] }));
        let requests = build_requests(&AdapterConfig::default(), &[full.clone()], &AuctionContext::default());
        let data = payload(&requests[0]);
        assert_eq!(data["site"]["id"], "123");
        assert_eq!(data["site"]["publisher"]["ext"]["partner"], "acme");
        assert_eq!(data["source"]["schain"], full.schain.unwrap());
        assert_eq!(data["bcat"], json!(["IAB2"]));
        assert_eq!(data["badv"], json!(["blocked.example"]));
        let imp = &data["imp"][0];
        assert_eq!(imp["rwdd"], 1);
        assert_eq!(imp["bidfloor"], 0.5);
        assert_eq!(imp["bidfloorcur"], "USD");
        assert_eq!(imp["video"]["protocols"], json!([2, 3]));
        assert_eq!(imp["video"]["maxduration"], 30);
        assert!(imp["video"].get("custom").is_none());
    }

    #[test]
    fn context_fields_are_applied_over_first_party_data() {
        let ctx = AuctionContext {
            bidder_request_id: Some("br-1".to_string()),
            auction_id: Some("auction-1".to_string()),
            timeout: Some(1200),
            referer_info: Some(RefererInfo {
                page: Some("https://news.example/a".to_string()),
                domain: Some("news.example".to_string()),
                referrer: None,
            }),
            gdpr_consent: Some(GdprConsent {
                gdpr_applies: Some(true),
                consent_string: Some("CONSENT".to_string()),
            }),
            usp_consent: Some("1YNN".to_string()),
            ortb2: Some(json!({ "site": { "id": "overwritten", "domain": "fpd.example", "cat": ["IAB1"] }, "device": { "ua": "UA" } })),
            debug: false,
        };
        let requests = build_requests(&AdapterConfig::default(), &[banner_bid()], &ctx);
        let data = payload(&requests[0]);
        assert_eq!(data["id"], "br-1");
        assert_eq!(data["tmax"], 1200);
        assert_eq!(data["site"]["id"], "123");
        assert_eq!(data["site"]["domain"], "fpd.example");
        assert_eq!(data["site"]["page"], "https://news.example/a");
        assert_eq!(data["site"]["cat"], json!(["IAB1"]));
        assert_eq!(data["device"]["ua"], "UA");
        assert_eq!(data["source"]["tid"], "auction-1");
        assert_eq!(data["regs"]["ext"]["gdpr"], 1);
        assert_eq!(data["regs"]["ext"]["us_privacy"], "1YNN");
        assert_eq!(data["user"]["ext"]["consent"], "CONSENT");
    }

    #[test]
    fn padded_numeric_strings_are_trimmed_on_the_wire() {
        let padded = bid(json!({ "banner": [[300, 250]] }), json!({ "site": " 7 ", "placement": "\t42 " }));
        let requests = build_requests(&AdapterConfig::default(), &[padded], &AuctionContext::default());
        let data = payload(&requests[0]);
        assert_eq!(data["site"]["id"], "7");
        assert_eq!(data["imp"][0]["ext"]["placement"], "42");
    }

    #[test]
    fn endpoint_comes_from_config() {
        let config = AdapterConfig::default().with_endpoint(Some("http://127.0.0.1:9001/openrtb/prebid"));
        let requests = build_requests(&config, &[banner_bid()], &AuctionContext::default());
        assert_eq!(requests[0].url, "http://127.0.0.1:9001/openrtb/prebid");
    }

    proptest! {
        #[test]
        fn building_is_idempotent(site in 1u32..100_000, placement in 1u32..100_000, debug in any::<bool>(), with_video in any::<bool>()) {
            let media = if with_video {
                json!({ "banner": [[300, 250]], "video": { "playerSize": [640, 480], "context": "instream" } })
            } else {
                json!({ "banner": [[300, 250]] })
            };
            let bids = vec![bid(media, json!({ "site": site, "placement": placement }))];
            let ctx = AuctionContext { debug, ..Default::default() };
            let first = build_requests(&AdapterConfig::default(), &bids, &ctx);
            let second = build_requests(&AdapterConfig::default(), &bids, &ctx);
            prop_assert_eq!(first.len(), if with_video { 2 } else { 1 });
            prop_assert_eq!(first, second);
        }
    }
}
