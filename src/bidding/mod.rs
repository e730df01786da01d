pub mod hooks;
pub mod interpreter;
pub mod pixel;
pub mod renderer;
pub mod request_builder;
pub mod ssp_client;
pub mod validator;

use std::sync::Arc;

use crate::config::config_manager::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::model::bid::InternalBid;
use crate::model::bid_request::BidRequest;
use crate::model::context::{AuctionContext, GdprConsent};
use crate::model::wire::{WireRequest, WireResponse};

use self::hooks::{BillingPixel, SyncOptions, UserSync};
use self::renderer::PlayerRegistry;

/// 框架调用的五个入口。无可变状态，可在多个 auction 间并发共享
pub struct MichaoAdapter {
    config: AdapterConfig,
    pixel: Arc<dyn BillingPixel>,
    players: PlayerRegistry,
}

impl MichaoAdapter {
    pub fn new(config: AdapterConfig, pixel: Arc<dyn BillingPixel>) -> Self {
        Self {
            config,
            pixel,
            players: PlayerRegistry::new(),
        }
    }

    /// 已加载的 outstream 播放器，按脚本地址索引
    pub fn with_players(mut self, players: PlayerRegistry) -> Self {
        self.players = players;
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn code(&self) -> &str {
        &self.config.bidder_code
    }

    pub fn is_bid_request_valid(&self, bid: &BidRequest) -> bool {
        validator::is_bid_request_valid(bid)
    }

    pub fn build_requests(&self, valid_bids: &[BidRequest], ctx: &AuctionContext) -> Vec<WireRequest> {
        request_builder::build_requests(&self.config, valid_bids, ctx)
    }

    pub fn interpret_response(&self, response: &WireResponse, request: &WireRequest) -> Vec<InternalBid> {
        interpreter::interpret_response(&self.config, response, request)
    }

    pub fn get_user_syncs(
        &self,
        options: &SyncOptions,
        server_responses: &[WireResponse],
        gdpr_consent: Option<&GdprConsent>,
        usp_consent: Option<&str>,
    ) -> Vec<UserSync> {
        hooks::get_user_syncs(&self.config, options, server_responses, gdpr_consent, usp_consent)
    }

    pub fn on_bid_billable(&self, bid: &InternalBid) -> Option<String> {
        hooks::on_bid_billable(bid, self.pixel.as_ref())
    }

    /// 展示 outstream 视频 bid：调用 bid 上的渲染钩子
    pub fn render_outstream(&self, bid: &InternalBid) -> Result<()> {
        let renderer = bid
            .renderer
            .as_ref()
            .ok_or_else(|| AdapterError::Render(format!("bid {} has no outstream renderer", bid.request_id)))?;
        renderer.render(&self.players, bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::pixel::NoopPixel;
    use crate::bidding::renderer::OutstreamPlayer;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn adapter() -> MichaoAdapter {
        MichaoAdapter::new(AdapterConfig::default(), Arc::new(NoopPixel))
    }

    #[test]
    fn adapter_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MichaoAdapter>();
    }

    #[test]
    fn full_cycle_through_facade() {
        let adapter = adapter();
        assert_eq!(adapter.code(), "michao");

        let bids: Vec<BidRequest> = serde_json::from_value(json!([
            {
                "adUnitCode": "test-div",
                "auctionId": "auction-1",
                "bidId": "bid-1",
                "bidder": "michao",
                "bidderRequestId": "bidder-request-1",
                "mediaType": { "banner": { "sizes": [[300, 250]] } },
                "params": { "site": 12, "placement": 12 }
            },
            {
                "adUnitCode": "test-div",
                "auctionId": "auction-1",
                "bidId": "bid-2",
                "bidder": "michao",
                "bidderRequestId": "bidder-request-1",
                "mediaType": {
                    "video": { "context": "outstream", "playerSize": [640, 480], "mimes": ["video/mp4"], "minduration": 0, "maxduration": 30 }
                },
                "params": { "site": 12, "placement": 12 }
            },
            { "bidId": "bid-3", "params": "broken" }
        ]))
        .unwrap();

        let valid: Vec<BidRequest> = bids.into_iter().filter(|bid| adapter.is_bid_request_valid(bid)).collect();
        assert_eq!(valid.len(), 2);

        let requests = adapter.build_requests(&valid, &AuctionContext::default());
        assert_eq!(requests.len(), 2);

        let response = WireResponse::from_body(json!({
            "id": "bidder-request-1",
            "seatbid": [{ "bid": [{ "id": "s1", "impid": "bid-2", "price": 1.5, "adm": "<VAST version=\"3.0\"></VAST>", "burl": "https://michao-ssp.com/bill?p=${AUCTION_PRICE}" }] }]
        }));
        let internal = adapter.interpret_response(&response, &requests[1]);
        assert_eq!(internal.len(), 1);
        assert!(internal[0].renderer.is_some());
        assert_eq!((internal[0].width, internal[0].height), (640, 480));

        assert_eq!(
            adapter.on_bid_billable(&internal[0]).as_deref(),
            Some("https://michao-ssp.com/bill?p=1.5")
        );
    }

    #[derive(Default)]
    struct CountingPlayer {
        renders: AtomicUsize,
    }

    impl OutstreamPlayer for CountingPlayer {
        fn render(&self, ad_unit_code: &str, _bid: &InternalBid) -> Result<()> {
            assert_eq!(ad_unit_code, "video-div");
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn outstream_bid_renders_through_loaded_player() {
        let player = Arc::new(CountingPlayer::default());
        let config = AdapterConfig::default();
        let mut players = PlayerRegistry::new();
        players.register(&config.renderer_url, player.clone());
        let adapter = MichaoAdapter::new(config, Arc::new(NoopPixel)).with_players(players);

        let bid: BidRequest = serde_json::from_value(json!({
            "adUnitCode": "video-div",
            "auctionId": "auction-1",
            "bidId": "bid-9",
            "mediaTypes": { "video": { "context": "outstream", "playerSize": [640, 480] } },
            "params": { "site": 1, "placement": 2 }
        }))
        .unwrap();
        let requests = adapter.build_requests(&[bid], &AuctionContext::default());
        let response = WireResponse::from_body(json!({
            "seatbid": [{ "bid": [{ "id": "s1", "impid": "bid-9", "price": 2.0, "adm": "<VAST/>" }] }]
        }));
        let internal = adapter.interpret_response(&response, &requests[0]);

        adapter.render_outstream(&internal[0]).unwrap();
        assert_eq!(player.renders.load(Ordering::SeqCst), 1);

        let banner = InternalBid::default();
        assert!(matches!(adapter.render_outstream(&banner), Err(AdapterError::Render(_))));
    }
}
