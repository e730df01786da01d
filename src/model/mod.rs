pub mod bid;
pub mod bid_request;
pub mod context;
pub mod params;
pub mod wire;

pub use bid::{BidMeta, InternalBid};
pub use bid_request::{BannerConfig, BidRequest, MediaType, MediaTypes, NativeConfig, Sizes, VideoConfig, VideoContext};
pub use context::{AuctionContext, GdprConsent, RefererInfo};
pub use params::{MichaoParams, NumericId};
pub use wire::{Method, RequestOptions, WireRequest, WireResponse};
