// src/model/bid_request.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 媒体类型。数组顺序即 wire request 的生成顺序：banner → video → native
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Banner,
    Video,
    Native,
}

impl MediaType {
    pub const PRIORITY: [MediaType; 3] = [MediaType::Banner, MediaType::Video, MediaType::Native];
}

/// 尺寸列表，兼容 `[300, 250]` 与 `[[300, 250], [728, 90]]` 两种写法
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "SizesRepr")]
pub struct Sizes(pub Vec<(u32, u32)>);

#[derive(Deserialize)]
#[serde(untagged)]
enum SizesRepr {
    Many(Vec<(u32, u32)>),
    One((u32, u32)),
}

impl From<SizesRepr> for Sizes {
    fn from(repr: SizesRepr) -> Self {
        match repr {
            SizesRepr::Many(sizes) => Sizes(sizes),
            SizesRepr::One(size) => Sizes(vec![size]),
        }
    }
}

impl Sizes {
    pub fn first(&self) -> Option<(u32, u32)> {
        self.0.first().copied()
    }
}

/// banner 配置，也接受直接给出尺寸列表的旧写法
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "BannerRepr")]
pub struct BannerConfig {
    pub sizes: Sizes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BannerRepr {
    Sizes(Sizes),
    Config {
        #[serde(default)]
        sizes: Sizes,
        #[serde(default)]
        pos: Option<i32>,
    },
}

impl From<BannerRepr> for BannerConfig {
    fn from(repr: BannerRepr) -> Self {
        match repr {
            BannerRepr::Sizes(sizes) => BannerConfig { sizes, pos: None },
            BannerRepr::Config { sizes, pos } => BannerConfig { sizes, pos },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoContext {
    Instream,
    Outstream,
    Adpod,
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<VideoContext>,
    pub player_size: Sizes,
    pub mimes: Vec<String>,
    /// 其余 OpenRTB video 参数（minduration、protocols 等）
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl VideoConfig {
    pub fn is_outstream(&self) -> bool {
        self.context == Some(VideoContext::Outstream)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NativeConfig {
    /// OpenRTB native request 对象
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ortb: Option<Value>,
}

/// 广告位声明的媒体类型集合，按 key 是否存在判断，不看内容是否为空
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MediaTypes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<BannerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeConfig>,
}

impl MediaTypes {
    pub fn declares(&self, media_type: MediaType) -> bool {
        match media_type {
            MediaType::Banner => self.banner.is_some(),
            MediaType::Video => self.video.is_some(),
            MediaType::Native => self.native.is_some(),
        }
    }

    pub fn declared(&self) -> Vec<MediaType> {
        MediaType::PRIORITY
            .into_iter()
            .filter(|media_type| self.declares(*media_type))
            .collect()
    }

    /// 只保留指定媒体类型的配置
    pub fn only(&self, media_type: MediaType) -> MediaTypes {
        MediaTypes {
            banner: self.banner.clone().filter(|_| media_type == MediaType::Banner),
            video: self.video.clone().filter(|_| media_type == MediaType::Video),
            native: self.native.clone().filter(|_| media_type == MediaType::Native),
        }
    }
}

/// 框架传入的单个广告位竞价请求，对适配器只读
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BidRequest {
    pub bid_id: String,
    pub auction_id: String,
    pub ad_unit_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// 原始参数包，形状由 validator 判定
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(alias = "mediaType")]
    pub media_types: MediaTypes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schain: Option<Value>,
}

impl BidRequest {
    /// 浅拷贝一份只含单一媒体类型的请求
    pub fn scoped_to(&self, media_type: MediaType) -> BidRequest {
        BidRequest {
            media_types: self.media_types.only(media_type),
            ..self.clone()
        }
    }
}
