use axum::{routing::post, serve, Json, Router};
use rand::Rng;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::info;
use uuid::Uuid;

use crate::bidding::hooks::AUCTION_PRICE_MACRO;
use crate::openrtb::request::{Imp, OpenRtbRequest};
use crate::openrtb::response::{Bid, OpenRtbResponse, SeatBid};

/// 没有底价时的基础出价
const BASE_PRICE: f64 = 0.5;

/// 模拟 Michao SSP 竞价响应
async fn handle_ssp_bid(Json(request): Json<OpenRtbRequest>) -> Json<OpenRtbResponse> {
    info!(
        "Mock SSP received request: id={}, imp_count={}",
        request.id,
        request.imp.len()
    );

    // 模拟处理延迟（20 ~ 120 毫秒）
    let delay_ms = rand::thread_rng().gen_range(20..120);
    sleep(Duration::from_millis(delay_ms)).await;

    Json(respond(&request))
}

/// 每个 impression 返回一个出价，adm 按媒体类型生成，burl 带成交价宏
pub fn respond(request: &OpenRtbRequest) -> OpenRtbResponse {
    let bids = request.imp.iter().map(mock_bid).collect();
    OpenRtbResponse {
        id: request.id.clone(),
        seatbid: vec![SeatBid {
            bid: bids,
            seat: Some("michao_mock".to_string()),
        }],
        bidid: None,
        cur: Some("USD".to_string()),
        nbr: None,
    }
}

fn mock_bid(imp: &Imp) -> Bid {
    let bid_id = Uuid::new_v4().to_string();
    let mut rng = rand::thread_rng();
    // 不同媒体类型使用不同的 multiplier 范围
    let (multiplier, mtype, w, h, adm) = if let Some(banner) = &imp.banner {
        let multiplier = match (banner.w, banner.h) {
            (Some(300), Some(250)) => rng.gen_range(1.0..3.0),
            (Some(728), Some(90)) => rng.gen_range(0.8..1.2),
            _ => rng.gen_range(1.0..2.0),
        };
        (multiplier, 1, banner.w, banner.h, banner_markup(&bid_id))
    } else if let Some(video) = &imp.video {
        (rng.gen_range(1.0..2.5), 2, video.w, video.h, vast_markup(&bid_id))
    } else if imp.native.is_some() {
        (rng.gen_range(0.8..2.0), 4, None, None, native_markup(&bid_id))
    } else {
        (rng.gen_range(1.0..2.0), 1, None, None, banner_markup(&bid_id))
    };

    let floor = if imp.bidfloor > 0.0 { imp.bidfloor } else { BASE_PRICE };
    let price = (floor * multiplier * 100.0).round() / 100.0;

    Bid {
        id: bid_id.clone(),
        impid: imp.id.clone(),
        price,
        adm: Some(adm),
        adomain: vec!["michao-ssp.com".to_string()],
        crid: Some(format!("crid-{}", imp.ext.placement)),
        dealid: None,
        w,
        h,
        mtype: Some(mtype),
        burl: Some(format!(
            "http://ssp-tracker.local/billing?bid={}&price={}",
            bid_id, AUCTION_PRICE_MACRO
        )),
        nurl: None,
        lurl: None,
    }
}

fn banner_markup(bid_id: &str) -> String {
    format!(
        "<html><body>Mock Michao Banner Ad<br/><a href=\"http://ssp-tracker.local/click?bid={bid_id}\" target=\"_blank\">Click Here</a><img src=\"http://ssp-tracker.local/impression?bid={bid_id}\" style=\"display:none;\" /></body></html>"
    )
}

fn vast_markup(bid_id: &str) -> String {
    format!(
        r#"<VAST version="3.0">
  <Ad id="{bid_id}">
    <InLine>
      <AdSystem>Mock Michao SSP</AdSystem>
      <AdTitle>Mock Video Ad</AdTitle>
      <Impression><![CDATA[http://ssp-tracker.local/impression?bid={bid_id}]]></Impression>
      <Creatives>
        <Creative>
          <Linear>
            <Duration>00:00:30</Duration>
            <MediaFiles>
              <MediaFile delivery="progressive" type="video/mp4" width="640" height="360" bitrate="500">
                http://example.com/video.mp4
              </MediaFile>
            </MediaFiles>
          </Linear>
        </Creative>
      </Creatives>
    </InLine>
  </Ad>
</VAST>"#
    )
}

fn native_markup(bid_id: &str) -> String {
    format!(
        r#"{{"native":{{"assets":[{{"id":1,"title":{{"text":"Mock Native Ad"}}}},{{"id":2,"img":{{"url":"http://example.com/native.jpg"}}}}],"imptrackers":["http://ssp-tracker.local/impression?bid={bid_id}"],"link":{{"url":"http://ssp-tracker.local/click?bid={bid_id}"}}}}}}"#
    )
}

/// 启动 Mock SSP 服务，路由与默认 endpoint 的路径 `/openrtb/prebid` 一致
pub async fn start_mock_ssp_server(port: u16) -> std::io::Result<()> {
    let app = Router::new().route("/openrtb/prebid", post(handle_ssp_bid));

    let addr = format!("0.0.0.0:{}", port);
    info!("Mock SSP running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    serve(listener, app).await
}
