// src/bidding/pixel.rs

use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::bidding::hooks::BillingPixel;

/// 通过 reqwest 发送计费像素，在当前 tokio runtime 上后台执行
#[derive(Clone, Default)]
pub struct ReqwestPixel {
    client: Client,
}

impl ReqwestPixel {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl BillingPixel for ReqwestPixel {
    fn fire(&self, url: &str) {
        let Ok(handle) = Handle::try_current() else {
            warn!(%url, "no tokio runtime available, billing pixel dropped");
            return;
        };
        let client = self.client.clone();
        let url = url.to_string();
        handle.spawn(async move {
            match client.get(&url).send().await {
                Ok(resp) => debug!(%url, status = %resp.status(), "billing pixel delivered"),
                Err(e) => warn!(%url, "billing pixel failed: {}", e),
            }
        });
    }
}

/// 不发送任何请求，用于不需要计费回调的场景
#[derive(Clone, Copy, Default)]
pub struct NoopPixel;

impl BillingPixel for NoopPixel {
    fn fire(&self, _url: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firing_outside_runtime_does_not_panic() {
        ReqwestPixel::default().fire("http://127.0.0.1:9/bill?p=1");
    }
}
