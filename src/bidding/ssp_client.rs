// src/bidding/ssp_client.rs

use std::time::Instant;

use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::time::{timeout, Duration};
use tracing::warn;

use crate::error::{AdapterError, Result};
use crate::model::wire::{WireRequest, WireResponse};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "result", content = "reason")]
pub enum TransportOutcome {
    Success,
    NoContent,
    Failed(String),
}

/// 一次请求-响应交换，响应与原始 wire request 配对
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: WireRequest,
    pub response: WireResponse,
    pub outcome: TransportOutcome,
    pub elapsed_ms: u128,
}

/// 执行 wire request 的轻量传输层：每个请求只发送一次，不重试
pub struct SspClient {
    client: Client,
    timeout: Duration,
}

impl SspClient {
    pub fn new(client: Client, timeout_ms: u64) -> Self {
        Self {
            client,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// 并发发送所有请求，结果顺序与输入一致
    pub async fn execute_all(&self, requests: Vec<WireRequest>) -> Vec<Exchange> {
        let tasks = requests.into_iter().map(|request| {
            let client = self.client.clone();
            let timeout_duration = self.timeout;
            async move {
                let start = Instant::now();
                let result = send(&client, &request, timeout_duration).await;
                let elapsed_ms = start.elapsed().as_millis();
                let (response, outcome) = match result {
                    Ok(response) if response.body.is_some() => (response, TransportOutcome::Success),
                    Ok(response) => (response, TransportOutcome::NoContent),
                    Err(e) => {
                        warn!(url = %request.url, "SSP request failed: {}", e);
                        (WireResponse::default(), TransportOutcome::Failed(e.to_string()))
                    }
                };
                Exchange {
                    request,
                    response,
                    outcome,
                    elapsed_ms,
                }
            }
        });
        join_all(tasks).await
    }
}

async fn send(client: &Client, request: &WireRequest, timeout_duration: Duration) -> Result<WireResponse> {
    timeout(timeout_duration, fetch(client, request))
        .await
        .map_err(|_| AdapterError::Timeout {
            url: request.url.clone(),
            timeout_ms: timeout_duration.as_millis() as u64,
        })?
}

async fn fetch(client: &Client, request: &WireRequest) -> Result<WireResponse> {
    let resp = client
        .post(&request.url)
        .header(CONTENT_TYPE, request.options.content_type.as_str())
        .json(&request.data)
        .send()
        .await?
        .error_for_status()?;
    if resp.status() == StatusCode::NO_CONTENT {
        return Ok(WireResponse::default());
    }
    let bytes = resp.bytes().await?;
    Ok(WireResponse::from_bytes(bytes.to_vec()))
}
