// src/logging/event_log.rs

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task;
use tokio::time::{self, Duration};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    const ALL: [Level; 3] = [Level::Info, Level::Warn, Level::Error];

    fn file_suffix(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

/// 适配器事件，如 requests_built / bid_requests_skipped / transport_failed
#[derive(Serialize, Debug, Clone)]
pub struct AdapterEvent {
    pub timestamp: String,
    pub level: Level,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<String>,
    pub details: Value,
}

impl AdapterEvent {
    pub fn new(level: Level, event: &str, auction_id: Option<&str>, details: Value) -> Self {
        let now = Utc::now();
        let timestamp = match FixedOffset::east_opt(8 * 3600) {
            Some(tz) => now.with_timezone(&tz).to_rfc3339(),
            None => now.to_rfc3339(),
        };
        Self {
            timestamp,
            level,
            event: event.to_string(),
            auction_id: auction_id.map(str::to_string),
            details,
        }
    }
}

/// 事件日志：按级别写入不同的小时滚动文件，后台批量刷盘
pub struct EventLog {
    sender: Sender<AdapterEvent>,
}

impl EventLog {
    /// - `log_dir`: 日志目录
    /// - `file_prefix`: 文件前缀，最终文件名形如 `events_info.json`
    /// - `buffer_size`: mpsc 通道容量
    /// - `batch_size`: 单个级别累计多少条后立即写盘
    /// - `flush_interval`: 定时刷盘间隔（毫秒）
    pub fn new(
        log_dir: &str,
        file_prefix: &str,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: u64,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let appenders: HashMap<Level, Arc<RollingFileAppender>> = Level::ALL
            .into_iter()
            .map(|level| {
                let file_name = format!("{}_{}.json", file_prefix, level.file_suffix());
                (level, Arc::new(rolling::hourly(log_dir, file_name)))
            })
            .collect();
        tokio::spawn(Self::background_writer(appenders, receiver, batch_size, flush_interval));
        Arc::new(Self { sender })
    }

    /// 不阻塞调用方；通道已满时丢弃事件
    pub fn record(&self, event: AdapterEvent) {
        if let Err(e) = self.sender.try_send(event) {
            tracing::warn!("dropping adapter event: {}", e);
        }
    }

    pub fn info(&self, event: &str, auction_id: Option<&str>, details: Value) {
        self.record(AdapterEvent::new(Level::Info, event, auction_id, details));
    }

    pub fn warn(&self, event: &str, auction_id: Option<&str>, details: Value) {
        self.record(AdapterEvent::new(Level::Warn, event, auction_id, details));
    }

    pub fn error(&self, event: &str, auction_id: Option<&str>, details: Value) {
        self.record(AdapterEvent::new(Level::Error, event, auction_id, details));
    }

    async fn background_writer(
        appenders: HashMap<Level, Arc<RollingFileAppender>>,
        mut receiver: Receiver<AdapterEvent>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        let mut buffers: HashMap<Level, Vec<String>> = HashMap::new();
        let mut interval = time::interval(Duration::from_millis(flush_interval));
        loop {
            tokio::select! {
                received = receiver.recv() => {
                    let Some(event) = received else { break };
                    let level = event.level;
                    let line = serde_json::to_string(&event).unwrap_or_default();
                    let buffer = buffers.entry(level).or_default();
                    buffer.push(line);
                    if buffer.len() >= batch_size {
                        if let Some(appender) = appenders.get(&level) {
                            Self::write_to_disk(appender.clone(), std::mem::take(buffer)).await;
                        }
                    }
                }
                _ = interval.tick() => {
                    for (level, buffer) in buffers.iter_mut() {
                        if buffer.is_empty() {
                            continue;
                        }
                        if let Some(appender) = appenders.get(level) {
                            Self::write_to_disk(appender.clone(), std::mem::take(buffer)).await;
                        }
                    }
                }
            }
        }
        // 通道关闭后把剩余事件写完
        for (level, buffer) in buffers {
            if let (false, Some(appender)) = (buffer.is_empty(), appenders.get(&level)) {
                Self::write_to_disk(appender.clone(), buffer).await;
            }
        }
    }

    async fn write_to_disk(appender: Arc<RollingFileAppender>, lines: Vec<String>) {
        let content = lines.join("\n") + "\n";
        let result = task::spawn_blocking(move || {
            let mut writer = appender.make_writer();
            if let Err(e) = writer.write_all(content.as_bytes()) {
                eprintln!("Failed to write adapter events: {}", e);
            }
        })
        .await;
        if let Err(e) = result {
            eprintln!("Adapter event writer task failed: {}", e);
        }
    }
}
