pub mod event_log;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub use event_log::{AdapterEvent, EventLog, Level};

/// 初始化全局 tracing：JSON 格式，按小时滚动写入 `log_dir/michao.json`。
/// 返回的 guard 必须在进程生命周期内持有，否则缓冲日志会丢失。
pub fn init_tracing(log_dir: &str) -> WorkerGuard {
    let log_file = rolling::hourly(log_dir, "michao.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(non_blocking));
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global tracing subscriber: {}", e);
    }
    guard
}
