// src/main.rs

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use rust_michao::api::{self, AppState};
use rust_michao::bidding::pixel::ReqwestPixel;
use rust_michao::bidding::ssp_client::SspClient;
use rust_michao::bidding::MichaoAdapter;
use rust_michao::config::{ConfigAdapter, FileConfigAdapter};
use rust_michao::logging::{self, EventLog};
use rust_michao::mock_ssp;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "Michao SSP OpenRTB bid adapter service")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// 适配器配置文件
    #[arg(long, default_value = "static/michao.json")]
    config: String,
    /// 本地 Mock SSP 端口，不传则不启动
    #[arg(long)]
    mock_port: Option<u16>,
    /// 覆盖配置中的 SSP endpoint
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() {
    // 设置环境变量 TZ 为东八区
    std::env::set_var("TZ", "Asia/Shanghai");

    let args = CliArgs::parse();

    // 初始化全局 tracing 日志，guard 需要一直持有
    let _guard = logging::init_tracing(&args.log_dir);
    info!("Michao adapter service starting on port {}", args.port);

    let event_log = EventLog::new(&args.log_dir, "events", 1000, 100, 1000);

    let config = match FileConfigAdapter::new(&args.config).get_adapter_config() {
        Ok(config) => config.with_endpoint(args.endpoint.as_deref()),
        Err(e) => {
            error!("failed to load adapter config: {}", e);
            eprintln!("failed to load adapter config: {}", e);
            std::process::exit(1);
        }
    };
    info!(endpoint = %config.endpoint, ttl = config.ttl, "adapter config loaded");

    if let Some(mock_port) = args.mock_port {
        tokio::spawn(async move {
            if let Err(e) = mock_ssp::start_mock_ssp_server(mock_port).await {
                error!("mock SSP stopped: {}", e);
            }
        });
    }

    let client = reqwest::Client::new();
    let state = Arc::new(AppState {
        transport: Arc::new(SspClient::new(client.clone(), config.timeout_ms)),
        adapter: Arc::new(MichaoAdapter::new(config, Arc::new(ReqwestPixel::new(client)))),
        event_log,
    });

    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            eprintln!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Michao adapter service running at http://{}", addr);

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
        }
        info!("Shutting down gracefully...");
    };
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!("server error: {}", e);
    }
    info!("Michao adapter service shut down.");
}
