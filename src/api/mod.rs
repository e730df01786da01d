pub mod handlers;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

use crate::bidding::ssp_client::SspClient;
use crate::bidding::MichaoAdapter;
use crate::logging::EventLog;

#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<MichaoAdapter>,
    pub transport: Arc<SspClient>,
    pub event_log: Arc<EventLog>,
}

/// 把适配器的各个入口暴露给进程外的 header-bidding 框架
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/validate", post(handlers::handle_validate))
        .route("/build", post(handlers::handle_build))
        .route("/interpret", post(handlers::handle_interpret))
        .route("/syncs", post(handlers::handle_syncs))
        .route("/billable", post(handlers::handle_billable))
        .route("/bids", post(handlers::handle_bids))
        .with_state(state)
}
