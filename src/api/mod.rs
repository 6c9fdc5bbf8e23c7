//! API 模块
//!
//! HTTP handlers 和路由组装

pub mod compose;
pub mod health;

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::env::constants::MAX_BODY_BYTES;
use crate::state::AppState;

/// 构建完整的 API 路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Liveness
        .merge(health::router())
        // Install / Upgrade / Start
        .merge(compose::router())
        // Middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
