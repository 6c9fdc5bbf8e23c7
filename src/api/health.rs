//! 存活检查 API
//!
//! 包含 `GET /` 端点

use axum::{routing::get, Json, Router};
use std::sync::Arc;

use crate::domain::compose::OkResponse;
use crate::state::AppState;

/// 创建存活检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(status))
}

/// 存活检查，始终返回 `{ "ok": true }`
///
/// GET /
async fn status() -> Json<OkResponse> {
    Json(OkResponse::ok())
}
