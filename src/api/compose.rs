//! compose 升级 API
//!
//! 包含 /install, /upgrade, /start 端点

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::compose::{FileResult, OkResponse, UpdateMode, UpdateRequest, UpdateResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 创建 compose 升级路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/install", post(install))
        .route("/upgrade", post(upgrade))
        .route("/start", post(start))
}

/// 安装新的 compose 文件
///
/// POST /install
async fn install(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateResponse>> {
    update(&state, payload, UpdateMode::Install).await
}

/// 升级已有的 compose 文件
///
/// POST /upgrade
async fn upgrade(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateResponse>> {
    update(&state, payload, UpdateMode::Upgrade).await
}

/// 逐个处理文件，全部完成后重新启动容器
///
/// 不是事务：中途失败时，之前已处理的文件保持更新后的状态
async fn update(
    state: &AppState,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
    mode: UpdateMode,
) -> ApiResult<Json<UpdateResponse>> {
    let files = match payload {
        Ok(Json(request)) => request.into_files(),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected update payload");
            None
        }
    }
    .ok_or_else(ApiError::invalid_payload)?;

    let _guard = state.lock_operations().await;
    let orchestrator = &state.orchestrator;
    let mut response = UpdateResponse::with_capacity(files.len());

    for (file_name, contents) in files {
        let updated = orchestrator
            .update(&file_name, &contents, mode.is_install())
            .await
            .map_err(|e| {
                error!(file = %file_name, ?mode, error = %e, "Error while upgrading");
                ApiError::from(e)
            })?;

        let result = if updated {
            FileResult::updated()
        } else {
            FileResult::skipped(mode)
        };
        response.insert(file_name, result);
    }

    orchestrator.start_up().await.map_err(|e| {
        error!(error = %e, "Error while starting containers");
        ApiError::from(e)
    })?;

    info!(?mode, files = response.len(), "Update request finished");
    Ok(Json(response))
}

/// 启动所有合法的 compose 文件
///
/// POST /start
async fn start(State(state): State<Arc<AppState>>) -> ApiResult<Json<OkResponse>> {
    let _guard = state.lock_operations().await;

    state.orchestrator.start_up().await.map_err(|e| {
        error!(error = %e, "Error while starting containers");
        ApiError::from(e)
    })?;

    Ok(Json(OkResponse::ok()))
}
