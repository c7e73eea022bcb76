use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    response::{accepted, success},
    routes::AppState,
};

fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("无效的执行ID: {raw}")))
}

/// 获取单次执行的参数与日志
pub async fn get_execution(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let task_id = parse_task_id(&task_id)?;
    let detail = state.dashboard.execution_detail(task_id).await?;
    Ok(success(detail))
}

/// 以该次执行的参数重新派发
pub async fn redispatch_execution(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let task_id = parse_task_id(&task_id)?;
    let accepted_dispatch = state.dashboard.redispatch(task_id).await?;
    Ok(accepted(accepted_dispatch))
}
