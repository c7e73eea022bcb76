use axum::{extract::State, response::IntoResponse};

use crate::{error::ApiResult, response::success, routes::AppState};

/// 首页概览：Broker 图表与最近24小时执行统计
pub async fn get_overview(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let overview = state.dashboard.overview().await?;
    Ok(success(overview))
}
