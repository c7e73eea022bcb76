use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use dashboard_domain::{parse_after, CatalogFilter};
use serde::Deserialize;

use crate::{
    error::ApiResult,
    response::{accepted, success},
    routes::AppState,
};

/// 任务目录查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQueryParams {
    pub q: Option<String>,
    #[serde(default)]
    pub ignore_case: bool,
}

impl From<CatalogQueryParams> for CatalogFilter {
    fn from(params: CatalogQueryParams) -> Self {
        CatalogFilter {
            query: params.q,
            ignore_case: params.ignore_case,
        }
    }
}

/// 任务详情查询参数
#[derive(Debug, Default, Deserialize)]
pub struct TaskDetailQueryParams {
    pub vhost: Option<String>,
    /// 上一页最后一行的游标
    pub after: Option<String>,
}

/// 获取任务目录
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let filter = CatalogFilter::from(params);
    let catalog = state.dashboard.task_catalog(&filter).await?;
    Ok(success(catalog))
}

/// 获取任务详情和一页执行历史
pub async fn get_task(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TaskDetailQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let after = parse_after(params.after.as_deref())?;
    let detail = state
        .dashboard
        .task_detail(&name, params.vhost.as_deref(), after)
        .await?;
    Ok(success(detail))
}

/// 以请求体作为参数派发任务
///
/// 请求体必须是JSON对象，解析后重新序列化再转发给调度器，不保留原始的字段顺序和数字写法。
pub async fn dispatch_task(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let parameters: serde_json::Value = serde_json::from_slice(&body)?;
    let accepted_dispatch = state.dashboard.dispatch(&name, parameters).await?;
    Ok(accepted(accepted_dispatch))
}
