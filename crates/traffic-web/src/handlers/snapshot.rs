//! 스냅샷 API 핸들러.

use axum::extract::{Query, State};
use axum::Json;

use super::{now_ms, AppQuery};
use crate::error::ApiError;
use crate::store::Snapshot;
use crate::AppState;

/// GET /api/snapshot?appId=
pub async fn get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<AppQuery>,
) -> Result<Json<Snapshot>, ApiError> {
    let app_id = query.require()?;
    Ok(Json(state.store.snapshot(&app_id, now_ms())))
}
