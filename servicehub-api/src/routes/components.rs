/// Component endpoints
///
/// - `GET /v1/components?assigned_only=1`
/// - `POST /v1/components`
/// - `DELETE /v1/components/:id`
///
/// Same behavior as the tag endpoints.

use super::labels::{self, CreateLabelRequest, LabelListQuery, LabelResponse};
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use servicehub_shared::{auth::middleware::AuthContext, models::label::LabelKind};

pub async fn list_components(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<LabelListQuery>,
) -> ApiResult<Json<Vec<LabelResponse>>> {
    labels::list(&state, auth, LabelKind::Component, params).await
}

pub async fn create_component(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LabelResponse>)> {
    labels::create(&state, auth, LabelKind::Component, payload).await
}

pub async fn delete_component(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    labels::delete(&state, auth, LabelKind::Component, id).await
}
