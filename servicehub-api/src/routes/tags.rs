/// Tag endpoints
///
/// - `GET /v1/tags?assigned_only=1` - List the caller's tags, name descending
/// - `POST /v1/tags` - Create a tag (`{"name": "Electrical"}`)
/// - `DELETE /v1/tags/:id` - Delete a tag and its links

use super::labels::{self, CreateLabelRequest, LabelListQuery, LabelResponse};
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use servicehub_shared::{auth::middleware::AuthContext, models::label::LabelKind};

/// List tags
///
/// With `assigned_only` set, each tag linked to at least one service is
/// returned once.
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<LabelListQuery>,
) -> ApiResult<Json<Vec<LabelResponse>>> {
    labels::list(&state, auth, LabelKind::Tag, params).await
}

/// Create a tag
///
/// # Errors
///
/// - `400 Bad Request`: name missing or blank
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LabelResponse>)> {
    labels::create(&state, auth, LabelKind::Tag, payload).await
}

/// Delete a tag
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    labels::delete(&state, auth, LabelKind::Tag, id).await
}
