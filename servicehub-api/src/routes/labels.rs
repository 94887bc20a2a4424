/// Handlers shared by the tag and component endpoints
///
/// Tags and components behave identically; the public modules
/// [`super::tags`] and [`super::components`] fix the [`LabelKind`] and
/// delegate here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use servicehub_shared::{
    auth::middleware::AuthContext,
    catalog::{filters::LabelFilter, query},
    models::label::{Label, LabelKind},
};
use tracing::info;
use validator::Validate;

/// Query parameters of the listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LabelListQuery {
    /// `1`/`true` to list only labels linked to a service
    pub assigned_only: Option<String>,
}

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLabelRequest {
    /// Display name; surrounding whitespace is dropped
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

/// Label as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelResponse {
    pub id: i64,
    pub name: String,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
        }
    }
}

pub(super) async fn list(
    state: &AppState,
    auth: AuthContext,
    kind: LabelKind,
    params: LabelListQuery,
) -> ApiResult<Json<Vec<LabelResponse>>> {
    let filter = LabelFilter::from_params(params.assigned_only.as_deref())?;
    let labels = query::list_labels(&state.db, kind, auth.user_id, filter).await?;

    Ok(Json(labels.into_iter().map(LabelResponse::from).collect()))
}

pub(super) async fn create(
    state: &AppState,
    auth: AuthContext,
    kind: LabelKind,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LabelResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("name", "This field may not be blank."));
    }

    let label = Label::create(&state.db, kind, auth.user_id, name).await?;

    info!(user_id = %auth.user_id, %kind, label_id = label.id, "Label created");
    Ok((StatusCode::CREATED, Json(label.into())))
}

pub(super) async fn delete(
    state: &AppState,
    auth: AuthContext,
    kind: LabelKind,
    id: i64,
) -> ApiResult<StatusCode> {
    if !Label::delete_for_owner(&state.db, kind, id, auth.user_id).await? {
        return Err(ApiError::NotFound(format!("{} not found", noun(kind))));
    }

    info!(user_id = %auth.user_id, %kind, label_id = id, "Label deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn noun(kind: LabelKind) -> &'static str {
    match kind {
        LabelKind::Tag => "Tag",
        LabelKind::Component => "Component",
    }
}
