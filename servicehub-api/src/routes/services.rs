/// Service endpoints
///
/// # Endpoints
///
/// - `GET /v1/services?tags=1,2&components=3` - List the caller's services
/// - `POST /v1/services` - Create a service
/// - `GET /v1/services/:id` - Service detail with nested tags/components
/// - `PATCH /v1/services/:id` - Partial update
/// - `PUT /v1/services/:id` - Full update
/// - `DELETE /v1/services/:id` - Delete a service and its image
/// - `POST /v1/services/:id/image` - Upload an image (multipart field `image`)
///
/// Services owned by another user answer `404` on every `:id` route.
///
/// # Representation
///
/// ```json
/// {
///   "id": 12,
///   "title": "Fitting Job",
///   "price": "120.00",
///   "link": null,
///   "image": "/media/uploads/service/0d9c....png",
///   "tags": [{ "id": 1, "name": "Electrical" }],
///   "components": []
/// }
/// ```
///
/// Listings carry tag and component ids instead of nested objects. Prices are
/// decimal strings with two places.

use super::labels::LabelResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use servicehub_shared::{
    auth::middleware::AuthContext,
    catalog::{
        compose::{self, ServiceDraft, UpdateMode},
        filters::ServiceFilter,
        image::{self, IMAGE_FIELD},
        query::{self, ServiceDetail, ServiceSummary},
    },
    storage::ImageStore,
};

/// Query parameters of `GET /v1/services`
#[derive(Debug, Default, Deserialize)]
pub struct ServiceListQuery {
    /// Comma-separated tag ids; a service matches if it has any of them
    pub tags: Option<String>,

    /// Comma-separated component ids; a service matches if it has any of them
    pub components: Option<String>,
}

/// Service in a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummaryResponse {
    pub id: i64,
    pub title: String,
    pub price: BigDecimal,
    pub link: Option<String>,

    /// Public image URL
    pub image: Option<String>,

    pub tags: Vec<i64>,
    pub components: Vec<i64>,
}

/// Service detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetailResponse {
    pub id: i64,
    pub title: String,
    pub price: BigDecimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<LabelResponse>,
    pub components: Vec<LabelResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Image upload response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceImageResponse {
    pub id: i64,

    /// Public URL of the stored image
    pub image: String,
}

impl ServiceSummaryResponse {
    fn new(summary: ServiceSummary, images: &dyn ImageStore) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            price: summary.price,
            link: summary.link,
            image: summary.image.map(|key| images.public_url(&key)),
            tags: summary.tags,
            components: summary.components,
        }
    }
}

impl ServiceDetailResponse {
    fn new(detail: ServiceDetail, images: &dyn ImageStore) -> Self {
        let ServiceDetail {
            service,
            tags,
            components,
        } = detail;

        Self {
            id: service.id,
            title: service.title,
            price: service.price,
            link: service.link,
            image: service.image.map(|key| images.public_url(&key)),
            tags: tags.into_iter().map(LabelResponse::from).collect(),
            components: components.into_iter().map(LabelResponse::from).collect(),
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}

/// List services
///
/// # Errors
///
/// - `400 Bad Request`: a `tags` or `components` token is not an integer
pub async fn list_services(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ServiceListQuery>,
) -> ApiResult<Json<Vec<ServiceSummaryResponse>>> {
    let filter = ServiceFilter::from_params(params.tags.as_deref(), params.components.as_deref())?;
    let services = query::list_services(&state.db, auth.user_id, &filter).await?;

    Ok(Json(
        services
            .into_iter()
            .map(|summary| ServiceSummaryResponse::new(summary, state.images.as_ref()))
            .collect(),
    ))
}

/// Get one service
pub async fn get_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ServiceDetailResponse>> {
    let detail = query::get_service(&state.db, auth.user_id, id).await?;
    Ok(Json(ServiceDetailResponse::new(detail, state.images.as_ref())))
}

/// Create a service
///
/// # Request
///
/// ```json
/// { "title": "Fitting Job", "price": "120.00", "tags": [1, 2], "components": [] }
/// ```
///
/// The owner is always the caller.
///
/// # Errors
///
/// - `400 Bad Request`: missing title/price, invalid price, unknown tag or component ids
pub async fn create_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<ServiceDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ServiceDetailResponse>)> {
    let Json(draft) = payload?;
    let new = draft.into_new()?;

    let detail = compose::create_service(
        &state.db,
        auth.user_id,
        new,
        state.config.catalog.link_ownership,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ServiceDetailResponse::new(detail, state.images.as_ref())),
    ))
}

/// Partial update: absent fields and link lists stay as they are
pub async fn patch_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    payload: Result<Json<ServiceDraft>, JsonRejection>,
) -> ApiResult<Json<ServiceDetailResponse>> {
    update(&state, auth, id, payload, UpdateMode::Partial).await
}

/// Full update: `title` and `price` required, absent link lists are cleared
pub async fn put_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    payload: Result<Json<ServiceDraft>, JsonRejection>,
) -> ApiResult<Json<ServiceDetailResponse>> {
    update(&state, auth, id, payload, UpdateMode::Full).await
}

async fn update(
    state: &AppState,
    auth: AuthContext,
    id: i64,
    payload: Result<Json<ServiceDraft>, JsonRejection>,
    mode: UpdateMode,
) -> ApiResult<Json<ServiceDetailResponse>> {
    let Json(draft) = payload?;
    let changes = draft.into_changes(mode)?;

    let detail = compose::update_service(
        &state.db,
        auth.user_id,
        id,
        changes,
        state.config.catalog.link_ownership,
    )
    .await?;

    Ok(Json(ServiceDetailResponse::new(detail, state.images.as_ref())))
}

/// Delete a service
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    compose::delete_service(&state.db, state.images.as_ref(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a service image
///
/// # Request
///
/// `multipart/form-data` with the file in field `image`. Other fields are ignored.
///
/// # Errors
///
/// - `400 Bad Request`: no `image` field, or the file is not a supported image
/// - `404 Not Found`: service missing or owned by another user
/// - `413 Payload Too Large`: body over the configured upload limit
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Json<ServiceImageResponse>> {
    let mut bytes = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            bytes = Some(field.bytes().await?.to_vec());
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::invalid(IMAGE_FIELD, "No file was submitted."))?;

    let service = image::attach_image(
        &state.db,
        state.images.as_ref(),
        auth.user_id,
        id,
        bytes,
        state.config.media.max_upload_bytes,
    )
    .await?;

    let key = service
        .image
        .ok_or_else(|| ApiError::InternalError(format!("Service {} has no image after upload", id)))?;

    Ok(Json(ServiceImageResponse {
        id: service.id,
        image: state.images.public_url(&key),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicehub_shared::{
        models::{label::Label, service::Service},
        storage::LocalImageStore,
    };
    use std::str::FromStr;
    use uuid::Uuid;

    fn store() -> LocalImageStore {
        LocalImageStore::new("/srv/media", "/media")
    }

    #[test]
    fn test_summary_response_resolves_image_url() {
        let summary = ServiceSummary {
            id: 4,
            title: "Fitting Job".to_string(),
            price: BigDecimal::from_str("120.00").unwrap(),
            link: None,
            image: Some("uploads/service/a.png".to_string()),
            tags: vec![1, 2],
            components: vec![],
        };

        let response = ServiceSummaryResponse::new(summary, &store());
        assert_eq!(response.image.as_deref(), Some("/media/uploads/service/a.png"));
        assert_eq!(response.tags, vec![1, 2]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["price"], "120.00");
    }

    #[test]
    fn test_detail_response_nests_labels() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let detail = ServiceDetail {
            service: Service {
                id: 9,
                user_id: owner,
                title: "Fitting Job".to_string(),
                price: BigDecimal::from_str("5.00").unwrap(),
                link: Some("https://example.com".to_string()),
                image: None,
                created_at: now,
                updated_at: now,
            },
            tags: vec![Label {
                id: 1,
                user_id: owner,
                name: "Electrical".to_string(),
                created_at: now,
            }],
            components: vec![],
        };

        let json = serde_json::to_value(ServiceDetailResponse::new(detail, &store())).unwrap();
        assert_eq!(json["tags"], serde_json::json!([{ "id": 1, "name": "Electrical" }]));
        assert_eq!(json["image"], serde_json::Value::Null);
        assert!(json.get("user_id").is_none());
    }
}
