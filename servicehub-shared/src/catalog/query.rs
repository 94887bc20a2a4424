/// Owner-scoped listing and detail reads
///
/// Every query binds the caller's user id, so rows owned by anyone else are
/// never returned whatever the filters say.
///
/// Ordering: labels by name descending, services by id descending (newest first).

use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{
    filters::{LabelFilter, ServiceFilter},
    CatalogError, CatalogResult,
};
use crate::models::{
    label::{Label, LabelKind},
    service::{Service, SERVICE_COLUMNS},
};

/// Service as it appears in listings: links as ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub id: i64,
    pub title: String,
    pub price: BigDecimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub components: Vec<i64>,
}

/// Service with its linked labels expanded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDetail {
    pub service: Service,
    pub tags: Vec<Label>,
    pub components: Vec<Label>,
}

/// Lists the caller's tags or components
///
/// With `assigned_only` the label table is joined to its link table and the
/// result made `DISTINCT`, so a label linked to several services still appears
/// once.
pub async fn list_labels(
    pool: &PgPool,
    kind: LabelKind,
    owner: Uuid,
    filter: LabelFilter,
) -> CatalogResult<Vec<Label>> {
    let sql = if filter.assigned_only {
        format!(
            "SELECT DISTINCT l.id, l.user_id, l.name, l.created_at \
             FROM {table} l \
             JOIN {link} j ON j.{column} = l.id \
             WHERE l.user_id = $1 \
             ORDER BY l.name DESC, l.id DESC",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column(),
        )
    } else {
        format!(
            "SELECT l.id, l.user_id, l.name, l.created_at \
             FROM {table} l \
             WHERE l.user_id = $1 \
             ORDER BY l.name DESC, l.id DESC",
            table = kind.table(),
        )
    };

    let labels = sqlx::query_as::<_, Label>(&sql)
        .bind(owner)
        .fetch_all(pool)
        .await?;

    debug!(
        %owner,
        %kind,
        assigned_only = filter.assigned_only,
        count = labels.len(),
        "Listed labels"
    );
    Ok(labels)
}

/// Lists the caller's services matching `filter`
///
/// A service matches an id list if it links at least one of the ids. `EXISTS`
/// keeps each service to one row regardless of how many of its links match.
pub async fn list_services(
    pool: &PgPool,
    owner: Uuid,
    filter: &ServiceFilter,
) -> CatalogResult<Vec<ServiceSummary>> {
    let sql = format!(
        "SELECT {columns} FROM services s \
         WHERE s.user_id = $1 \
           AND ($2::BIGINT[] IS NULL OR EXISTS ( \
                SELECT 1 FROM service_tags st \
                WHERE st.service_id = s.id AND st.tag_id = ANY($2))) \
           AND ($3::BIGINT[] IS NULL OR EXISTS ( \
                SELECT 1 FROM service_components sc \
                WHERE sc.service_id = s.id AND sc.component_id = ANY($3))) \
         ORDER BY s.id DESC",
        columns = qualified_service_columns("s"),
    );

    let services = sqlx::query_as::<_, Service>(&sql)
        .bind(owner)
        .bind(filter.tags.as_deref())
        .bind(filter.components.as_deref())
        .fetch_all(pool)
        .await?;

    let ids: Vec<i64> = services.iter().map(|s| s.id).collect();
    let mut tags = group_pairs(Service::link_pairs(pool, LabelKind::Tag, &ids).await?);
    let mut components = group_pairs(Service::link_pairs(pool, LabelKind::Component, &ids).await?);

    debug!(%owner, ?filter, count = services.len(), "Listed services");

    Ok(services
        .into_iter()
        .map(|s| ServiceSummary {
            tags: tags.remove(&s.id).unwrap_or_default(),
            components: components.remove(&s.id).unwrap_or_default(),
            id: s.id,
            title: s.title,
            price: s.price,
            link: s.link,
            image: s.image,
        })
        .collect())
}

/// Reads one of the caller's services with its labels
///
/// A service owned by someone else is reported exactly like a missing one.
pub async fn get_service(pool: &PgPool, owner: Uuid, id: i64) -> CatalogResult<ServiceDetail> {
    let service = Service::find_for_owner(pool, id, owner)
        .await?
        .ok_or(CatalogError::NotFound("Service"))?;

    let mut conn = pool.acquire().await?;
    load_detail(&mut conn, service).await
}

/// Expands a service row into a detail using `conn` (pool connection or transaction)
pub(crate) async fn load_detail(
    conn: &mut PgConnection,
    service: Service,
) -> CatalogResult<ServiceDetail> {
    let tags = Label::linked_to_service(&mut *conn, LabelKind::Tag, service.id).await?;
    let components = Label::linked_to_service(&mut *conn, LabelKind::Component, service.id).await?;

    Ok(ServiceDetail {
        service,
        tags,
        components,
    })
}

fn qualified_service_columns(alias: &str) -> String {
    SERVICE_COLUMNS
        .split(", ")
        .map(|column| format!("{}.{}", alias, column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn group_pairs(pairs: Vec<(i64, i64)>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (service_id, label_id) in pairs {
        grouped.entry(service_id).or_default().push(label_id);
    }
    grouped
}
