/// Service rows and their label links
///
/// Row-level primitives only. Ownership-scoped listing lives in
/// [`crate::catalog::query`] and transactional create/update in
/// [`crate::catalog::compose`]; both call into this module.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE services (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     price NUMERIC(10, 2) NOT NULL CHECK (price >= 0),
///     link VARCHAR(255),
///     image VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::label::LabelKind;

pub(crate) const SERVICE_COLUMNS: &str =
    "id, user_id, title, price, link, image, created_at, updated_at";

/// Service row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: i64,

    /// Owner
    pub user_id: Uuid,

    pub title: String,

    /// Non-negative, two decimal places
    pub price: BigDecimal,

    /// Optional external reference (quote, booking page)
    pub link: Option<String>,

    /// Storage key of the attached image, if any
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values written on insert and update
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceFields {
    pub title: String,
    pub price: BigDecimal,
    pub link: Option<String>,
}

impl Service {
    pub async fn insert(
        conn: &mut PgConnection,
        owner: Uuid,
        fields: &ServiceFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (user_id, title, price, link) VALUES ($1, $2, $3, $4) RETURNING {}",
            SERVICE_COLUMNS
        ))
        .bind(owner)
        .bind(&fields.title)
        .bind(&fields.price)
        .bind(&fields.link)
        .fetch_one(conn)
        .await
    }

    /// Finds a service by id if `owner` owns it
    pub async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {} FROM services WHERE id = $1 AND user_id = $2",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Like [`Service::find_for_owner`] but row-locks the service until the
    /// surrounding transaction ends
    pub async fn lock_for_owner(
        conn: &mut PgConnection,
        id: i64,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {} FROM services WHERE id = $1 AND user_id = $2 FOR UPDATE",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await
    }

    /// Overwrites all mutable columns
    pub async fn update_fields(
        conn: &mut PgConnection,
        id: i64,
        fields: &ServiceFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "UPDATE services SET title = $2, price = $3, link = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.price)
        .bind(&fields.link)
        .fetch_one(conn)
        .await
    }

    /// Points the service at a new image key
    pub async fn set_image(
        conn: &mut PgConnection,
        id: i64,
        image: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "UPDATE services SET image = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(image)
        .fetch_one(conn)
        .await
    }

    /// Deletes a service owned by `owner`, returning the deleted row
    pub async fn delete_for_owner(
        pool: &PgPool,
        id: i64,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "DELETE FROM services WHERE id = $1 AND user_id = $2 RETURNING {}",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Replaces the whole link set of one kind for a service
    ///
    /// Duplicate ids are collapsed. Run inside a transaction so the delete and
    /// the insert are observed together.
    pub async fn replace_links(
        conn: &mut PgConnection,
        kind: LabelKind,
        service_id: i64,
        label_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE service_id = $1",
            kind.link_table()
        ))
        .bind(service_id)
        .execute(&mut *conn)
        .await?;

        if label_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(&format!(
            "INSERT INTO {link} (service_id, {column}) \
             SELECT $1, label_id FROM UNNEST($2::BIGINT[]) AS label_id \
             ON CONFLICT DO NOTHING",
            link = kind.link_table(),
            column = kind.link_column(),
        ))
        .bind(service_id)
        .bind(label_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// `(service_id, label_id)` pairs for a batch of services, ordered by both
    pub async fn link_pairs(
        pool: &PgPool,
        kind: LabelKind,
        service_ids: &[i64],
    ) -> Result<Vec<(i64, i64)>, sqlx::Error> {
        if service_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, (i64, i64)>(&format!(
            "SELECT service_id, {column} FROM {link} \
             WHERE service_id = ANY($1) \
             ORDER BY service_id, {column}",
            link = kind.link_table(),
            column = kind.link_column(),
        ))
        .bind(service_ids)
        .fetch_all(pool)
        .await
    }
}
