/// Tags and components
///
/// Both are owned, named labels that services link to through a join table.
/// They share one row shape and differ only in the tables they live in, so a
/// single [`Label`] type is parameterised by [`LabelKind`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL CHECK (length(btrim(name)) > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// -- components: identical
///
/// CREATE TABLE service_tags (
///     service_id BIGINT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
///     tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (service_id, tag_id)
/// );
/// -- service_components(service_id, component_id): identical
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::fmt;
use uuid::Uuid;

/// Which label table a query targets
///
/// Table and column names are `'static` and never come from input, so they are
/// safe to splice into SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Tag,
    Component,
}

impl LabelKind {
    pub const ALL: [LabelKind; 2] = [LabelKind::Tag, LabelKind::Component];

    /// Label table
    pub fn table(self) -> &'static str {
        match self {
            LabelKind::Tag => "tags",
            LabelKind::Component => "components",
        }
    }

    /// Join table linking services to this label kind
    pub fn link_table(self) -> &'static str {
        match self {
            LabelKind::Tag => "service_tags",
            LabelKind::Component => "service_components",
        }
    }

    /// Label id column in the join table
    pub fn link_column(self) -> &'static str {
        match self {
            LabelKind::Tag => "tag_id",
            LabelKind::Component => "component_id",
        }
    }

    /// Name of the request field / query parameter carrying ids of this kind
    pub fn field(self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Tag => f.write_str("tag"),
            LabelKind::Component => f.write_str("component"),
        }
    }
}

/// Tag or component row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    pub id: i64,

    /// Owner
    pub user_id: Uuid,

    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Label {
    /// Inserts a label owned by `owner`
    ///
    /// The name is stored as given; callers trim and validate it first.
    pub async fn create(
        pool: &PgPool,
        kind: LabelKind,
        owner: Uuid,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Label>(&format!(
            "INSERT INTO {} (user_id, name) VALUES ($1, $2) \
             RETURNING id, user_id, name, created_at",
            kind.table()
        ))
        .bind(owner)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Labels of `kind` linked to one service, by id
    ///
    /// Links are not owner-restricted, so neither is this lookup.
    pub async fn linked_to_service(
        conn: &mut PgConnection,
        kind: LabelKind,
        service_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(&format!(
            "SELECT l.id, l.user_id, l.name, l.created_at \
             FROM {table} l \
             JOIN {link} j ON j.{column} = l.id \
             WHERE j.service_id = $1 \
             ORDER BY l.id",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column(),
        ))
        .bind(service_id)
        .fetch_all(conn)
        .await
    }

    /// Returns the subset of `ids` that exist, optionally restricted to one owner
    pub async fn existing_ids(
        conn: &mut PgConnection,
        kind: LabelKind,
        ids: &[i64],
        owner: Option<Uuid>,
    ) -> Result<Vec<i64>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT id FROM {} WHERE id = ANY($1) AND ($2::UUID IS NULL OR user_id = $2)",
            kind.table()
        ))
        .bind(ids)
        .bind(owner)
        .fetch_all(conn)
        .await
    }

    /// Deletes a label if `owner` owns it; links to it cascade away
    pub async fn delete_for_owner(
        pool: &PgPool,
        kind: LabelKind,
        id: i64,
        owner: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2",
            kind.table()
        ))
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
