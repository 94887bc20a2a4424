/// Service create, update and delete
///
/// Payloads arrive as a [`ServiceDraft`] and are turned into either a
/// [`NewService`] or a set of [`ServiceChanges`] before touching the database.
/// All field errors are collected up front, so nothing is written for an
/// invalid payload.
///
/// Link intent is explicit: a [`LinkUpdate`] is either `NoChange` or
/// `ReplaceAll(ids)`. Which one an absent field means depends on the
/// [`UpdateMode`]:
///
/// | field     | Partial (PATCH)  | Full (PUT)          |
/// |-----------|------------------|---------------------|
/// | absent    | `NoChange`       | `ReplaceAll([])`    |
/// | `[1, 2]`  | `ReplaceAll`     | `ReplaceAll`        |
///
/// Writes for one call (row plus both link tables) share a transaction.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    query::{load_detail, ServiceDetail},
    CatalogError, CatalogResult, FieldError, LinkOwnership,
};
use crate::models::{
    label::{Label, LabelKind},
    service::{Service, ServiceFields},
};
use crate::storage::ImageStore;

/// Longest title and link accepted (column width)
pub const MAX_TEXT_LEN: usize = 255;

/// Digits NUMERIC(10, 2) holds before the decimal point
const MAX_PRICE_INTEGER_DIGITS: i64 = 8;

/// Decimal places NUMERIC(10, 2) holds
const MAX_PRICE_SCALE: i64 = 2;

/// Longest price text worth parsing; anything longer cannot fit the column
const MAX_PRICE_CHARS: usize = 32;

const TOO_MANY_DIGITS: &str = "Ensure that there are no more than 10 digits in total.";

const REQUIRED: &str = "This field is required.";

/// How absent fields in an update payload are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Only supplied fields change
    Partial,

    /// Every mutable field is replaced; absent link lists mean "no links"
    Full,
}

/// What to do with one link set of a service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkUpdate {
    #[default]
    NoChange,

    /// Replace the whole set; duplicates already removed
    ReplaceAll(Vec<i64>),
}

impl LinkUpdate {
    pub fn from_field(field: Option<Vec<i64>>, mode: UpdateMode) -> Self {
        match (field, mode) {
            (Some(ids), _) => LinkUpdate::ReplaceAll(dedup_ids(ids)),
            (None, UpdateMode::Partial) => LinkUpdate::NoChange,
            (None, UpdateMode::Full) => LinkUpdate::ReplaceAll(Vec::new()),
        }
    }

    fn ids(&self) -> &[i64] {
        match self {
            LinkUpdate::NoChange => &[],
            LinkUpdate::ReplaceAll(ids) => ids,
        }
    }
}

/// Price as sent by clients: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

/// Parses a price into a non-negative decimal with two places
///
/// Exponent notation is accepted, so the scale and digit count are checked on
/// the parsed parts before any arithmetic that would expand the exponent.
pub fn parse_price(input: &PriceInput) -> Result<BigDecimal, String> {
    let raw = match input {
        PriceInput::Number(n) => n.to_string(),
        PriceInput::Text(s) => s.trim().to_string(),
    };

    if raw.len() > MAX_PRICE_CHARS {
        return Err(TOO_MANY_DIGITS.to_string());
    }

    let value = BigDecimal::from_str(&raw).map_err(|_| "A valid number is required.".to_string())?;

    let (_, scale) = value.as_bigint_and_exponent();
    if scale > MAX_PRICE_SCALE {
        return Err("Ensure that there are no more than 2 decimal places.".to_string());
    }
    if value.digits() as i64 - scale > MAX_PRICE_INTEGER_DIGITS {
        return Err(TOO_MANY_DIGITS.to_string());
    }

    if value < BigDecimal::from(0i64) {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    Ok(value.with_scale(MAX_PRICE_SCALE))
}

/// Service payload before validation
///
/// Every field is optional here; [`ServiceDraft::into_new`] and
/// [`ServiceDraft::into_changes`] decide which are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub title: Option<String>,
    pub price: Option<PriceInput>,

    /// Empty string clears the link
    pub link: Option<String>,

    pub tags: Option<Vec<i64>>,
    pub components: Option<Vec<i64>>,
}

/// Validated input for [`create_service`]
#[derive(Debug, Clone, PartialEq)]
pub struct NewService {
    pub fields: ServiceFields,
    pub tags: Vec<i64>,
    pub components: Vec<i64>,
}

/// Validated input for [`update_service`]; `None` keeps the stored value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceChanges {
    pub title: Option<String>,
    pub price: Option<BigDecimal>,
    pub link: Option<Option<String>>,
    pub tags: LinkUpdate,
    pub components: LinkUpdate,
}

impl ServiceDraft {
    /// Validates a create payload: `title` and `price` required
    pub fn into_new(self) -> CatalogResult<NewService> {
        let mut errors = Vec::new();

        let title = required(&mut errors, "title", self.title.map(|t| check_title(&t)));
        let price = required(&mut errors, "price", self.price.as_ref().map(parse_price));
        let link = optional_link(&mut errors, self.link);

        match (title, price, errors.is_empty()) {
            (Some(title), Some(price), true) => Ok(NewService {
                fields: ServiceFields {
                    title,
                    price,
                    link: link.flatten(),
                },
                tags: dedup_ids(self.tags.unwrap_or_default()),
                components: dedup_ids(self.components.unwrap_or_default()),
            }),
            _ => Err(CatalogError::Validation(errors)),
        }
    }

    /// Validates an update payload read under `mode`
    pub fn into_changes(self, mode: UpdateMode) -> CatalogResult<ServiceChanges> {
        let mut errors = Vec::new();

        let title = self.title.map(|t| check_title(&t));
        let price = self.price.as_ref().map(parse_price);

        let (title, price) = match mode {
            UpdateMode::Full => (
                required(&mut errors, "title", title),
                required(&mut errors, "price", price),
            ),
            UpdateMode::Partial => (
                supplied(&mut errors, "title", title),
                supplied(&mut errors, "price", price),
            ),
        };

        let link = optional_link(&mut errors, self.link);
        let link = match mode {
            UpdateMode::Full => Some(link.flatten()),
            UpdateMode::Partial => link,
        };

        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        Ok(ServiceChanges {
            title,
            price,
            link,
            tags: LinkUpdate::from_field(self.tags, mode),
            components: LinkUpdate::from_field(self.components, mode),
        })
    }
}

impl ServiceChanges {
    /// Column values after applying these changes to `current`
    pub fn apply_to(&self, current: &Service) -> ServiceFields {
        ServiceFields {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            price: self.price.clone().unwrap_or_else(|| current.price.clone()),
            link: match &self.link {
                Some(link) => link.clone(),
                None => current.link.clone(),
            },
        }
    }

    fn links(&self, kind: LabelKind) -> &LinkUpdate {
        match kind {
            LabelKind::Tag => &self.tags,
            LabelKind::Component => &self.components,
        }
    }
}

/// Creates a service owned by `owner` with its links
pub async fn create_service(
    pool: &PgPool,
    owner: Uuid,
    new: NewService,
    ownership: LinkOwnership,
) -> CatalogResult<ServiceDetail> {
    let mut tx = pool.begin().await?;

    check_links(
        &mut *tx,
        owner,
        [(LabelKind::Tag, new.tags.as_slice()), (LabelKind::Component, new.components.as_slice())],
        ownership,
    )
    .await?;

    let service = Service::insert(&mut *tx, owner, &new.fields).await?;
    Service::replace_links(&mut *tx, LabelKind::Tag, service.id, &new.tags).await?;
    Service::replace_links(&mut *tx, LabelKind::Component, service.id, &new.components).await?;

    let detail = load_detail(&mut *tx, service).await?;
    tx.commit().await?;

    info!(
        %owner,
        service_id = detail.service.id,
        tags = detail.tags.len(),
        components = detail.components.len(),
        "Service created"
    );
    Ok(detail)
}

/// Applies `changes` to one of the caller's services
///
/// The row stays locked from the ownership check until commit.
pub async fn update_service(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
    changes: ServiceChanges,
    ownership: LinkOwnership,
) -> CatalogResult<ServiceDetail> {
    let mut tx = pool.begin().await?;

    let current = Service::lock_for_owner(&mut *tx, id, owner)
        .await?
        .ok_or(CatalogError::NotFound("Service"))?;

    check_links(
        &mut *tx,
        owner,
        [
            (LabelKind::Tag, changes.tags.ids()),
            (LabelKind::Component, changes.components.ids()),
        ],
        ownership,
    )
    .await?;

    let service = Service::update_fields(&mut *tx, id, &changes.apply_to(&current)).await?;

    for kind in LabelKind::ALL {
        if let LinkUpdate::ReplaceAll(ids) = changes.links(kind) {
            Service::replace_links(&mut *tx, kind, id, ids).await?;
        }
    }

    let detail = load_detail(&mut *tx, service).await?;
    tx.commit().await?;

    info!(%owner, service_id = id, "Service updated");
    Ok(detail)
}

/// Deletes one of the caller's services and its stored image
///
/// Links go with the row. A failure to remove the image file is logged and
/// does not fail the delete.
pub async fn delete_service(
    pool: &PgPool,
    images: &dyn ImageStore,
    owner: Uuid,
    id: i64,
) -> CatalogResult<()> {
    let service = Service::delete_for_owner(pool, id, owner)
        .await?
        .ok_or(CatalogError::NotFound("Service"))?;

    if let Some(key) = service.image.as_deref() {
        if let Err(e) = images.delete(key).await {
            warn!(service_id = id, key, error = %e, "Failed to remove image of deleted service");
        }
    }

    info!(%owner, service_id = id, "Service deleted");
    Ok(())
}

/// Fails with one field error per link kind that names ids which cannot be linked
async fn check_links(
    conn: &mut PgConnection,
    owner: Uuid,
    requested: [(LabelKind, &[i64]); 2],
    ownership: LinkOwnership,
) -> CatalogResult<()> {
    let scope = match ownership {
        LinkOwnership::AnyOwner => None,
        LinkOwnership::CallerOnly => Some(owner),
    };

    let mut errors = Vec::new();
    for (kind, ids) in requested {
        if ids.is_empty() {
            continue;
        }

        let found = Label::existing_ids(&mut *conn, kind, ids, scope).await?;
        let missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();

        if !missing.is_empty() {
            errors.push(FieldError::new(
                kind.field(),
                format!("Invalid pk(s) {:?} - object does not exist.", missing),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(errors))
    }
}

fn check_title(raw: &str) -> Result<String, String> {
    let title = raw.trim();
    if title.is_empty() {
        Err("This field may not be blank.".to_string())
    } else if title.chars().count() > MAX_TEXT_LEN {
        Err(format!("Ensure this field has no more than {} characters.", MAX_TEXT_LEN))
    } else {
        Ok(title.to_string())
    }
}

/// `Some(None)` means "no link"
fn optional_link(errors: &mut Vec<FieldError>, raw: Option<String>) -> Option<Option<String>> {
    let raw = raw?;
    let link = raw.trim();

    if link.is_empty() {
        Some(None)
    } else if link.chars().count() > MAX_TEXT_LEN {
        errors.push(FieldError::new(
            "link",
            format!("Ensure this field has no more than {} characters.", MAX_TEXT_LEN),
        ));
        None
    } else {
        Some(Some(link.to_string()))
    }
}

fn required<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<Result<T, String>>,
) -> Option<T> {
    match value {
        None => {
            errors.push(FieldError::new(field, REQUIRED));
            None
        }
        Some(value) => supplied(errors, field, Some(value)),
    }
}

fn supplied<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<Result<T, String>>,
) -> Option<T> {
    match value? {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn dedup_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
