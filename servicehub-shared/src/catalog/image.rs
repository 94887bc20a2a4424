/// Service image attachment
///
/// An upload is checked in three steps before anything is stored: the caller
/// owns the service, the payload is non-empty and under the size limit, and it
/// decodes as one of the supported raster formats. Only then is the file
/// written under a fresh key and the service row pointed at it.
///
/// Failure after the file is written (row gone, database error) removes the new
/// file again. After a successful swap the previous file is removed; a failure
/// there is logged only, since the row no longer references it.

use image::ImageFormat;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CatalogError, CatalogResult, FieldError};
use crate::models::service::Service;
use crate::storage::ImageStore;

/// Multipart field and error field name
pub const IMAGE_FIELD: &str = "image";

/// Prefix of every stored service image key
pub const IMAGE_KEY_PREFIX: &str = "uploads/service";

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// File extension stored for a detected format, `None` if the format is not accepted
pub fn extension_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Bmp => Some("bmp"),
        _ => None,
    }
}

/// Detects the format of `bytes` and checks the whole image decodes
///
/// CPU-bound; async callers run it on the blocking pool.
pub fn sniff_image(bytes: &[u8]) -> Result<ImageFormat, FieldError> {
    let invalid = || FieldError::new(IMAGE_FIELD, INVALID_IMAGE);

    if bytes.is_empty() {
        return Err(FieldError::new(IMAGE_FIELD, "The submitted file is empty."));
    }

    let format = image::guess_format(bytes).map_err(|_| invalid())?;
    if extension_for(format).is_none() {
        return Err(invalid());
    }

    image::load_from_memory_with_format(bytes, format).map_err(|_| invalid())?;
    Ok(format)
}

/// Fresh storage key for an image with extension `ext`
pub fn new_image_key(ext: &str) -> String {
    format!("{}/{}.{}", IMAGE_KEY_PREFIX, Uuid::new_v4(), ext)
}

/// Validates `bytes` as an image and attaches it to one of the caller's services
///
/// Returns the updated service row.
pub async fn attach_image(
    pool: &PgPool,
    images: &dyn ImageStore,
    owner: Uuid,
    service_id: i64,
    bytes: Vec<u8>,
    max_bytes: usize,
) -> CatalogResult<Service> {
    Service::find_for_owner(pool, service_id, owner)
        .await?
        .ok_or(CatalogError::NotFound("Service"))?;

    if bytes.len() > max_bytes {
        return Err(CatalogError::invalid(
            IMAGE_FIELD,
            format!("Ensure the file is no larger than {} bytes.", max_bytes),
        ));
    }

    let (format, bytes) = tokio::task::spawn_blocking(move || {
        sniff_image(&bytes).map(|format| (format, bytes))
    })
    .await?
    .map_err(|e| CatalogError::Validation(vec![e]))?;

    let ext = extension_for(format).ok_or_else(|| CatalogError::invalid(IMAGE_FIELD, INVALID_IMAGE))?;
    let key = new_image_key(ext);
    images.put(&key, &bytes).await?;

    debug!(service_id, key = %key, ?format, size = bytes.len(), "Stored service image");

    let (previous, service) = match point_at(pool, owner, service_id, &key).await {
        Ok(swapped) => swapped,
        Err(e) => {
            if let Err(cleanup) = images.delete(&key).await {
                warn!(key = %key, error = %cleanup, "Failed to remove unreferenced image");
            }
            return Err(e);
        }
    };

    if let Some(previous) = previous.filter(|p| *p != key) {
        if let Err(e) = images.delete(&previous).await {
            warn!(service_id, key = %previous, error = %e, "Failed to remove replaced image");
        }
    }

    info!(%owner, service_id, key = %key, "Service image attached");
    Ok(service)
}

/// Swaps the image key under a row lock; returns the previous key and the new row
async fn point_at(
    pool: &PgPool,
    owner: Uuid,
    service_id: i64,
    key: &str,
) -> CatalogResult<(Option<String>, Service)> {
    let mut tx = pool.begin().await?;

    let current = Service::lock_for_owner(&mut *tx, service_id, owner)
        .await?
        .ok_or(CatalogError::NotFound("Service"))?;
    let service = Service::set_image(&mut *tx, service_id, key).await?;

    tx.commit().await?;
    Ok((current.image, service))
}
