//! Image upload route.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use stall_market_core::{ImageEntity, ImageType, ItemId, StallId, UserId};

use super::FormData;
use crate::db::images::ImageTarget;
use crate::db::{ImageRepository, ProductRepository, StallRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireVendor;
use crate::state::AppState;

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Resolve the form's `entity_type` and `entity_id` into an image target.
fn parse_target(entity_type: &str, entity_id: &str) -> Result<ImageTarget> {
    let entity = entity_type
        .parse::<ImageEntity>()
        .map_err(|_| bad_request("entity_type must be item or stall"))?;
    let id = entity_id
        .parse::<i32>()
        .map_err(|_| bad_request("entity_id must be an integer"))?;

    match entity {
        ImageEntity::Item => Ok(ImageTarget::Item(ItemId::new(id))),
        ImageEntity::Stall => Ok(ImageTarget::Stall(StallId::new(id))),
        ImageEntity::User => Err(bad_request("entity_type must be item or stall")),
    }
}

/// Items take thumbnails, stalls take banners and icons; both take gallery images.
fn check_image_type(target: ImageTarget, image_type: ImageType) -> Result<()> {
    let allowed = match target {
        ImageTarget::Item(_) => matches!(image_type, ImageType::Thumbnail | ImageType::Gallery),
        ImageTarget::Stall(_) => !matches!(image_type, ImageType::Thumbnail),
        ImageTarget::User(_) => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(bad_request("image_type is not valid for this entity_type"))
    }
}

/// Owner of the stall behind `target`.
async fn target_owner(state: &AppState, target: ImageTarget) -> Result<UserId> {
    let owner = match target {
        ImageTarget::Item(id) => ProductRepository::new(state.pool())
            .get_owner(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?,
        ImageTarget::Stall(id) => StallRepository::new(state.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stall not found".to_string()))?
            .owner_id,
        ImageTarget::User(id) => id,
    };
    Ok(owner)
}

/// Store an uploaded image and attach it to an item or stall the caller owns.
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    RequireVendor(claims): RequireVendor,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;

    let (Some(entity_type), Some(entity_id), Some(image_type), Some(file)) = (
        form.take_text("entity_type"),
        form.take_text("entity_id"),
        form.take_text("image_type"),
        form.take_file("image"),
    ) else {
        return Err(bad_request(
            "entity_type, entity_id, image_type, and image are required.",
        ));
    };

    let target = parse_target(&entity_type, &entity_id)?;
    let image_type = image_type
        .parse::<ImageType>()
        .map_err(AppError::BadRequest)?;
    check_image_type(target, image_type)?;

    if target_owner(&state, target).await? != claims.id {
        return Err(AppError::Forbidden("You do not own this stall".to_string()));
    }

    let url = state
        .uploads()
        .save(file.file_name.as_deref(), &file.bytes)
        .await?;
    let image = ImageRepository::new(state.pool())
        .attach(target, image_type, &url)
        .await?;

    tracing::info!(image_id = %image.image_id, url = %image.image_url, "Image attached");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Image uploaded successfully",
            "image_id": image.image_id,
            "image_url": image.image_url,
        })),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("item", "7").unwrap(),
            ImageTarget::Item(ItemId::new(7))
        );
        assert_eq!(
            parse_target("stall", "3").unwrap(),
            ImageTarget::Stall(StallId::new(3))
        );
        assert!(parse_target("user", "3").is_err());
        assert!(parse_target("stall", "three").is_err());
        assert!(parse_target("shop", "3").is_err());
    }

    #[test]
    fn test_image_type_per_entity() {
        let item = ImageTarget::Item(ItemId::new(1));
        let stall = ImageTarget::Stall(StallId::new(1));

        assert!(check_image_type(item, ImageType::Thumbnail).is_ok());
        assert!(check_image_type(item, ImageType::Gallery).is_ok());
        assert!(check_image_type(item, ImageType::Banner).is_err());

        assert!(check_image_type(stall, ImageType::Banner).is_ok());
        assert!(check_image_type(stall, ImageType::Icon).is_ok());
        assert!(check_image_type(stall, ImageType::Thumbnail).is_err());
    }
}
