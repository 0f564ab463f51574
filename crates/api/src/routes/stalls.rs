//! Stall listing and editing routes.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use stall_market_core::ImageType;

use super::FormData;
use crate::db::images::ImageTarget;
use crate::db::{ImageRepository, StallRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireVendor;
use crate::models::NewStall;
use crate::state::AppState;

/// Every stall as a card, ordered by stall ID.
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cards = StallRepository::new(state.pool()).list_cards().await?;
    Ok(Json(cards))
}

/// Fill in the caller's stall from a multipart form.
///
/// A vendor owns exactly one stall, so this replaces the placeholder created
/// at registration (or creates the stall if it has gone missing). Optional
/// `banner_image` and `icon_image` files replace the current ones.
#[tracing::instrument(skip_all)]
pub async fn upsert(
    State(state): State<AppState>,
    RequireVendor(claims): RequireVendor,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;

    let (Some(stall_name), Some(category), Some(description), Some(address)) = (
        form.take_text("stall_name"),
        form.take_text("category"),
        form.take_text("stall_description"),
        form.take_text("stall_address"),
    ) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let new_stall = NewStall {
        stall_name,
        stall_description: Some(description),
        category: Some(category),
        stall_address: Some(address),
        stall_city: form.take_text("stall_city"),
        stall_state: form.take_text("stall_state"),
        stall_zip_code: form.take_text("stall_zipcode"),
    };

    // Store files first so a rejected upload leaves the stall untouched.
    let mut uploaded = Vec::new();
    for (field, image_type) in [
        ("banner_image", ImageType::Banner),
        ("icon_image", ImageType::Icon),
    ] {
        if let Some(file) = form.take_file(field) {
            let url = state
                .uploads()
                .save(file.file_name.as_deref(), &file.bytes)
                .await?;
            uploaded.push((image_type, url));
        }
    }

    let stall = StallRepository::new(state.pool())
        .upsert(claims.id, &new_stall)
        .await?;

    let images = ImageRepository::new(state.pool());
    for (image_type, url) in uploaded {
        images
            .attach(ImageTarget::Stall(stall.id), image_type, &url)
            .await?;
    }

    tracing::info!(stall_id = %stall.id, "Stall saved");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Stall created successfully",
            "stall_id": stall.id,
        })),
    ))
}
