//! Product (stall item) routes.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use stall_market_core::{ItemId, Price, StallId, UserId};

use super::json_body;
use crate::db::{ProductRepository, RepositoryError, StallRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireVendor;
use crate::models::{NewProduct, ProductChanges};
use crate::state::AppState;

const NOT_OWNER: &str = "You do not own this stall";
const PRODUCT_NOT_FOUND: &str = "Product not found";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub stall_id: Option<StallId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub stall_id: Option<StallId>,
    pub item_name: Option<String>,
    /// Decimal string or JSON number.
    pub price: Option<Value>,
    pub item_description: Option<String>,
    pub item_stocks: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub price: Option<Value>,
    pub item_stocks: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

/// Parse a price sent either as `"12.50"` or `12.5`.
fn parse_price(value: &Value) -> Result<Price> {
    let parsed = match value {
        Value::String(s) => Price::parse(s),
        Value::Number(n) => Price::parse(&n.to_string()),
        _ => return Err(AppError::BadRequest("price must be a decimal number".to_string())),
    };
    parsed.map_err(|e| AppError::BadRequest(e.to_string()))
}

fn check_stocks(stocks: Option<i32>) -> Result<()> {
    if stocks.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest(
            "item_stocks cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Treat empty strings from forms as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn product_id(path: std::result::Result<Path<ItemId>, PathRejection>) -> Result<ItemId> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest("Invalid product ID".to_string()))
}

/// Reject unless `caller` owns the stall the item belongs to.
async fn require_item_owner(state: &AppState, id: ItemId, caller: UserId) -> Result<()> {
    let owner = ProductRepository::new(state.pool())
        .get_owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    if owner != caller {
        return Err(AppError::Forbidden(NOT_OWNER.to_string()));
    }
    Ok(())
}

/// List items with their thumbnails, optionally filtered by `?stall_id=`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool())
        .list(query.stall_id)
        .await?;
    Ok(Json(products))
}

/// Add an item to one of the caller's stalls.
pub async fn create(
    State(state): State<AppState>,
    RequireVendor(claims): RequireVendor,
    payload: std::result::Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let form = json_body(payload)?;

    let (Some(stall_id), Some(item_name), Some(price)) =
        (form.stall_id, non_empty(form.item_name), form.price)
    else {
        return Err(AppError::BadRequest(
            "stall_id, item_name, and price are required.".to_string(),
        ));
    };
    let price = parse_price(&price)?;
    check_stocks(form.item_stocks)?;

    let stall = StallRepository::new(state.pool())
        .get_by_id(stall_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Stall not found".to_string()))?;
    if stall.owner_id != claims.id {
        return Err(AppError::Forbidden(NOT_OWNER.to_string()));
    }

    let product_id = ProductRepository::new(state.pool())
        .create(&NewProduct {
            stall_id,
            item_name,
            item_description: non_empty(form.item_description),
            price,
            item_stocks: form.item_stocks.unwrap_or(0),
            category: non_empty(form.category),
            image_url: non_empty(form.image_url),
        })
        .await?;

    tracing::info!(item_id = %product_id, stall_id = %stall_id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "product_id": product_id,
        })),
    ))
}

/// Partially update one of the caller's items.
pub async fn update(
    State(state): State<AppState>,
    RequireVendor(claims): RequireVendor,
    path: std::result::Result<Path<ItemId>, PathRejection>,
    payload: std::result::Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = product_id(path)?;
    let form = json_body(payload)?;

    let price = form.price.as_ref().map(parse_price).transpose()?;
    check_stocks(form.item_stocks)?;

    require_item_owner(&state, id, claims.id).await?;

    let changes = ProductChanges {
        item_name: non_empty(form.item_name),
        item_description: form.item_description,
        price,
        item_stocks: form.item_stocks,
        category: non_empty(form.category),
        image_url: non_empty(form.image_url),
    };

    ProductRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            other => other.into(),
        })?;

    Ok(Json(json!({
        "message": "Product updated successfully",
        "item_id": id,
    })))
}

/// Delete one of the caller's items and its images.
pub async fn delete(
    State(state): State<AppState>,
    RequireVendor(claims): RequireVendor,
    path: std::result::Result<Path<ItemId>, PathRejection>,
) -> Result<impl IntoResponse> {
    let id = product_id(path)?;

    require_item_owner(&state, id, claims.id).await?;

    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            other => other.into(),
        })?;

    tracing::info!(item_id = %id, "Product deleted");

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_accepts_string_and_number() {
        assert_eq!(
            parse_price(&json!("50")).unwrap(),
            parse_price(&json!(50)).unwrap()
        );
        assert_eq!(parse_price(&json!(19.5)).unwrap().to_string(), "19.50");
    }

    #[test]
    fn test_parse_price_rejections() {
        assert!(parse_price(&json!("-1")).is_err());
        assert!(parse_price(&json!("1.234")).is_err());
        assert!(parse_price(&json!(true)).is_err());
    }

    #[test]
    fn test_negative_stocks_rejected() {
        assert!(check_stocks(Some(-1)).is_err());
        assert!(check_stocks(Some(0)).is_ok());
        assert!(check_stocks(None).is_ok());
    }
}
