//! Raw table listing routes.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::db::{ListedTable, TableRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Names of every listable table.
pub async fn index() -> impl IntoResponse {
    let names: Vec<&'static str> = ListedTable::ALL.iter().map(|t| t.name()).collect();
    Json(names)
}

/// All rows of one table as a JSON array.
pub async fn show(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let table = ListedTable::from_name(&name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown table: {name}")))?;

    let rows = TableRepository::new(state.pool())
        .fetch_all(table)
        .await
        .map_err(|source| AppError::Fetch {
            table: table.name(),
            source,
        })?;

    Ok(Json(rows))
}
