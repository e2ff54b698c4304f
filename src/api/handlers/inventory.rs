//! Inventory item CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::extract::{parse_body, Json, PathId};
use crate::api::router::AppState;
use crate::domain::errors::AppError;
use crate::validation::{relaxed, resources, validate};

const COLUMNS: &str =
    "id, name, category, quantity, unit_cost, reorder_level, location, created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub unit_cost: Option<f64>,
    pub reorder_level: Option<i32>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemInput {
    name: Option<String>,
    category: Option<String>,
    quantity: Option<i32>,
    unit_cost: Option<f64>,
    reorder_level: Option<i32>,
    location: Option<String>,
}

/// GET /inventory
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<InventoryItem> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM inventory_items ORDER BY name"))
            .fetch_all(&state.pool)
            .await?;
    Ok(axum::Json(rows))
}

/// GET /inventory/{id}
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<InventoryItem> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM inventory_items WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Inventory item not found"))
}

/// POST /inventory
pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::INVENTORY_ITEM, &mut body)?;
    let input: ItemInput = parse_body(body)?;

    let row: InventoryItem = sqlx::query_as(&format!(
        r#"
        INSERT INTO inventory_items
            (id, name, category, quantity, unit_cost, reorder_level, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.category)
    .bind(input.quantity)
    .bind(input.unit_cost)
    .bind(input.reorder_level)
    .bind(&input.location)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /inventory/{id}
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::INVENTORY_ITEM), &mut body)?;
    let input: ItemInput = parse_body(body)?;

    let row: Option<InventoryItem> = sqlx::query_as(&format!(
        r#"
        UPDATE inventory_items SET
            name = COALESCE($2, name),
            category = COALESCE($3, category),
            quantity = COALESCE($4, quantity),
            unit_cost = COALESCE($5, unit_cost),
            reorder_level = COALESCE($6, reorder_level),
            location = COALESCE($7, location),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.category)
    .bind(input.quantity)
    .bind(input.unit_cost)
    .bind(input.reorder_level)
    .bind(&input.location)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Inventory item not found"))
}

/// DELETE /inventory/{id}
pub async fn remove(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Inventory item not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_whole_float_quantity_maps_into_the_dto() {
        let mut body = serde_json::json!({
            "name": "Bronze marker",
            "category": "marker",
            "quantity": 10.0,
        });
        validate(resources::INVENTORY_ITEM, &mut body).unwrap();
        let input: ItemInput = parse_body(body).unwrap();
        assert_eq!(input.quantity, Some(10));
    }
}
