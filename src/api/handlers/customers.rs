//! Customer CRUD.

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

const COLUMNS: &str = "id, name, email, phone, address, notes, created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerInput {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    notes: Option<String>,
}

/// GET /customers
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Customer> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM customers ORDER BY name"))
            .fetch_all(&state.pool)
            .await?;
    Ok(axum::Json(rows))
}

/// GET /customers/{id}
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<Customer> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM customers WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Customer not found"))
}

/// POST /customers
pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::CUSTOMER, &mut body)?;
    let input: CustomerInput = parse_body(body)?;

    let row: Customer = sqlx::query_as(&format!(
        r#"
        INSERT INTO customers (id, name, email, phone, address, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(&input.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /customers/{id}
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::CUSTOMER), &mut body)?;
    let input: CustomerInput = parse_body(body)?;

    let row: Option<Customer> = sqlx::query_as(&format!(
        r#"
        UPDATE customers SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            address = COALESCE($5, address),
            notes = COALESCE($6, notes),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(&input.notes)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Customer not found"))
}

/// DELETE /customers/{id}
pub async fn remove(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
