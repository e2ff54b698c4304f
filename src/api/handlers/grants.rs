//! Grant tracking CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::extract::{parse_body, Json, PathId};
use crate::api::router::AppState;
use crate::domain::errors::AppError;
use crate::validation::{relaxed, resources, validate};

const COLUMNS: &str = "id, name, grantor, amount, status, applied_date, awarded_date, notes, \
     created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub id: Uuid,
    pub name: String,
    pub grantor: String,
    pub amount: f64,
    pub status: String,
    pub applied_date: Option<NaiveDate>,
    pub awarded_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantInput {
    name: Option<String>,
    grantor: Option<String>,
    amount: Option<f64>,
    status: Option<String>,
    applied_date: Option<NaiveDate>,
    awarded_date: Option<NaiveDate>,
    notes: Option<String>,
}

/// GET /grants
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Grant> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM grants ORDER BY created_at DESC"))
            .fetch_all(&state.pool)
            .await?;
    Ok(axum::Json(rows))
}

/// GET /grants/{id}
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<Grant> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM grants WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Grant not found"))
}

/// POST /grants
pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::GRANT, &mut body)?;
    let input: GrantInput = parse_body(body)?;

    let row: Grant = sqlx::query_as(&format!(
        r#"
        INSERT INTO grants (id, name, grantor, amount, status, applied_date, awarded_date, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.grantor)
    .bind(input.amount)
    .bind(input.status.as_deref().unwrap_or("applied"))
    .bind(input.applied_date)
    .bind(input.awarded_date)
    .bind(&input.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /grants/{id}
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::GRANT), &mut body)?;
    let input: GrantInput = parse_body(body)?;

    let row: Option<Grant> = sqlx::query_as(&format!(
        r#"
        UPDATE grants SET
            name = COALESCE($2, name),
            grantor = COALESCE($3, grantor),
            amount = COALESCE($4, amount),
            status = COALESCE($5, status),
            applied_date = COALESCE($6, applied_date),
            awarded_date = COALESCE($7, awarded_date),
            notes = COALESCE($8, notes),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.grantor)
    .bind(input.amount)
    .bind(&input.status)
    .bind(input.applied_date)
    .bind(input.awarded_date)
    .bind(&input.notes)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Grant not found"))
}

/// DELETE /grants/{id}
pub async fn remove(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM grants WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Grant not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
