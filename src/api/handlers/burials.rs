//! Burial record CRUD.

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

const COLUMNS: &str = r#"id, deceased_name, "type", plot, burial_date, customer_id,
    funeral_home, notes, created_at, updated_at"#;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Burial {
    pub id: Uuid,
    pub deceased_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub burial_type: String,
    pub plot: String,
    pub burial_date: NaiveDate,
    pub customer_id: Option<Uuid>,
    pub funeral_home: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BurialInput {
    deceased_name: Option<String>,
    #[serde(rename = "type")]
    burial_type: Option<String>,
    plot: Option<String>,
    burial_date: Option<NaiveDate>,
    customer_id: Option<Uuid>,
    funeral_home: Option<String>,
    notes: Option<String>,
}

/// GET /burials
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Burial> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM burials ORDER BY burial_date DESC"
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(axum::Json(rows))
}

/// GET /burials/{id}
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<Burial> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM burials WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Burial record not found"))
}

/// POST /burials
pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::BURIAL, &mut body)?;
    let input: BurialInput = parse_body(body)?;

    let row: Burial = sqlx::query_as(&format!(
        r#"
        INSERT INTO burials
            (id, deceased_name, "type", plot, burial_date, customer_id, funeral_home, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.deceased_name)
    .bind(&input.burial_type)
    .bind(&input.plot)
    .bind(input.burial_date)
    .bind(input.customer_id)
    .bind(&input.funeral_home)
    .bind(&input.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /burials/{id}
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::BURIAL), &mut body)?;
    let input: BurialInput = parse_body(body)?;

    let row: Option<Burial> = sqlx::query_as(&format!(
        r#"
        UPDATE burials SET
            deceased_name = COALESCE($2, deceased_name),
            "type" = COALESCE($3, "type"),
            plot = COALESCE($4, plot),
            burial_date = COALESCE($5, burial_date),
            customer_id = COALESCE($6, customer_id),
            funeral_home = COALESCE($7, funeral_home),
            notes = COALESCE($8, notes),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.deceased_name)
    .bind(&input.burial_type)
    .bind(&input.plot)
    .bind(input.burial_date)
    .bind(input.customer_id)
    .bind(&input.funeral_home)
    .bind(&input.notes)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Burial record not found"))
}

/// DELETE /burials/{id}
pub async fn remove(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM burials WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Burial record not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
