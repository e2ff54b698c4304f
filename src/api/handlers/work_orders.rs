//! Work-order CRUD. The list endpoint is paginated.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::extract::{parse_body, Json, PathId};
use crate::api::router::AppState;
use crate::domain::errors::AppError;
use crate::validation::{relaxed, resources, validate};

const COLUMNS: &str = r#"id, title, description, "type", priority, status,
    assigned_to, location, due_date, created_at, updated_at"#;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub work_type: String,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub location: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    title: String,
    description: Option<String>,
    #[serde(rename = "type")]
    work_type: String,
    priority: Option<String>,
    status: Option<String>,
    assigned_to: Option<Uuid>,
    location: Option<String>,
    due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    assigned_to: Option<Uuid>,
    location: Option<String>,
    due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    limit: Option<i64>,
}

/// GET /work-orders
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_orders")
        .fetch_one(&state.pool)
        .await?;

    let rows: Vec<WorkOrder> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM work_orders ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(axum::Json(json!({
        "data": rows,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": (total + limit - 1) / limit,
        },
    })))
}

/// GET /work-orders/{id}
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<WorkOrder> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM work_orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Work order not found"))
}

/// POST /work-orders
pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::WORK_ORDER_CREATE, &mut body)?;
    let input: CreateInput = parse_body(body)?;

    let row: WorkOrder = sqlx::query_as(&format!(
        r#"
        INSERT INTO work_orders
            (id, title, description, "type", priority, status, assigned_to, location, due_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.work_type)
    .bind(input.priority.as_deref().unwrap_or("medium"))
    .bind(input.status.as_deref().unwrap_or("pending"))
    .bind(input.assigned_to)
    .bind(&input.location)
    .bind(input.due_date)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /work-orders/{id}
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::WORK_ORDER_CREATE), &mut body)?;
    let input: UpdateInput = parse_body(body)?;

    let row: Option<WorkOrder> = sqlx::query_as(&format!(
        r#"
        UPDATE work_orders SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            "type" = COALESCE($4, "type"),
            priority = COALESCE($5, priority),
            status = COALESCE($6, status),
            assigned_to = COALESCE($7, assigned_to),
            location = COALESCE($8, location),
            due_date = COALESCE($9, due_date),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.work_type)
    .bind(&input.priority)
    .bind(&input.status)
    .bind(input.assigned_to)
    .bind(&input.location)
    .bind(input.due_date)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Work order not found"))
}

/// DELETE /work-orders/{id}
pub async fn remove(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Work order not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
