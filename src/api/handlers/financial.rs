//! Financial ledgers: bank deposits, accounts receivable, accounts payable.
//! All three live under the /financial prefix.

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

const DEPOSIT_COLUMNS: &str = "id, deposit_date, amount, reference, notes, created_at, updated_at";
const RECEIVABLE_COLUMNS: &str =
    "id, invoice_number, customer_id, amount, due_date, status, created_at, updated_at";
const PAYABLE_COLUMNS: &str =
    "id, vendor, invoice_number, amount, due_date, status, created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: Uuid,
    pub deposit_date: NaiveDate,
    pub amount: f64,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Option<Uuid>,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payable {
    pub id: Uuid,
    pub vendor: String,
    pub invoice_number: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepositInput {
    deposit_date: Option<NaiveDate>,
    amount: Option<f64>,
    reference: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceivableInput {
    invoice_number: Option<String>,
    customer_id: Option<Uuid>,
    amount: Option<f64>,
    due_date: Option<NaiveDate>,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayableInput {
    vendor: Option<String>,
    invoice_number: Option<String>,
    amount: Option<f64>,
    due_date: Option<NaiveDate>,
    status: Option<String>,
}

// Deposits

/// GET /financial/deposits
pub async fn list_deposits(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Deposit> = sqlx::query_as(&format!(
        "SELECT {DEPOSIT_COLUMNS} FROM deposits ORDER BY deposit_date DESC"
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(axum::Json(rows))
}

/// POST /financial/deposits
pub async fn create_deposit(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::DEPOSIT, &mut body)?;
    let input: DepositInput = parse_body(body)?;

    let row: Deposit = sqlx::query_as(&format!(
        r#"
        INSERT INTO deposits (id, deposit_date, amount, reference, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {DEPOSIT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(input.deposit_date)
    .bind(input.amount)
    .bind(&input.reference)
    .bind(&input.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /financial/deposits/{id}
pub async fn update_deposit(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::DEPOSIT), &mut body)?;
    let input: DepositInput = parse_body(body)?;

    let row: Option<Deposit> = sqlx::query_as(&format!(
        r#"
        UPDATE deposits SET
            deposit_date = COALESCE($2, deposit_date),
            amount = COALESCE($3, amount),
            reference = COALESCE($4, reference),
            notes = COALESCE($5, notes),
            updated_at = now()
        WHERE id = $1
        RETURNING {DEPOSIT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(input.deposit_date)
    .bind(input.amount)
    .bind(&input.reference)
    .bind(&input.notes)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Deposit not found"))
}

/// DELETE /financial/deposits/{id}
pub async fn remove_deposit(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM deposits WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Deposit not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Receivables

/// GET /financial/receivables
pub async fn list_receivables(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Receivable> = sqlx::query_as(&format!(
        "SELECT {RECEIVABLE_COLUMNS} FROM receivables ORDER BY due_date"
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(axum::Json(rows))
}

/// POST /financial/receivables
pub async fn create_receivable(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::RECEIVABLE, &mut body)?;
    let input: ReceivableInput = parse_body(body)?;

    let row: Receivable = sqlx::query_as(&format!(
        r#"
        INSERT INTO receivables (id, invoice_number, customer_id, amount, due_date, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RECEIVABLE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.invoice_number)
    .bind(input.customer_id)
    .bind(input.amount)
    .bind(input.due_date)
    .bind(input.status.as_deref().unwrap_or("open"))
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /financial/receivables/{id}
pub async fn update_receivable(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::RECEIVABLE), &mut body)?;
    let input: ReceivableInput = parse_body(body)?;

    let row: Option<Receivable> = sqlx::query_as(&format!(
        r#"
        UPDATE receivables SET
            invoice_number = COALESCE($2, invoice_number),
            customer_id = COALESCE($3, customer_id),
            amount = COALESCE($4, amount),
            due_date = COALESCE($5, due_date),
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1
        RETURNING {RECEIVABLE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.invoice_number)
    .bind(input.customer_id)
    .bind(input.amount)
    .bind(input.due_date)
    .bind(&input.status)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Receivable not found"))
}

/// DELETE /financial/receivables/{id}
pub async fn remove_receivable(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM receivables WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Receivable not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Payables

/// GET /financial/payables
pub async fn list_payables(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Payable> = sqlx::query_as(&format!(
        "SELECT {PAYABLE_COLUMNS} FROM payables ORDER BY due_date"
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(axum::Json(rows))
}

/// POST /financial/payables
pub async fn create_payable(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::PAYABLE, &mut body)?;
    let input: PayableInput = parse_body(body)?;

    let row: Payable = sqlx::query_as(&format!(
        r#"
        INSERT INTO payables (id, vendor, invoice_number, amount, due_date, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PAYABLE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&input.vendor)
    .bind(&input.invoice_number)
    .bind(input.amount)
    .bind(input.due_date)
    .bind(input.status.as_deref().unwrap_or("open"))
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(row)))
}

/// PUT /financial/payables/{id}
pub async fn update_payable(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(&relaxed(resources::PAYABLE), &mut body)?;
    let input: PayableInput = parse_body(body)?;

    let row: Option<Payable> = sqlx::query_as(&format!(
        r#"
        UPDATE payables SET
            vendor = COALESCE($2, vendor),
            invoice_number = COALESCE($3, invoice_number),
            amount = COALESCE($4, amount),
            due_date = COALESCE($5, due_date),
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1
        RETURNING {PAYABLE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.vendor)
    .bind(&input.invoice_number)
    .bind(input.amount)
    .bind(input.due_date)
    .bind(&input.status)
    .fetch_optional(&state.pool)
    .await?;

    row.map(axum::Json)
        .ok_or_else(|| AppError::not_found("Payable not found"))
}

/// DELETE /financial/payables/{id}
pub async fn remove_payable(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM payables WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Payable not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
