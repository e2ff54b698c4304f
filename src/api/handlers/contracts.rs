//! Contract CRUD. A contract row and its line items are written in one
//! transaction; the read path returns the contract with items attached.

use axum::extract::State;
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

const COLUMNS: &str =
    "id, customer_id, status, total_amount, signed_date, notes, created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub total_amount: f64,
    pub signed_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContractItem {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractInput {
    customer_id: Option<Uuid>,
    status: Option<String>,
    total_amount: Option<f64>,
    signed_date: Option<NaiveDate>,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<ItemInput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemInput {
    description: String,
    quantity: i32,
    unit_price: f64,
}

/// Run the contract rule set plus the per-element item rules, reporting
/// item failures under `items.{index}.{field}` paths.
fn validate_contract(rules: &[crate::validation::FieldRule], body: &mut Value) -> Result<(), AppError> {
    let mut details: Vec<Value> = Vec::new();

    if let Err(err) = validate(rules, body) {
        if let Some(Value::Array(entries)) = err.details {
            details.extend(entries);
        }
    }

    if let Some(items) = body.get_mut("items").and_then(Value::as_array_mut) {
        for (index, item) in items.iter_mut().enumerate() {
            if let Err(err) = validate(resources::CONTRACT_ITEM, item) {
                if let Some(Value::Array(entries)) = err.details {
                    for mut entry in entries {
                        if let Some(field) = entry.get("field").and_then(Value::as_str) {
                            let path = format!("items.{index}.{field}");
                            entry["field"] = json!(path);
                        }
                        details.push(entry);
                    }
                }
            }
        }
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation("Validation failed", Value::Array(details)))
    }
}

async fn load_items(pool: &sqlx::PgPool, contract_id: Uuid) -> Result<Vec<ContractItem>, AppError> {
    let items = sqlx::query_as(
        "SELECT id, contract_id, description, quantity, unit_price \
         FROM contract_items WHERE contract_id = $1 ORDER BY description",
    )
    .bind(contract_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

fn with_items(contract: Contract, items: Vec<ContractItem>) -> Value {
    let mut body = serde_json::to_value(contract).unwrap_or_default();
    body["items"] = json!(items);
    body
}

/// GET /contracts
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Contract> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM contracts ORDER BY created_at DESC"))
            .fetch_all(&state.pool)
            .await?;
    Ok(axum::Json(rows))
}

/// GET /contracts/{id}
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let contract: Option<Contract> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM contracts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let contract = contract.ok_or_else(|| AppError::not_found("Contract not found"))?;
    let items = load_items(&state.pool, id).await?;
    Ok(axum::Json(with_items(contract, items)))
}

/// POST /contracts
pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate_contract(resources::CONTRACT, &mut body)?;
    let input: ContractInput = parse_body(body)?;

    let mut tx = state.pool.begin().await?;

    let contract: Contract = sqlx::query_as(&format!(
        r#"
        INSERT INTO contracts (id, customer_id, status, total_amount, signed_date, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(input.customer_id)
    .bind(input.status.as_deref().unwrap_or("draft"))
    .bind(input.total_amount)
    .bind(input.signed_date)
    .bind(&input.notes)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let row: ContractItem = sqlx::query_as(
            "INSERT INTO contract_items (id, contract_id, description, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, contract_id, description, quantity, unit_price",
        )
        .bind(Uuid::new_v4())
        .bind(contract.id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *tx)
        .await?;
        items.push(row);
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, axum::Json(with_items(contract, items))))
}

/// PUT /contracts/{id}
///
/// When `items` is present the existing lines are replaced wholesale.
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let replace_items = body.get("items").is_some_and(Value::is_array);
    validate_contract(&relaxed(resources::CONTRACT), &mut body)?;
    let input: ContractInput = parse_body(body)?;

    let mut tx = state.pool.begin().await?;

    let contract: Option<Contract> = sqlx::query_as(&format!(
        r#"
        UPDATE contracts SET
            customer_id = COALESCE($2, customer_id),
            status = COALESCE($3, status),
            total_amount = COALESCE($4, total_amount),
            signed_date = COALESCE($5, signed_date),
            notes = COALESCE($6, notes),
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(input.customer_id)
    .bind(&input.status)
    .bind(input.total_amount)
    .bind(input.signed_date)
    .bind(&input.notes)
    .fetch_optional(&mut *tx)
    .await?;

    let contract = contract.ok_or_else(|| AppError::not_found("Contract not found"))?;

    if replace_items {
        sqlx::query("DELETE FROM contract_items WHERE contract_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for item in &input.items {
            sqlx::query(
                "INSERT INTO contract_items (id, contract_id, description, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    let items = load_items(&state.pool, id).await?;
    Ok(axum::Json(with_items(contract, items)))
}

/// DELETE /contracts/{id}
pub async fn remove(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.pool.begin().await?;
    sqlx::query("DELETE FROM contract_items WHERE contract_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Contract not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_failures_carry_indexed_paths() {
        let mut body = json!({
            "customerId": "3f0c9a1e-7a11-4d57-8a0e-2f9f6f6d9f30",
            "totalAmount": 100.0,
            "items": [
                {"description": "Plot fee", "quantity": 1, "unitPrice": 100.0},
                {"quantity": 0, "unitPrice": -1.0},
            ],
        });
        let err = validate_contract(resources::CONTRACT, &mut body).unwrap_err();
        let details = err.details.unwrap();
        let fields: Vec<&str> = details
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec!["items.1.description", "items.1.quantity", "items.1.unitPrice"]
        );
    }

    #[test]
    fn contract_and_item_failures_aggregate() {
        let mut body = json!({
            "items": [{"description": "x", "quantity": 1, "unitPrice": 0.0}],
        });
        let err = validate_contract(resources::CONTRACT, &mut body).unwrap_err();
        let details = err.details.unwrap();
        let fields: Vec<&str> = details
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["customerId", "totalAmount"]);
    }
}
