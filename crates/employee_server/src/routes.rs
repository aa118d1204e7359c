//! `/api/employees` handlers.
//!
//! Bodies are read as raw bytes and decoded here so that every decoding
//! failure, whatever the content type, surfaces as a JSON `invalid input`
//! error.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use employee_core::{EmpId, EmployeeDetails, EmployeeUpdate, NewEmployee};
use serde::Serialize;

use crate::{error::ApiError, state::AppState};

pub const CREATED_MESSAGE: &str = "Employee created successfully";
pub const UPDATED_MESSAGE: &str = "Employee updated successfully";
pub const DELETED_MESSAGE: &str = "Employee deleted successfully";

#[derive(Debug, Serialize)]
pub struct LastIdResponse {
    pub last_emp_id: EmpId,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub emp_id: EmpId,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub deleted_count: u64,
}

pub async fn list_employees_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmployeeDetails>>, ApiError> {
    let employees = state
        .with_service(|service| service.list_employees())
        .await?;
    Ok(Json(employees))
}

pub async fn last_id_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LastIdResponse>, ApiError> {
    let last_emp_id = state
        .with_service(|service| service.last_employee_id())
        .await?;
    Ok(Json(LastIdResponse { last_emp_id }))
}

pub async fn create_employee_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request: NewEmployee = serde_json::from_slice(&body?)?;
    let emp_id = state
        .with_service(move |service| service.create_employee(&request))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: CREATED_MESSAGE.to_string(),
            emp_id,
        }),
    ))
}

pub async fn update_employee_handler(
    State(state): State<Arc<AppState>>,
    emp_id: Result<Path<EmpId>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let emp_id = path_id(emp_id)?;
    let update: EmployeeUpdate = serde_json::from_slice(&body?)?;
    state
        .with_service(move |service| service.update_employee(emp_id, &update))
        .await?;

    Ok(Json(MessageResponse {
        message: UPDATED_MESSAGE.to_string(),
    }))
}

pub async fn delete_employee_handler(
    State(state): State<Arc<AppState>>,
    emp_id: Result<Path<EmpId>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let emp_id = path_id(emp_id)?;
    let outcome = state
        .with_service(move |service| service.delete_employee(emp_id))
        .await?;

    Ok(Json(DeletedResponse {
        message: DELETED_MESSAGE.to_string(),
        deleted_count: outcome.deleted_count,
    }))
}

/// `PUT`/`DELETE` on `/api/employees/last-id`: the segment is not an id.
pub async fn non_numeric_id_handler() -> ApiError {
    ApiError::InvalidId("`last-id` is not an integer employee id".to_string())
}

/// Known API path, unsupported method.
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed
}

fn path_id(extracted: Result<Path<EmpId>, PathRejection>) -> Result<EmpId, ApiError> {
    extracted
        .map(|Path(emp_id)| emp_id)
        .map_err(|rejection| ApiError::InvalidId(rejection.body_text()))
}
