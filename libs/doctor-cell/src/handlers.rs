// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{CreateDoctorRequest, DoctorError};
use crate::services::directory::DoctorDirectory;

#[axum::debug_handler]
pub async fn register_doctor(
    State(directory): State<Arc<DoctorDirectory>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = directory.register(request).await.map_err(|e| match e {
        DoctorError::InvalidSchedule(msg) => AppError::BadRequest(msg),
        _ => AppError::Internal(e.to_string()),
    })?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(directory): State<Arc<DoctorDirectory>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = directory.get(doctor_id).await.map_err(|e| match e {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        _ => AppError::Internal(e.to_string()),
    })?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(directory): State<Arc<DoctorDirectory>>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory.list().await;
    Ok(Json(json!(doctors)))
}
