// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::booking::AppointmentBookingService;
use crate::state::BookingState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

/// Ordered "HH:MM" strings for every slot still open on the given date.
#[axum::debug_handler]
pub async fn get_doctor_slots(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let times = availability_service
        .available_times(doctor_id, query.date, Utc::now())
        .await
        .map_err(map_appointment_error)?;

    let slots = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
    Ok(Json(slots))
}

// ==============================================================================
// APPOINTMENT BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .book_appointment(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .get(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<BookingState>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let query = AppointmentSearchQuery {
        doctor_id: params.doctor_id,
        patient_id: params.patient_id,
        status: params.status,
        from_date: params.from_date,
        to_date: params.to_date,
    };

    let appointments = state.store.search(&query).await;
    Ok(Json(json!(appointments)))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    transition(&state, appointment_id, AppointmentStatus::Confirmed).await
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    transition(&state, appointment_id, AppointmentStatus::Completed).await
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    transition(&state, appointment_id, AppointmentStatus::Cancelled).await
}

async fn transition(
    state: &BookingState,
    appointment_id: Uuid,
    new_status: AppointmentStatus,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .transition(appointment_id, new_status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::SlotNotAvailable => {
            AppError::Conflict("Appointment slot no longer available".to_string())
        }
        AppointmentError::InvalidTime(msg) => AppError::BadRequest(msg),
        AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
        AppointmentError::InvalidStatusTransition { from, to } => {
            AppError::BadRequest(format!("Appointment cannot move from {} to {}", from, to))
        }
    }
}
