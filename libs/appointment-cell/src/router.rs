// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::BookingState;

pub fn appointment_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::book_appointment).get(handlers::search_appointments),
        )
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(state)
}

/// Mounted under /doctors alongside the doctor-cell routes.
pub fn availability_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/{doctor_id}/slots", get(handlers::get_doctor_slots))
        .with_state(state)
}
