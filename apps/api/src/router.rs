use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, availability_routes};
use appointment_cell::BookingState;
use doctor_cell::router::doctor_routes;
use doctor_cell::DoctorDirectory;

pub fn create_router(state: Arc<BookingState>, directory: Arc<DoctorDirectory>) -> Router {
    Router::new()
        .route("/", get(|| async { "MediBridge API is running!" }))
        .nest(
            "/doctors",
            doctor_routes(directory).merge(availability_routes(state.clone())),
        )
        .nest("/appointments", appointment_routes(state))
}
