// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::directory::DoctorDirectory;

pub fn doctor_routes(directory: Arc<DoctorDirectory>) -> Router {
    Router::new()
        .route("/", post(handlers::register_doctor).get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(directory)
}
