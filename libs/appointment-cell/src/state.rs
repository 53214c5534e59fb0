// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use doctor_cell::services::directory::DoctorDirectory;
use shared_config::AppConfig;

use crate::store::AppointmentStore;

/// Shared state behind the appointment routes: configuration plus the two
/// long-lived stores the per-request services borrow.
#[derive(Clone)]
pub struct BookingState {
    pub config: AppConfig,
    pub directory: Arc<DoctorDirectory>,
    pub store: Arc<AppointmentStore>,
}

impl BookingState {
    pub fn new(config: AppConfig, directory: Arc<DoctorDirectory>) -> Self {
        Self {
            config,
            directory,
            store: Arc::new(AppointmentStore::new()),
        }
    }
}
