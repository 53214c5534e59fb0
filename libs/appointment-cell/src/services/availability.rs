// libs/appointment-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::services::directory::DoctorDirectory;
use doctor_cell::services::schedule::SlotGenerator;

use crate::models::AppointmentError;
use crate::state::BookingState;
use crate::store::AppointmentStore;

/// Answers "what can still be booked?" for one doctor on one date: the
/// generated candidate sequence minus every timestamp a non-cancelled
/// appointment holds. Computed against committed state on every call; nothing
/// here is cached.
pub struct AvailabilityService {
    store: Arc<AppointmentStore>,
    directory: Arc<DoctorDirectory>,
    slot_generator: SlotGenerator,
}

impl AvailabilityService {
    pub fn new(state: &BookingState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            directory: Arc::clone(&state.directory),
            slot_generator: SlotGenerator::new(state.config.slot_granularity_minutes),
        }
    }

    pub async fn available_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        let doctor = self
            .directory
            .get(doctor_id)
            .await
            .map_err(|_| AppointmentError::DoctorNotFound)?;

        let candidates = self
            .slot_generator
            .candidate_times(&doctor.schedule, date, now);
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let held: HashSet<NaiveTime> = self
            .store
            .held_times(doctor_id, date)
            .await
            .into_iter()
            .collect();

        let available: Vec<NaiveTime> = candidates
            .into_iter()
            .filter(|t| !held.contains(t))
            .collect();

        debug!(
            "Doctor {} has {} open slots on {}",
            doctor_id,
            available.len(),
            date
        );
        Ok(available)
    }
}
