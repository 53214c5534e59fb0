// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use tracing::{debug, info};

use doctor_cell::services::directory::DoctorDirectory;
use doctor_cell::services::schedule::SlotGenerator;

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, BookingValidationRules,
};
use crate::state::BookingState;
use crate::store::AppointmentStore;

/// The only path from "nothing" to a pending appointment. Validates the
/// requested timestamp, then hands the whole decision to the store's atomic
/// reserve; there is no separate is-it-free read anywhere on this path.
pub struct AppointmentBookingService {
    store: Arc<AppointmentStore>,
    directory: Arc<DoctorDirectory>,
    slot_generator: SlotGenerator,
    validation_rules: BookingValidationRules,
}

impl AppointmentBookingService {
    pub fn new(state: &BookingState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            directory: Arc::clone(&state.directory),
            slot_generator: SlotGenerator::new(state.config.slot_granularity_minutes),
            validation_rules: BookingValidationRules::from_config(&state.config),
        }
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} at {}",
            request.patient_id, request.doctor_id, request.scheduled_at
        );

        let now = Utc::now();
        validate_requested_time(request.scheduled_at, &self.validation_rules, now)?;

        let doctor = self
            .directory
            .get(request.doctor_id)
            .await
            .map_err(|_| AppointmentError::DoctorNotFound)?;

        // The timestamp must be one the generator would offer for that date;
        // this covers inactive dates and days without a working window.
        let date = request.scheduled_at.date_naive();
        let candidates = self
            .slot_generator
            .candidate_times(&doctor.schedule, date, now);
        if !candidates.contains(&request.scheduled_at.time()) {
            debug!(
                "Requested time {} not in doctor {}'s bookable hours",
                request.scheduled_at, request.doctor_id
            );
            return Err(AppointmentError::InvalidTime(
                "Requested time is outside the doctor's bookable hours for that date".to_string(),
            ));
        }

        self.store.reserve(request).await
    }
}

/// Precondition checks shared verbatim by the server's booking path and the
/// client's pre-submission check, so both sides reject the same requests.
/// Only the server's check is load-bearing.
pub fn validate_requested_time(
    scheduled_at: DateTime<Utc>,
    rules: &BookingValidationRules,
    now: DateTime<Utc>,
) -> Result<(), AppointmentError> {
    if scheduled_at <= now {
        return Err(AppointmentError::InvalidTime(
            "Appointment must be scheduled for a future time".to_string(),
        ));
    }

    let min_lead = ChronoDuration::minutes(rules.min_lead_time_minutes);
    if scheduled_at < now + min_lead {
        return Err(AppointmentError::InvalidTime(format!(
            "Appointment must be booked at least {} minutes in advance",
            rules.min_lead_time_minutes
        )));
    }

    if scheduled_at.minute() % rules.slot_granularity_minutes != 0
        || scheduled_at.second() != 0
        || scheduled_at.nanosecond() != 0
    {
        return Err(AppointmentError::InvalidTime(format!(
            "Appointment time must align to the {}-minute slot grid",
            rules.slot_granularity_minutes
        )));
    }

    let max_advance = ChronoDuration::days(rules.max_advance_booking_days);
    if scheduled_at >= now + max_advance {
        return Err(AppointmentError::InvalidTime(format!(
            "Appointment cannot be booked more than {} days in advance",
            rules.max_advance_booking_days
        )));
    }

    Ok(())
}
