// libs/appointment-cell/src/store.rs
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Keyed by (doctor, scheduled timestamp). Invariant: an entry exists exactly
/// while the referenced record is in a slot-holding status, so index insertion
/// doubles as the uniqueness check.
type SlotKey = (Uuid, DateTime<Utc>);

struct StoreInner {
    records: HashMap<Uuid, Appointment>,
    slot_index: HashMap<SlotKey, Uuid>,
}

/// Authoritative appointment store. Reservation is a single insert under the
/// write lock; concurrent attempts on the same (doctor, timestamp) see the
/// occupied index entry and fail with a conflict, everything else proceeds
/// independently.
pub struct AppointmentStore {
    inner: RwLock<StoreInner>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: HashMap::new(),
                slot_index: HashMap::new(),
            }),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Atomic check-and-reserve: creates the record only if no live record
    /// already holds the (doctor, timestamp) slot. The insert itself is the
    /// arbiter; callers must treat `SlotNotAvailable` as lost-the-race, not
    /// as a fault.
    pub async fn reserve(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let key = (request.doctor_id, request.scheduled_at);
        let mut inner = self.inner.write().await;

        if inner.slot_index.contains_key(&key) {
            warn!(
                "Slot conflict for doctor {} at {}",
                request.doctor_id, request.scheduled_at
            );
            return Err(AppointmentError::SlotNotAvailable);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            scheduled_at: request.scheduled_at,
            appointment_type: request.appointment_type,
            amount: request.amount,
            status: AppointmentStatus::Pending,
            symptoms: request.symptoms,
            report_reference: request.report_reference,
            clinical_summary: request.clinical_summary,
            created_at: now,
            updated_at: now,
        };

        inner.slot_index.insert(key, appointment.id);
        inner.records.insert(appointment.id, appointment.clone());

        info!(
            "Appointment {} reserved for doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.scheduled_at
        );
        Ok(appointment)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let inner = self.inner.read().await;
        inner
            .records
            .get(&appointment_id)
            .cloned()
            .ok_or(AppointmentError::NotFound)
    }

    /// Apply a status transition, validated against the lifecycle table.
    /// Cancellation removes the slot-index entry, releasing the slot for
    /// rebooking; completion leaves it in place.
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut inner = self.inner.write().await;

        let record = inner
            .records
            .get(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle
            .validate_status_transition(&record.status, &new_status)?;

        let key = (record.doctor_id, record.scheduled_at);
        if !new_status.holds_slot() {
            inner.slot_index.remove(&key);
        }

        let record = inner
            .records
            .get_mut(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;
        record.status = new_status;
        record.updated_at = Utc::now();
        let updated = record.clone();

        debug!(
            "Appointment {} transitioned to {}",
            appointment_id, new_status
        );
        Ok(updated)
    }

    /// Times still held for a doctor on a date, straight from the slot index.
    /// Read-only and safe to poll.
    pub async fn held_times(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<NaiveTime> {
        let inner = self.inner.read().await;
        let mut held: Vec<NaiveTime> = inner
            .slot_index
            .keys()
            .filter(|(doctor, at)| *doctor == doctor_id && at.date_naive() == date)
            .map(|(_, at)| at.time())
            .collect();
        held.sort();
        held
    }

    pub async fn search(&self, query: &crate::models::AppointmentSearchQuery) -> Vec<Appointment> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Appointment> = inner
            .records
            .values()
            .filter(|apt| {
                query.doctor_id.map_or(true, |id| apt.doctor_id == id)
                    && query.patient_id.map_or(true, |id| apt.patient_id == id)
                    && query.status.map_or(true, |s| apt.status == s)
                    && query.from_date.map_or(true, |from| apt.scheduled_at >= from)
                    && query.to_date.map_or(true, |to| apt.scheduled_at <= to)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        matches
    }
}

impl Default for AppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}
