// libs/doctor-cell/src/services/directory.rs
use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError};

/// In-process registry of doctors and their working-hours profiles.
pub struct DoctorDirectory {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
}

impl DoctorDirectory {
    pub fn new() -> Self {
        Self {
            doctors: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        validate_schedule(&request)?;

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            specialty: request.specialty,
            consultation_fee: request.consultation_fee,
            schedule: request.schedule,
            created_at: now,
            updated_at: now,
        };

        let mut doctors = self.doctors.write().await;
        doctors.insert(doctor.id, doctor.clone());

        info!("Registered doctor {} ({})", doctor.id, doctor.full_name());
        Ok(doctor)
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let doctors = self.doctors.read().await;
        doctors.get(&doctor_id).cloned().ok_or(DoctorError::NotFound)
    }

    pub async fn list(&self) -> Vec<Doctor> {
        let doctors = self.doctors.read().await;
        let mut all: Vec<Doctor> = doctors.values().cloned().collect();
        all.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        all
    }
}

impl Default for DoctorDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_schedule(request: &CreateDoctorRequest) -> Result<(), DoctorError> {
    let schedule = &request.schedule;

    if let Some(until) = schedule.active_until {
        if until < schedule.active_from {
            return Err(DoctorError::InvalidSchedule(
                "Active range ends before it starts".to_string(),
            ));
        }
    }

    for window in &schedule.windows {
        if window.day_of_week < 0 || window.day_of_week > 6 {
            return Err(DoctorError::InvalidSchedule(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }
        if window.start_time >= window.end_time {
            return Err(DoctorError::InvalidSchedule(
                "Start time must be before end time".to_string(),
            ));
        }
    }

    Ok(())
}
