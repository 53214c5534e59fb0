// libs/doctor-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    pub consultation_fee: f64,
    pub schedule: WeeklySchedule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A doctor's recurring working-hours profile. Windows repeat weekly within
/// the active date range; a day with no window is not bookable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub active_from: NaiveDate,
    pub active_until: Option<NaiveDate>,
    pub windows: Vec<WorkingWindow>,
}

impl WeeklySchedule {
    pub fn covers(&self, date: NaiveDate) -> bool {
        if date < self.active_from {
            return false;
        }
        match self.active_until {
            Some(until) => date <= until,
            None => true,
        }
    }

    pub fn windows_for_day(&self, day_of_week: i32) -> impl Iterator<Item = &WorkingWindow> {
        self.windows
            .iter()
            .filter(move |w| w.day_of_week == day_of_week)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingWindow {
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    pub consultation_fee: f64,
    pub schedule: WeeklySchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}
