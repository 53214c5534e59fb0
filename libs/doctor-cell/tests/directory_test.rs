use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};

use doctor_cell::models::{CreateDoctorRequest, DoctorError, WeeklySchedule, WorkingWindow};
use doctor_cell::services::directory::DoctorDirectory;

fn sample_request() -> CreateDoctorRequest {
    CreateDoctorRequest {
        first_name: "Asha".to_string(),
        last_name: "Menon".to_string(),
        email: "asha.menon@example.com".to_string(),
        specialty: "General Medicine".to_string(),
        consultation_fee: 450.0,
        schedule: WeeklySchedule {
            active_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            active_until: None,
            windows: vec![WorkingWindow {
                day_of_week: 1,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            }],
        },
    }
}

#[tokio::test]
async fn register_and_fetch_doctor() {
    let directory = DoctorDirectory::new();

    let doctor = directory.register(sample_request()).await.unwrap();
    let fetched = directory.get(doctor.id).await.unwrap();

    assert_eq!(fetched.id, doctor.id);
    assert_eq!(fetched.full_name(), "Asha Menon");
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let directory = DoctorDirectory::new();

    let result = directory.get(uuid::Uuid::new_v4()).await;

    assert_matches!(result, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn rejects_window_with_inverted_times() {
    let directory = DoctorDirectory::new();

    let mut request = sample_request();
    request.schedule.windows[0].start_time = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
    request.schedule.windows[0].end_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();

    let result = directory.register(request).await;

    assert_matches!(result, Err(DoctorError::InvalidSchedule(_)));
}

#[tokio::test]
async fn rejects_window_with_bad_day_of_week() {
    let directory = DoctorDirectory::new();

    let mut request = sample_request();
    request.schedule.windows[0].day_of_week = 7;

    let result = directory.register(request).await;

    assert_matches!(result, Err(DoctorError::InvalidSchedule(_)));
}
