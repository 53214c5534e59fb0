use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentType, BookAppointmentRequest, BookingValidationRules};
use reconciler_cell::models::BookingOutcome;
use shared_config::AppConfig;
use reconciler_cell::services::client::BookingApiClient;
use reconciler_cell::services::reconciler::BookingContext;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn booking_date() -> NaiveDate {
    Utc::now().date_naive() + Days::new(7)
}

fn client(server: &MockServer, timeout_ms: u64) -> Arc<BookingApiClient> {
    Arc::new(BookingApiClient::new(
        server.uri(),
        Duration::from_millis(timeout_ms),
    ))
}

fn booking_request(doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        patient_id: Uuid::new_v4(),
        scheduled_at: date.and_time(time).and_utc(),
        appointment_type: AppointmentType::Online,
        amount: 500.0,
        symptoms: vec![],
        report_reference: None,
        clinical_summary: None,
    }
}

async fn mount_slots(server: &MockServer, doctor_id: Uuid, date: NaiveDate, slots: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/doctors/{}/slots", doctor_id)))
        .and(query_param("date", date.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(slots)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn opening_a_context_fetches_availability_immediately() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();
    mount_slots(&server, doctor_id, date, &["09:00", "09:20"]).await;

    let config = AppConfig::default();
    let api_client = Arc::new(BookingApiClient::from_config(server.uri(), &config));
    let context = BookingContext::open_with_config(api_client, doctor_id, date, &config).await;

    assert_eq!(context.slots().await, vec![t(9, 0), t(9, 20)]);
    context.close().await;
}

#[tokio::test]
async fn appointment_lookup_parses_the_record() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/appointments/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "doctorId": doctor_id,
            "patientId": Uuid::new_v4(),
            "scheduledAt": booking_date().and_time(t(9, 20)).and_utc().to_rfc3339(),
            "appointmentType": "offline",
            "amount": 750.0,
            "status": "confirmed",
            "symptoms": ["fever"],
            "reportReference": null,
            "clinicalSummary": null,
            "createdAt": Utc::now().to_rfc3339(),
            "updatedAt": Utc::now().to_rfc3339(),
        })))
        .mount(&server)
        .await;

    let appointment = client(&server, 1000).fetch_appointment(id).await.unwrap();

    assert_eq!(appointment.id, id);
    assert_eq!(appointment.doctor_id, doctor_id);
}

#[tokio::test]
async fn view_converges_within_one_polling_interval() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();

    // First fetch sees two slots; every later fetch sees one, as if another
    // patient booked 09:20 between ticks.
    Mock::given(method("GET"))
        .and(path(format!("/doctors/{}/slots", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["09:00", "09:20"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_slots(&server, doctor_id, date, &["09:00"]).await;

    let context = BookingContext::open(
        client(&server, 1000),
        doctor_id,
        date,
        Duration::from_millis(100),
        BookingValidationRules::default(),
    )
    .await;

    assert!(context.select(t(9, 20)).await);
    assert_eq!(context.selected().await, Some(t(9, 20)));

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(context.slots().await, vec![t(9, 0)]);
    assert_eq!(context.selected().await, None);
    context.close().await;
}

#[tokio::test]
async fn conflict_drops_the_slot_and_refetches_immediately() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();

    Mock::given(method("GET"))
        .and(path(format!("/doctors/{}/slots", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["09:00", "09:20"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_slots(&server, doctor_id, date, &["09:00"]).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": "Appointment slot no longer available"})),
        )
        .mount(&server)
        .await;

    // Long interval: the second fetch can only come from the conflict path.
    let context = BookingContext::open(
        client(&server, 1000),
        doctor_id,
        date,
        Duration::from_secs(60),
        BookingValidationRules::default(),
    )
    .await;
    assert!(context.select(t(9, 20)).await);

    let outcome = context.submit(booking_request(doctor_id, date, t(9, 20))).await;

    assert_matches!(outcome, BookingOutcome::SlotTaken);
    assert_eq!(context.slots().await, vec![t(9, 0)]);
    assert_eq!(context.selected().await, None);

    let gets = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 2);
    context.close().await;
}

#[tokio::test]
async fn successful_booking_removes_the_slot_locally() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();
    mount_slots(&server, doctor_id, date, &["09:00", "09:20"]).await;

    let request = booking_request(doctor_id, date, t(9, 20));
    let appointment = json!({
        "id": Uuid::new_v4(),
        "doctorId": doctor_id,
        "patientId": request.patient_id,
        "scheduledAt": request.scheduled_at.to_rfc3339(),
        "appointmentType": "online",
        "amount": 500.0,
        "status": "pending",
        "symptoms": [],
        "reportReference": null,
        "clinicalSummary": null,
        "createdAt": Utc::now().to_rfc3339(),
        "updatedAt": Utc::now().to_rfc3339(),
    });
    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appointment))
        .mount(&server)
        .await;

    let context = BookingContext::open(
        client(&server, 1000),
        doctor_id,
        date,
        Duration::from_secs(60),
        BookingValidationRules::default(),
    )
    .await;

    let outcome = context.submit(request).await;

    let booked = assert_matches!(outcome, BookingOutcome::Booked(a) => a);
    assert_eq!(booked.doctor_id, doctor_id);
    assert_eq!(context.slots().await, vec![t(9, 0)]);
    context.close().await;
}

#[tokio::test]
async fn doomed_submission_is_rejected_without_a_round_trip() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();
    mount_slots(&server, doctor_id, date, &["09:00", "09:20"]).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let context = BookingContext::open(
        client(&server, 1000),
        doctor_id,
        date,
        Duration::from_secs(60),
        BookingValidationRules::default(),
    )
    .await;

    // Minute 15 is off the 20-minute grid.
    let outcome = context.submit(booking_request(doctor_id, date, t(9, 15))).await;

    assert_matches!(outcome, BookingOutcome::Rejected(msg) if msg.contains("slot grid"));
    context.close().await;
}

#[tokio::test]
async fn timed_out_submission_is_unknown_not_failed() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();
    mount_slots(&server, doctor_id, date, &["09:20"]).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let context = BookingContext::open(
        client(&server, 100),
        doctor_id,
        date,
        Duration::from_secs(60),
        BookingValidationRules::default(),
    )
    .await;

    let outcome = context.submit(booking_request(doctor_id, date, t(9, 20))).await;

    assert_matches!(outcome, BookingOutcome::Unknown);
    context.close().await;
}

#[tokio::test]
async fn transient_fetch_failure_leaves_the_view_unchanged() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();

    Mock::given(method("GET"))
        .and(path(format!("/doctors/{}/slots", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["09:00", "09:20"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Later fetches exceed the client timeout and count as transient.
    Mock::given(method("GET"))
        .and(path(format!("/doctors/{}/slots", doctor_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["09:00"]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let context = BookingContext::open(
        client(&server, 100),
        doctor_id,
        date,
        Duration::from_millis(100),
        BookingValidationRules::default(),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(350)).await;

    assert_eq!(context.slots().await, vec![t(9, 0), t(9, 20)]);
    context.close().await;
}

#[tokio::test]
async fn closing_the_context_stops_polling() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date = booking_date();
    mount_slots(&server, doctor_id, date, &["09:00"]).await;

    let context = BookingContext::open(
        client(&server, 1000),
        doctor_id,
        date,
        Duration::from_millis(50),
        BookingValidationRules::default(),
    )
    .await;
    context.close().await;

    let settled = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after = server.received_requests().await.unwrap().len();

    assert_eq!(after, settled);
}
