// libs/reconciler-cell/src/services/client.rs
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, error};
use uuid::Uuid;

use appointment_cell::models::{Appointment, BookAppointmentRequest};

use crate::models::{BookingOutcome, ClientError};

/// Thin HTTP client over the booking API. Every call is bounded by the
/// configured timeout; classification of the response (conflict vs validation
/// vs transient) happens here so the reconciler only deals in outcomes.
pub struct BookingApiClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl BookingApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            request_timeout,
        }
    }

    pub fn from_config(base_url: impl Into<String>, config: &shared_config::AppConfig) -> Self {
        Self::new(base_url, Duration::from_secs(config.request_timeout_seconds))
    }

    /// GET /doctors/{id}/slots?date=… parsed into times.
    pub async fn fetch_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, ClientError> {
        let url = format!("{}/doctors/{}/slots?date={}", self.base_url, doctor_id, date);
        debug!("Fetching availability from {}", url);

        let response = timeout(self.request_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Slots query failed ({}): {}", status, body);
            return Err(ClientError::Unexpected(format!(
                "Slots query failed ({}): {}",
                status, body
            )));
        }

        let raw: Vec<String> = timeout(self.request_timeout, response.json())
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|e| ClientError::Unexpected(format!("Malformed slots payload: {}", e)))?;

        raw.iter()
            .map(|s| {
                NaiveTime::parse_from_str(s, "%H:%M")
                    .map_err(|e| ClientError::Unexpected(format!("Malformed slot '{}': {}", s, e)))
            })
            .collect()
    }

    /// POST /appointments. 409 means the slot was lost to a concurrent
    /// booking; 400 carries the violated precondition; a timeout leaves the
    /// outcome unknown and is reported as such.
    pub async fn submit_booking(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<BookingOutcome, ClientError> {
        let url = format!("{}/appointments", self.base_url);
        debug!("Submitting booking to {}", url);

        let response = timeout(
            self.request_timeout,
            self.client.post(&url).json(request).send(),
        )
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let appointment: Appointment = timeout(self.request_timeout, response.json())
                .await
                .map_err(|_| ClientError::Timeout)?
                .map_err(|e| {
                    ClientError::Unexpected(format!("Malformed appointment payload: {}", e))
                })?;
            Ok(BookingOutcome::Booked(appointment))
        } else if status == StatusCode::CONFLICT {
            Ok(BookingOutcome::SlotTaken)
        } else if status == StatusCode::BAD_REQUEST {
            let message = error_message(response).await;
            Ok(BookingOutcome::Rejected(message))
        } else {
            let message = error_message(response).await;
            error!("Booking submission failed ({}): {}", status, message);
            Err(ClientError::Unexpected(format!(
                "Booking submission failed ({}): {}",
                status, message
            )))
        }
    }

    /// GET /appointments/{id}, used to re-verify after an unknown outcome.
    pub async fn fetch_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, ClientError> {
        let url = format!("{}/appointments/{}", self.base_url, appointment_id);

        let response = timeout(self.request_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Unexpected(format!(
                "Appointment lookup failed ({}): {}",
                status, body
            )));
        }

        timeout(self.request_timeout, response.json())
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|e| ClientError::Unexpected(format!("Malformed appointment payload: {}", e)))
    }
}

async fn error_message(response: reqwest::Response) -> String {
    match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => "Unknown error".to_string(),
    }
}
