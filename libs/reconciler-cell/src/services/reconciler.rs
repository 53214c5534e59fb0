// libs/reconciler-cell/src/services/reconciler.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::{BookAppointmentRequest, BookingValidationRules};
use appointment_cell::services::booking::validate_requested_time;
use shared_config::AppConfig;

use crate::models::{BookingOutcome, ClientError};
use crate::services::client::BookingApiClient;

struct LocalView {
    slots: Vec<NaiveTime>,
    selected: Option<NaiveTime>,
}

/// One open booking screen for a (doctor, date) pair. Fetches availability
/// immediately, then keeps polling on a fixed interval for as long as the
/// context is open. The local view is a best-effort cache: it narrows what the
/// operator is offered, and the server's atomic reserve makes every real
/// decision at submission time.
pub struct BookingContext {
    client: Arc<BookingApiClient>,
    doctor_id: Uuid,
    date: NaiveDate,
    view: Arc<RwLock<LocalView>>,
    validation_rules: BookingValidationRules,
    shutdown_tx: watch::Sender<bool>,
    poll_handle: Option<JoinHandle<()>>,
}

impl BookingContext {
    /// Open with the product cadence: poll interval and validation rules come
    /// straight from configuration, matching what the server enforces.
    pub async fn open_with_config(
        client: Arc<BookingApiClient>,
        doctor_id: Uuid,
        date: NaiveDate,
        config: &AppConfig,
    ) -> Self {
        Self::open(
            client,
            doctor_id,
            date,
            Duration::from_secs(config.reconcile_interval_seconds),
            BookingValidationRules::from_config(config),
        )
        .await
    }

    pub async fn open(
        client: Arc<BookingApiClient>,
        doctor_id: Uuid,
        date: NaiveDate,
        poll_interval: Duration,
        validation_rules: BookingValidationRules,
    ) -> Self {
        let view = Arc::new(RwLock::new(LocalView {
            slots: Vec::new(),
            selected: None,
        }));

        refresh_view(&client, doctor_id, date, &view).await;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let poll_client = Arc::clone(&client);
        let poll_view = Arc::clone(&view);

        let poll_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            // The first tick fires immediately and the opening fetch already
            // happened; consume it so polling starts one interval out.
            interval.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("Booking context for doctor {} on {} closed", doctor_id, date);
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        refresh_view(&poll_client, doctor_id, date, &poll_view).await;
                    }
                }
            }
        });

        info!(
            "Opened booking context for doctor {} on {} (poll every {:?})",
            doctor_id, date, poll_interval
        );

        Self {
            client,
            doctor_id,
            date,
            view,
            validation_rules,
            shutdown_tx,
            poll_handle: Some(poll_handle),
        }
    }

    pub async fn slots(&self) -> Vec<NaiveTime> {
        self.view.read().await.slots.clone()
    }

    pub async fn selected(&self) -> Option<NaiveTime> {
        self.view.read().await.selected
    }

    /// Select a candidate slot. Only times currently in the local view can be
    /// selected.
    pub async fn select(&self, time: NaiveTime) -> bool {
        let mut view = self.view.write().await;
        if view.slots.contains(&time) {
            view.selected = Some(time);
            true
        } else {
            false
        }
    }

    /// Run one reconciliation pass outside the regular cadence.
    pub async fn refresh_now(&self) {
        refresh_view(&self.client, self.doctor_id, self.date, &self.view).await;
    }

    /// Submit a booking for the currently open doctor/date. The local
    /// precondition check mirrors the server's and only exists to avoid
    /// doomed round-trips; conflicts are absorbed into the view rather than
    /// surfaced as errors.
    pub async fn submit(&self, request: BookAppointmentRequest) -> BookingOutcome {
        if let Err(e) = validate_requested_time(request.scheduled_at, &self.validation_rules, Utc::now())
        {
            return BookingOutcome::Rejected(e.to_string());
        }

        let slot_time = request.scheduled_at.time();
        match self.client.submit_booking(&request).await {
            Ok(BookingOutcome::Booked(appointment)) => {
                let mut view = self.view.write().await;
                view.slots.retain(|t| *t != slot_time);
                if view.selected == Some(slot_time) {
                    view.selected = None;
                }
                info!("Booked appointment {} at {}", appointment.id, slot_time);
                BookingOutcome::Booked(appointment)
            }
            Ok(BookingOutcome::SlotTaken) => {
                debug!(
                    "Slot {} on {} taken by a concurrent booking",
                    slot_time, self.date
                );
                self.drop_slot(slot_time).await;
                self.refresh_now().await;
                BookingOutcome::SlotTaken
            }
            Ok(other) => other,
            Err(ClientError::Timeout) => {
                warn!("Booking submission timed out; outcome unknown");
                self.refresh_now().await;
                BookingOutcome::Unknown
            }
            Err(ClientError::Transport(msg)) => {
                warn!("Booking submission failed in transit: {}", msg);
                BookingOutcome::Unknown
            }
            Err(ClientError::Unexpected(msg)) => BookingOutcome::Failed(msg),
        }
    }

    /// Stop polling and tear the context down. In-flight submissions running
    /// on the caller's task are unaffected.
    pub async fn close(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.poll_handle.take() {
            let _ = handle.await;
        }
    }

    async fn drop_slot(&self, time: NaiveTime) {
        let mut view = self.view.write().await;
        view.slots.retain(|t| *t != time);
        if view.selected == Some(time) {
            view.selected = None;
        }
    }
}

impl Drop for BookingContext {
    fn drop(&mut self) {
        // Backstop for contexts dropped without close(): no orphaned pollers.
        if let Some(handle) = self.poll_handle.take() {
            handle.abort();
        }
    }
}

/// One reconciliation pass: replace the local slot list with the fresh
/// authoritative view and clear a selection that no longer exists. A failed
/// fetch is transient; the view is left as-is for the next tick to retry.
async fn refresh_view(
    client: &BookingApiClient,
    doctor_id: Uuid,
    date: NaiveDate,
    view: &RwLock<LocalView>,
) {
    match client.fetch_slots(doctor_id, date).await {
        Ok(fresh) => {
            let mut view = view.write().await;
            if let Some(selected) = view.selected {
                if !fresh.contains(&selected) {
                    debug!("Selected slot {} no longer available", selected);
                    view.selected = None;
                }
            }
            view.slots = fresh;
        }
        Err(ClientError::Timeout) | Err(ClientError::Transport(_)) => {
            debug!("Availability refresh failed transiently; retrying next tick");
        }
        Err(ClientError::Unexpected(msg)) => {
            warn!("Availability refresh failed: {}", msg);
        }
    }
}
