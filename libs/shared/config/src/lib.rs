use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub slot_granularity_minutes: u32,
    pub min_lead_time_minutes: i64,
    pub max_advance_booking_days: i64,
    pub reconcile_interval_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("API_BIND_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("API_BIND_ADDRESS not set, using default");
                    "0.0.0.0:3000".to_string()
                }),
            slot_granularity_minutes: parse_env("SLOT_GRANULARITY_MINUTES", 20),
            min_lead_time_minutes: parse_env("MIN_LEAD_TIME_MINUTES", 60),
            max_advance_booking_days: parse_env("MAX_ADVANCE_BOOKING_DAYS", 90),
            reconcile_interval_seconds: parse_env("RECONCILE_INTERVAL_SECONDS", 5),
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS", 10),
        }
    }

    /// Granularity must divide an hour evenly so the grid lines up day to day.
    pub fn is_valid(&self) -> bool {
        self.slot_granularity_minutes > 0
            && 60 % self.slot_granularity_minutes == 0
            && self.min_lead_time_minutes >= 0
            && self.max_advance_booking_days > 0
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            slot_granularity_minutes: 20,
            min_lead_time_minutes: 60,
            max_advance_booking_days: 90,
            reconcile_interval_seconds: 5,
            request_timeout_seconds: 10,
        }
    }
}

fn parse_env<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid value, using default {}", key, default);
            default
        }),
        Err(_) => default,
    }
}
