pub mod models;
pub mod services;

pub use models::*;
pub use services::client::BookingApiClient;
pub use services::reconciler::BookingContext;
