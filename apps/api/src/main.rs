use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::BookingState;
use doctor_cell::DoctorDirectory;
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MediBridge API server");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_valid() {
        warn!("Scheduling configuration is invalid; check granularity and lead time settings");
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create shared state
    let directory = Arc::new(DoctorDirectory::new());
    let state = Arc::new(BookingState::new(config.clone(), Arc::clone(&directory)));

    // Build the application router
    let app = router::create_router(state, directory)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    info!("Listening on {}", config.bind_address);

    let listener = TcpListener::bind(&config.bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
