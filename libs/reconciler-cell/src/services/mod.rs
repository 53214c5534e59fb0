pub mod client;
pub mod reconciler;
