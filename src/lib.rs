pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use api::{FetchFailed, ReqwestTransport, Transport};
pub use config::Config;
pub use models::cache::{CacheState, CacheStore, CachedPayload, Payload};
pub use services::dashboard::DashboardService;
pub use services::fresh_data::FreshDataGate;
