//! `podcast-server`: the HTTP API facade described in spec.md §4.10,
//! wiring `podcast-runner`'s `Runner` facade to an `axum` router.

pub mod error;
pub mod http;
pub mod metrics;
pub mod state;

pub use error::ApiError;
pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler};
pub use state::AppState;
