//! Tracing setup shared by the sitewatch binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_with};
pub use tracing::level_filters::LevelFilter;
pub use tracing_subscriber::util::TryInitError;
