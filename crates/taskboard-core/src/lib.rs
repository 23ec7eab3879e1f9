pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use config::AppConfig;
pub use error::{BoardError, ErrorClass, GatewayError};
pub use logging::init_tracing;
pub use result::{BoardResult, GatewayResult};
