pub mod models;
pub mod validation;

pub use models::{GatewayConfig, RawConfig};
pub use validation::{ConfigValidator, ValidationError, ValidationResult};
