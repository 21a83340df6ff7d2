pub mod config;
pub mod duration;

pub use config::{ConfigError, DiscoveryConfig, GatewayConfig, WaypostConfig};
pub use duration::{MAX_DURATION, parse_duration};
