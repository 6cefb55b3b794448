//! # khan-common
//!
//! Shared utilities: layered configuration, tracing setup, and the codec used
//! to keep player names encrypted at rest.

pub mod config;
pub mod crypto;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, GracePeriodConfig, HealthcheckConfig, KhanDefaults,
    PostgresConfig, RedisConfig, SearchConfig, SecurityConfig, ServerConfig, WebhooksConfig,
};
pub use crypto::{CipherError, NameCipher};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
