//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, ConfigError, GracePeriodConfig, HealthcheckConfig, KhanDefaults,
    PostgresConfig, RedisConfig, SearchConfig, SecurityConfig, ServerConfig, WebhooksConfig,
};
