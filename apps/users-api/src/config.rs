use core_config::{AppInfo, FromEnv, app_info, env_parse_or, server::ServerConfig};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use domain_users::{CacheBackend, UserCacheConfig};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub postgres: PostgresConfig,
    pub cache: UserCacheConfig,
    /// Present only when the cache backend is Redis
    pub redis: Option<RedisConfig>,
    pub server: ServerConfig,
    pub environment: Environment,
    /// RUN_MIGRATIONS, defaults to true
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let postgres = PostgresConfig::from_env()?;
        let cache = UserCacheConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let redis = match cache.backend {
            CacheBackend::Redis => Some(RedisConfig::from_env()?),
            CacheBackend::Memory | CacheBackend::None => None,
        };

        Ok(Self {
            app: app_info!(),
            postgres,
            cache,
            redis,
            server,
            environment,
            run_migrations: env_parse_or("RUN_MIGRATIONS", true)?,
        })
    }
}
