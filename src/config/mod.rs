use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub limiter: LimiterConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_body_bytes: usize,
    pub shutdown_timeout_secs: u64,
    /// Deadline for a whole request; 0 disables it.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub max_idle_time_secs: u64,
    pub connection_timeout: u64,
    pub query_timeout_secs: u64,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    pub enabled: bool,
    /// Refill rate in tokens per second; fractional rates are allowed.
    pub requests_per_second: f64,
    pub burst: u32,
    pub sweep_interval_secs: u64,
}

/// Upper bound on the sweep interval, whatever `LIMITER_SWEEP_INTERVAL_SECS` says.
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

impl LimiterConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.min(MAX_SWEEP_INTERVAL_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SERVER_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_MAX_REQUEST_BODY_BYTES") {
            self.server.max_request_body_bytes = v.parse().unwrap_or(self.server.max_request_body_bytes);
        }
        if let Ok(v) = env::var("SERVER_SHUTDOWN_TIMEOUT_SECS") {
            self.server.shutdown_timeout_secs = v.parse().unwrap_or(self.server.shutdown_timeout_secs);
        }
        if let Ok(v) = env::var("SERVER_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = v.parse().unwrap_or(self.server.request_timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_MAX_IDLE_TIME_SECS") {
            self.database.max_idle_time_secs = v.parse().unwrap_or(self.database.max_idle_time_secs);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_QUERY_TIMEOUT_SECS") {
            self.database.query_timeout_secs = v.parse().unwrap_or(self.database.query_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Limiter overrides
        if let Ok(v) = env::var("LIMITER_ENABLED") {
            self.limiter.enabled = v.parse().unwrap_or(self.limiter.enabled);
        }
        if let Ok(v) = env::var("LIMITER_RPS") {
            self.limiter.requests_per_second = v.parse().unwrap_or(self.limiter.requests_per_second);
        }
        if let Ok(v) = env::var("LIMITER_BURST") {
            self.limiter.burst = v.parse().unwrap_or(self.limiter.burst);
        }
        if let Ok(v) = env::var("LIMITER_SWEEP_INTERVAL_SECS") {
            self.limiter.sweep_interval_secs = v.parse().unwrap_or(self.limiter.sweep_interval_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("JWT_AUDIENCE") {
            self.security.jwt_audience = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 4000,
                max_request_body_bytes: 1024 * 1024, // 1MB
                shutdown_timeout_secs: 5,
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 25,
                max_idle_time_secs: 15 * 60,
                connection_timeout: 30,
                query_timeout_secs: 3,
                run_migrations: true,
            },
            limiter: LimiterConfig {
                enabled: true,
                requests_per_second: 2.0,
                burst: 4,
                sweep_interval_secs: 60,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-do-not-use-in-production".to_string(),
                jwt_issuer: "greenlight".to_string(),
                jwt_audience: "greenlight".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 4000,
                max_request_body_bytes: 1024 * 1024,
                shutdown_timeout_secs: 10,
                request_timeout_secs: 2,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 25,
                max_idle_time_secs: 15 * 60,
                connection_timeout: 10,
                query_timeout_secs: 3,
                run_migrations: true,
            },
            limiter: LimiterConfig {
                enabled: true,
                requests_per_second: 2.0,
                burst: 4,
                sweep_interval_secs: 60,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "greenlight".to_string(),
                jwt_audience: "greenlight".to_string(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 4000,
                max_request_body_bytes: 1024 * 1024,
                shutdown_timeout_secs: 30,
                request_timeout_secs: 2,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                max_idle_time_secs: 15 * 60,
                connection_timeout: 5,
                query_timeout_secs: 3,
                run_migrations: false,
            },
            limiter: LimiterConfig {
                enabled: true,
                requests_per_second: 2.0,
                burst: 4,
                sweep_interval_secs: 60,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "greenlight".to_string(),
                jwt_audience: "greenlight".to_string(),
            },
        }
    }
}
