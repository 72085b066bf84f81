use std::{env, path::PathBuf, time::Duration};

use rand::{Rng, distributions::Alphanumeric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Timeout and retry knobs for calls into the mock database.
#[derive(Debug, Clone)]
pub struct DbSettings {
    pub request_timeout: Duration,
    pub max_retries: usize,
    pub retry_delay: Duration,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(5_000),
            max_retries: 3,
            retry_delay: Duration::from_millis(1_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhatsAppSettings {
    pub enabled: bool,
    /// Simulated round trip of the messaging API.
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for WhatsAppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_millis(1_000),
            timeout: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminSettings {
    pub username: String,
    /// Argon2 PHC string. Admin login is disabled when unset.
    pub password_hash: Option<String>,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// File backing the local key/value store. In-memory only when unset.
    pub local_storage_path: Option<PathBuf>,
    pub db: DbSettings,
    pub whatsapp: WhatsAppSettings,
    pub admin: AdminSettings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };
        let local_storage_path = env::var("LOCAL_STORAGE_PATH").ok().map(PathBuf::from);

        let defaults = DbSettings::default();
        let db = DbSettings {
            request_timeout: env_millis("DB_REQUEST_TIMEOUT_MS").unwrap_or(defaults.request_timeout),
            max_retries: env::var("DB_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_delay: env_millis("DB_RETRY_DELAY_MS").unwrap_or(defaults.retry_delay),
        };

        let wa_defaults = WhatsAppSettings::default();
        let whatsapp = WhatsAppSettings {
            enabled: env::var("WHATSAPP_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(wa_defaults.enabled),
            delay: env_millis("WHATSAPP_DELAY_MS").unwrap_or(wa_defaults.delay),
            timeout: wa_defaults.timeout,
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment.is_development() => {
                tracing::warn!("JWT_SECRET is not set, using a random per-process secret");
                random_secret()
            }
            Err(_) => anyhow::bail!("JWT_SECRET must be set in production"),
        };

        let admin = AdminSettings {
            username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password_hash: env::var("ADMIN_PASSWORD_HASH").ok().filter(|h| !h.is_empty()),
            jwt_secret,
            session_ttl: chrono::Duration::hours(2),
        };

        Ok(Self {
            host,
            port,
            environment,
            local_storage_path,
            db,
            whatsapp,
            admin,
        })
    }

    /// Development configuration with no disk persistence and fast retries.
    pub fn local() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Development,
            local_storage_path: None,
            db: DbSettings {
                request_timeout: Duration::from_millis(2_000),
                max_retries: 3,
                retry_delay: Duration::from_millis(5),
            },
            whatsapp: WhatsAppSettings {
                enabled: true,
                delay: Duration::from_millis(5),
                timeout: Duration::from_millis(500),
            },
            admin: AdminSettings {
                username: "admin".to_string(),
                password_hash: None,
                jwt_secret: random_secret(),
                session_ttl: chrono::Duration::hours(2),
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
