//! Application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Enrolment method configuration.
    #[serde(default)]
    pub enrol: EnrolConfig,
    /// Security configuration.
    pub security: SecurityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Enrolment method configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrolConfig {
    /// Method tags enabled site-wide, in display order.
    #[serde(default = "default_enabled_methods")]
    pub enabled_methods: Vec<String>,
    /// Settings of the self enrolment method.
    #[serde(default)]
    pub self_enrol: SelfEnrolConfig,
}

impl Default for EnrolConfig {
    fn default() -> Self {
        Self {
            enabled_methods: default_enabled_methods(),
            self_enrol: SelfEnrolConfig::default(),
        }
    }
}

/// Self enrolment method settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SelfEnrolConfig {
    /// Hint setting for instances that leave `show_hint` unset.
    #[serde(default)]
    pub show_hint: bool,
    /// Whether self enrolments may be removed through the unenrol page.
    #[serde(default = "default_true")]
    pub allow_unenrol: bool,
}

impl Default for SelfEnrolConfig {
    fn default() -> Self {
        Self {
            show_hint: false,
            allow_unenrol: true,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Secret used to derive per-user session keys.
    pub session_secret: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_enabled_methods() -> Vec<String> {
    vec!["manual".to_string(), "self".to_string()]
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ENROL_ENV`)
    /// 3. Environment variables with `ENROL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ENROL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ENROL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("enrol.enabled_methods")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
