use crate::error::ConfigError;

/// bcrypt rounds below this are rejected at startup
pub const MIN_HASH_COST: u32 = 10;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub password: PasswordSettings,
    /// Postgres credential store; the in-memory store is used when absent
    pub database: Option<DatabaseSettings>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings
///
/// Both secrets are mandatory and have no default. `get_configuration`
/// reports a missing one by its environment variable name.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: i64,   // seconds (86400 = 24 hours)
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: i64,  // seconds (604800 = 7 days)
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

// Secrets must never end up in logs
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"[redacted]")
            .field("refresh_secret", &"[redacted]")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            hash_cost: default_hash_cost(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_access_expiry() -> i64 {
    24 * 60 * 60
}

fn default_refresh_expiry() -> i64 {
    7 * 24 * 60 * 60
}

fn default_issuer() -> String {
    "tribridge".to_string()
}

fn default_hash_cost() -> u32 {
    MIN_HASH_COST
}

impl Settings {
    /// Reject settings the service must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;

        if self.password.hash_cost < MIN_HASH_COST || self.password.hash_cost > 31 {
            return Err(ConfigError::InvalidValue(format!(
                "password.hash_cost must be between {} and 31",
                MIN_HASH_COST
            )));
        }

        Ok(())
    }
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.refresh_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_REFRESH_SECRET".to_string()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET and JWT_REFRESH_SECRET must differ".to_string(),
            ));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "token expiry must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `configuration.{yaml,json,toml}` (optional), then
/// `APP_*` environment variables (`APP_APPLICATION__PORT=9000`), then the
/// `JWT_SECRET` / `JWT_REFRESH_SECRET` variables.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("jwt.access_secret", std::env::var("JWT_SECRET").ok())?
        .set_override_option("jwt.refresh_secret", std::env::var("JWT_REFRESH_SECRET").ok())?
        .build()?;

    settings_from(settings)
}

/// Secret keys and the variable that supplies each
const REQUIRED_SECRETS: [(&str, &str); 2] = [
    ("jwt.access_secret", "JWT_SECRET"),
    ("jwt.refresh_secret", "JWT_REFRESH_SECRET"),
];

fn settings_from(source: config::Config) -> Result<Settings, ConfigError> {
    for (key, variable) in REQUIRED_SECRETS {
        match source.get::<String>(key) {
            Ok(_) => {}
            Err(config::ConfigError::NotFound(_)) => {
                return Err(ConfigError::MissingRequired(variable.to_string()));
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue(format!("{}: {}", variable, e)));
            }
        }
    }

    let settings = source.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
