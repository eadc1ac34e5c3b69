use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Seconds to wait for a pooled connection before giving up
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing and delivery settings
///
/// Loaded once at startup and handed to the issuer, verifier, refresh
/// coordinator and auth gate. Nothing mutates it afterwards.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
    /// Issuer and audience stamped into every token
    pub domain: String,
    pub access_token_expiry: i64,   // seconds (900 = 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (86400 = 24 hours)
    /// A refresh token is only rotated once its remaining lifetime drops to this many seconds
    pub refresh_window: i64,
    pub cookie_name: String,
    /// `Domain` attribute of the refresh cookie; not sent for `__Host-` names
    pub cookie_domain: String,
}

impl JwtSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".to_string()));
        }
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Message("jwt.domain must not be empty".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.access_token_expiry >= self.refresh_token_expiry {
            return Err(ConfigError::Message(
                "jwt.access_token_expiry must be shorter than jwt.refresh_token_expiry".to_string(),
            ));
        }
        if self.refresh_window < 0 {
            return Err(ConfigError::Message(
                "jwt.refresh_window must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults, then an optional `configuration` file, then `APP_*` environment
/// variables (`APP_JWT__SECRET`, `APP_APPLICATION__PORT`, ...).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8090)?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "postgres")?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432)?
        .set_default("database.database_name", "users")?
        .set_default("database.acquire_timeout", 5)?
        .set_default("jwt.domain", "example.com")?
        .set_default("jwt.access_token_expiry", 900)?
        .set_default("jwt.refresh_token_expiry", 86400)?
        .set_default("jwt.refresh_window", 30)?
        .set_default("jwt.cookie_name", "__Host-refresh_token")?
        .set_default("jwt.cookie_domain", "localhost")?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.jwt.validate()?;
    Ok(settings)
}
