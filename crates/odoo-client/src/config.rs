//! Client configuration.

use url::Url;

use crate::error::ConfigError;

/// Default port for `http` servers.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default port for `https` servers.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Environment variable holding the server base URL.
pub const ENV_HOST: &str = "ODOO_HOST";
/// Environment variable overriding the server port.
pub const ENV_PORT: &str = "ODOO_PORT";
/// Environment variable holding the database name.
pub const ENV_DB: &str = "ODOO_DB";
/// Environment variable holding the login.
pub const ENV_USER: &str = "ODOO_USER";
/// Environment variable holding the password or API key.
pub const ENV_PASSWORD: &str = "ODOO_PASSWORD";

/// Connection settings for an Odoo server.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the server (scheme and host; any path is ignored).
    pub url: Url,

    /// TCP port, defaulted from the scheme unless set explicitly.
    pub port: u16,

    /// Database to log into.
    pub database: String,

    /// Login name.
    pub username: String,

    /// Password or API key. Sent with every model call.
    pub password: String,
}

impl ClientConfig {
    /// Create a configuration from a base URL and credentials.
    ///
    /// The URL must use `http` or `https` and carry a host. The port comes
    /// from the URL when present, otherwise from the scheme.
    pub fn new(
        base_url: &str,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url.trim()).map_err(|source| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;

        let port = match url.scheme() {
            "https" => url.port().unwrap_or(DEFAULT_HTTPS_PORT),
            "http" => url.port().unwrap_or(DEFAULT_HTTP_PORT),
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingHost(base_url.to_string()));
        }

        Ok(Self {
            url,
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Load the configuration from `ODOO_HOST`, `ODOO_PORT`, `ODOO_DB`,
    /// `ODOO_USER` and `ODOO_PASSWORD`. Only the port is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::MissingEnv(key));

        let host = require(ENV_HOST)?;
        let mut config = Self::new(
            &host,
            require(ENV_DB)?,
            require(ENV_USER)?,
            require(ENV_PASSWORD)?,
        )?;

        if let Some(port) = lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
            config = config.with_port(port);
        }

        Ok(config)
    }

    /// Override the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Full URL of an endpoint path on this server.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        // Scheme and host were validated in `new`; http(s) URLs always accept a port.
        let _ = url.set_port(Some(self.port));
        url
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
