//! Server configuration.

/// Settings for the HTTP server, read from the environment at startup.
///
/// Recognized variables, each optional:
/// - `HOST`: bind address, defaults to `0.0.0.0`
/// - `PORT`: listen port, defaults to `3000` (unparsable values fall
///   back to the default)
/// - `RUST_LOG`: tracing filter directive, defaults to `info`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    /// Reads the environment, substituting defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// The `host:port` string to bind the listener to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}
