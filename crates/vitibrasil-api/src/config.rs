const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8055";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: expected a positive integer")]
    InvalidNumber { key: &'static str, value: String },
    #[error("Only one of API_USERNAME and API_PASSWORD is set")]
    IncompleteCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Server settings, read from the environment:
///
/// - `BIND_ADDRESS` (default `127.0.0.1:8055`)
/// - `VITIBRASIL_BASE_URL`: overrides the site root the scraper talks to
/// - `VITIBRASIL_MAX_CONCURRENT_FETCHES` (default 1)
/// - `API_USERNAME` / `API_PASSWORD`: enables HTTP Basic auth on `/api`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_address: String,
    pub base_url: Option<String>,
    pub max_concurrent_fetches: usize,
    pub credentials: Option<Credentials>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into());
        let base_url = lookup("VITIBRASIL_BASE_URL").filter(|url| !url.is_empty());

        let max_concurrent_fetches = match lookup("VITIBRASIL_MAX_CONCURRENT_FETCHES") {
            None => 1,
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "VITIBRASIL_MAX_CONCURRENT_FETCHES",
                    value,
                })?,
        };

        let credentials = match (lookup("API_USERNAME"), lookup("API_PASSWORD")) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        Ok(Self {
            bind_address,
            base_url,
            max_concurrent_fetches,
            credentials,
        })
    }
}
