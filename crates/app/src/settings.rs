//! Application settings, loaded from a TOML file plus environment overrides.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 3000
//! database = { sqlite = "./quotaparte.db" }
//! ```
//!
//! `database = "memory"` selects an in-memory SQLite database (useful for
//! smoke testing; all data is lost on shutdown).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var("QUOTAPARTE_CONFIG").unwrap_or_else(|_| "quotaparte.toml".to_string());

        config::Config::builder()
            .add_source(config::File::with_name(&path))
            .add_source(config::Environment::with_prefix("QUOTAPARTE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
