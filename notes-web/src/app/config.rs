use std::sync::OnceLock;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub log_json: bool,

    // session
    #[serde(default)]
    pub session_secure: bool,
    #[serde(default = "default_session_inactivity_days")]
    pub session_inactivity_days: i64,

    // build
    #[serde(default = "default_local")]
    pub source: String,
    #[serde(default = "default_local")]
    pub git_commit: String,
    #[serde(default = "default_local")]
    pub pipeline_id: String,
    #[serde(default = "default_local")]
    pub version: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    4000
}

fn default_database_url() -> String {
    "sqlite.db".into()
}

fn default_session_inactivity_days() -> i64 {
    1
}

fn default_local() -> String {
    "local".into()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Self>()
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Process-wide configuration, read from the environment (and `.env`) on first use.
///
/// Panics on the first call when the environment holds a value that does not
/// parse, so `main` touches it before serving anything.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| match Config::from_env() {
        Ok(config) => config,
        Err(err) => panic!("invalid configuration: {err}"),
    })
}

#[cfg(test)]
pub fn config_override<F>(override_config: F) -> &'static Config
where
    F: FnOnce(Config) -> Config,
{
    CONFIG.get_or_init(|| match Config::from_env() {
        Ok(config) => override_config(config),
        Err(err) => panic!("invalid configuration: {err}"),
    })
}
