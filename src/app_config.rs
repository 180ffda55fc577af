use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub state_file: String,
    pub script_file: String,
    pub lock_file: String,
    /// Public landing page, used in share links.
    pub public_url: String,
    pub default_max_members: u32,
    pub registration_limit: u32,
    pub judges_per_submission: u32,
    pub feed_capacity: usize,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_sources("config")
    }

    /// Defaults, then an optional config file, then `HACKHUB_*` variables
    /// (`HACKHUB_TELEGRAM__TOKEN` sets `telegram.token`).
    pub fn from_sources(config_file: &str) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        Config::builder()
            .set_default("state_file", defaults.state_file)?
            .set_default("script_file", defaults.script_file)?
            .set_default("lock_file", defaults.lock_file)?
            .set_default("public_url", defaults.public_url)?
            .set_default("default_max_members", i64::from(defaults.default_max_members))?
            .set_default("registration_limit", i64::from(defaults.registration_limit))?
            .set_default("judges_per_submission", i64::from(defaults.judges_per_submission))?
            .set_default("feed_capacity", defaults.feed_capacity as i64)?
            .set_default("telegram.token", "")?
            .set_default("telegram.chat_id", "")?
            .add_source(File::with_name(config_file).required(false))
            .add_source(Environment::with_prefix("HACKHUB").prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_file: "hackhub_state.json".to_string(),
            script_file: "input_script.json".to_string(),
            lock_file: "hackhub.lock".to_string(),
            public_url: "https://hackathon.example.com".to_string(),
            default_max_members: 4,
            registration_limit: 150,
            judges_per_submission: 3,
            feed_capacity: 256,
            telegram: TelegramConfig::default(),
        }
    }
}
