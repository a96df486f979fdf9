use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub webdriver: WebDriverSettings,
    pub extraction: ExtractionSettings,
    pub replay: Option<ReplaySettings>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub start_url: String,
    pub site_host: String,
    pub login_marker: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub login_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WebDriverSettings {
    pub server_url: String,
    pub maximize_window: bool,
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ExtractionSettings {
    pub output_dir: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub next_button_wait_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scan_settle_min_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scan_settle_max_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub advance_settle_min_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub advance_settle_max_ms: u64,
    #[serde(default)]
    pub keep_page_sources: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReplaySettings {
    pub source_url: String,
    pub pages: Vec<String>,
}

impl ApplicationSettings {
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ExtractionSettings {
    pub fn next_button_wait(&self) -> Duration {
        Duration::from_millis(self.next_button_wait_ms)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(configuration_directory.join("local.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
