use serde::Deserialize;

use crate::Error;

pub const DEFAULT_PATH: &str = "/etc/snagmail/snagmail.toml";
const ENV_PREFIX: &str = "SNAGMAIL";

/// Top-level snagmail configuration.
///
/// Both sections are optional: the server starts with whatever is
/// configured, and an endpoint whose section is absent fails that
/// operation only (with a configuration error in the JSON envelope).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    pub mail: Option<MailConfig>,
    pub drive: Option<DriveConfig>,
}

/// Mail submission account. The sender address doubles as the
/// AUTH LOGIN username (Gmail app-password style).
#[derive(Clone, Debug, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub app_password: String,
}

/// Drive upload target: the service account JSON blob as provided by
/// the cloud console, plus the destination folder id.
#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    pub service_account_json: String,
    pub folder_id: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

/// Loads snagmail config from the filesystem and merges it with any
/// environment variables prefixed with SNAGMAIL_ (double underscore
/// separates section from key, e.g. SNAGMAIL_MAIL__USERNAME).
///
/// The file is optional so that a purely env-configured deployment works.
pub fn load(path: Option<&str>) -> Result<Config, Error> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path.unwrap_or(DEFAULT_PATH)).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| Error::Config(e.to_string()))?;

    settings
        .try_deserialize::<Config>()
        .map_err(|e| Error::Config(e.to_string()))
}
