use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub collaborators: CollaboratorConfig,
    pub processor: ProcessorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub order_port: u16,
    pub payment_port: u16,
    pub webhook_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

/// Base URLs of the services this core calls into, plus the shared
/// per-call deadline for those calls.
#[derive(Debug, Deserialize, Clone)]
pub struct CollaboratorConfig {
    pub account_url: String,
    pub catalog_url: String,
    pub order_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    3
}

/// Payment processor credentials and endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorConfig {
    pub api_url: String,
    pub api_key: String,
    pub checkout_url: String,
    pub webhook_secret: String,
    #[serde(default)]
    pub test_mode: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of MERX)
            // Eg.. `MERX__DATABASE__URL=...` would set the database url
            .add_source(config::Environment::with_prefix("MERX").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
