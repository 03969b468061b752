use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::events::EventConsumerConfig;
use crate::listener::ListenerConfig;
use crate::queue::ReceiveOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database_url: String,
    pub queues: QueuesConfig,
    pub object_store: ObjectStoreConfig,
    pub funding: FundingConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub listener: ListenerSection,
    #[serde(default)]
    pub events: EventsSection,
    #[serde(default)]
    pub health: HealthSection,
    #[serde(default)]
    pub features: FeaturesSection,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QueuesConfig {
    #[serde(default)]
    pub notifications: String,
    #[serde(default)]
    pub dead_letter: String,
    #[serde(default)]
    pub provider_events: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ObjectStoreConfig {
    #[serde(default)]
    pub root_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FundingConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_funding_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_funding_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub domestic_endpoint: String,
    #[serde(default)]
    pub cross_border_endpoint: String,
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    #[serde(default = "default_dispatch_workers")]
    pub dispatch_workers: usize,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_outbound_buffer() -> usize {
    crate::provider::channel::DEFAULT_OUTBOUND_BUFFER
}

fn default_dispatch_workers() -> usize {
    4
}

fn default_provider_timeout_ms() -> u64 {
    10_000
}

/// File listener polling
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListenerSection {
    pub max_messages: usize,
    pub wait_time_secs: u64,
    pub visibility_timeout_secs: u64,
    pub disabled_sleep_secs: u64,
}

impl Default for ListenerSection {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time_secs: 20,
            visibility_timeout_secs: 60,
            disabled_sleep_secs: 5,
        }
    }
}

/// Provider event consumer
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventsSection {
    pub max_messages: usize,
    pub shards: usize,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            max_messages: 10,
            shards: 8,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthSection {
    pub interval_ms: u64,
    pub ping_timeout_ms: u64,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            ping_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeaturesSection {
    pub ingestion_enabled: bool,
}

impl Default for FeaturesSection {
    fn default() -> Self {
        Self {
            ingestion_enabled: true,
        }
    }
}

impl AppConfig {
    /// Read `config/<env>.yaml`, apply `SETTLEMENTS_*` overrides and validate
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Environment overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let string_overrides: [(&str, &mut String); 8] = [
            ("SETTLEMENTS_DATABASE_URL", &mut self.database_url),
            ("SETTLEMENTS_NOTIFICATION_QUEUE", &mut self.queues.notifications),
            ("SETTLEMENTS_DEAD_LETTER_QUEUE", &mut self.queues.dead_letter),
            ("SETTLEMENTS_PROVIDER_EVENTS_QUEUE", &mut self.queues.provider_events),
            ("SETTLEMENTS_OBJECT_STORE_ROOT", &mut self.object_store.root_dir),
            ("SETTLEMENTS_FUNDING_ENDPOINT", &mut self.funding.endpoint),
            (
                "SETTLEMENTS_DOMESTIC_PROVIDER_ENDPOINT",
                &mut self.providers.domestic_endpoint,
            ),
            (
                "SETTLEMENTS_CROSS_BORDER_PROVIDER_ENDPOINT",
                &mut self.providers.cross_border_endpoint,
            ),
        ];
        for (name, field) in string_overrides {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }

        if let Some(port) = lookup("SETTLEMENTS_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SETTLEMENTS_PORT",
                value: port,
            })?;
        }
        Ok(())
    }

    /// Every endpoint and queue the service talks to must be set
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required: [(&'static str, &str); 8] = [
            ("database_url", &self.database_url),
            ("queues.notifications", &self.queues.notifications),
            ("queues.dead_letter", &self.queues.dead_letter),
            ("queues.provider_events", &self.queues.provider_events),
            ("object_store.root_dir", &self.object_store.root_dir),
            ("funding.endpoint", &self.funding.endpoint),
            ("providers.domestic_endpoint", &self.providers.domestic_endpoint),
            (
                "providers.cross_border_endpoint",
                &self.providers.cross_border_endpoint,
            ),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }
        if self.providers.outbound_buffer == 0 {
            return Err(ConfigError::Invalid {
                name: "providers.outbound_buffer",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            receive: ReceiveOptions {
                max_messages: self.listener.max_messages,
                wait: Duration::from_secs(self.listener.wait_time_secs),
                visibility_timeout: Duration::from_secs(self.listener.visibility_timeout_secs),
            },
            disabled_sleep: Duration::from_secs(self.listener.disabled_sleep_secs),
            ..ListenerConfig::default()
        }
    }

    pub fn event_consumer_config(&self) -> EventConsumerConfig {
        EventConsumerConfig {
            receive: ReceiveOptions {
                max_messages: self.events.max_messages,
                ..ReceiveOptions::default()
            },
            shards: self.events.shards.max(1),
            ..EventConsumerConfig::default()
        }
    }
}
