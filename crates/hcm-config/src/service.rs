//! hc-service configuration model

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix: `HCM__SECTION__KEY`
pub const ENV_PREFIX: &str = "HCM";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub data_service: DataServiceConfig,
    pub adaptor: AdaptorConfig,
    pub lease: LeaseSettings,
    pub notice: NoticeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:9602".to_string(),
        }
    }
}

/// Empty endpoint: rows live in an in-process store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataServiceConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorConfig {
    pub gateway_endpoint: String,
    pub timeout_secs: u64,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            gateway_endpoint: String::new(),
            timeout_secs: 30,
        }
    }
}

impl AdaptorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseSettings {
    pub dir: PathBuf,
    pub ttl_secs: u64,
    pub wait_secs: u64,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            dir: base.join("hcm").join("leases"),
            ttl_secs: 3600,
            wait_secs: 30,
        }
    }
}

impl LeaseSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

/// Empty webhook: notifications are only logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub webhook: String,
    pub queue_size: usize,
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            webhook: String::new(),
            queue_size: 64,
            max_attempts: 3,
            initial_delay_ms: 500,
        }
    }
}

impl NoticeConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data_service: DataServiceConfig::default(),
            adaptor: AdaptorConfig::default(),
            lease: LeaseSettings::default(),
            notice: NoticeConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Layer defaults, then the file (if any), then `HCM__*` environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let loaded: ServiceConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Load from `explicit` or, when absent, from the discovered file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(Some(path)),
            None => Self::load_from(crate::find_config_file().as_deref()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.notice.queue_size == 0 {
            return Err(ConfigError::Invalid(
                "notice.queue_size must be > 0".to_string(),
            ));
        }
        if self.notice.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "notice.max_attempts must be >= 1".to_string(),
            ));
        }
        if self.lease.wait_secs > self.lease.ttl_secs {
            return Err(ConfigError::Invalid(
                "lease.wait_secs must not exceed lease.ttl_secs".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen.parse().map_err(|_| {
            ConfigError::Invalid(format!("server.listen is not an address: {}", self.server.listen))
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        temp_env::with_vars_unset(["HCM__SERVER__LISTEN", "HCM__LEASE__TTL_SECS"], || {
            let config = ServiceConfig::load_from(None).unwrap();
            assert_eq!(config.server.listen, "127.0.0.1:9602");
            assert_eq!(config.adaptor.timeout(), Duration::from_secs(30));
            assert_eq!(config.lease.ttl_secs, 3600);
            assert_eq!(config.notice.queue_size, 64);
            assert!(config.lease.dir.ends_with("hcm/leases"));
        });
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_overrides_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("hc-service.yaml");
        fs::write(
            &path,
            "server:\n  listen: 0.0.0.0:9000\nnotice:\n  max_attempts: 5\n  queue_size: 8\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("HCM__SERVER__LISTEN", Some("0.0.0.0:9100")),
                ("HCM__DATA_SERVICE__ENDPOINT", Some("http://ds.local")),
            ],
            || {
                let config = ServiceConfig::load_from(Some(&path)).unwrap();
                assert_eq!(config.server.listen, "0.0.0.0:9100");
                assert_eq!(config.data_service.endpoint, "http://ds.local");
                assert_eq!(config.notice.max_attempts, 5);
                assert_eq!(config.notice.queue_size, 8);
                assert_eq!(config.notice.initial_delay_ms, 500);
            },
        );
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        let result = ServiceConfig::load_from(Some(Path::new("/nonexistent/hc-service.yaml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("hc-service.yaml");
        fs::write(&path, "server:\n  listen: not-an-address\n").unwrap();

        temp_env::with_var_unset("HCM__SERVER__LISTEN", || {
            assert!(matches!(
                ServiceConfig::load_from(Some(&path)),
                Err(ConfigError::Invalid(_))
            ));
        });

        let mut config = ServiceConfig::default();
        config.notice.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ServiceConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("gateway_endpoint"));

        let parsed: ServiceConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
