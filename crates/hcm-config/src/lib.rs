pub mod error;
pub mod service;

pub use error::*;
pub use service::{
    AdaptorConfig, DataServiceConfig, ENV_PREFIX, LeaseSettings, NoticeConfig, ServerConfig,
    ServiceConfig,
};

use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "HCM_CONFIG_PATH";
const CONFIG_FILE_NAMES: [&str; 2] = ["hc-service.yaml", "hc-service.yml"];

/// hc-service config directory (`<config_dir>/hcm`), created on demand
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("hcm");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the hc-service config file
///
/// Search order:
/// 1. `HCM_CONFIG_PATH`
/// 2. current directory: `hc-service.yaml`, `hc-service.yml`
/// 3. `./.hcm/hc-service.yaml`
/// 4. `<config_dir>/hcm/hc-service.yaml`
///
/// `None` means run on defaults.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        for filename in CONFIG_FILE_NAMES {
            let path = current_dir.join(filename);
            if path.exists() {
                return Some(path);
            }
        }

        let path = current_dir.join(".hcm").join(CONFIG_FILE_NAMES[0]);
        if path.exists() {
            return Some(path);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("hcm").join(CONFIG_FILE_NAMES[0]))
        .filter(|path| path.exists())
}

/// Write a default config file; refuses to overwrite unless `force`
pub fn init_config(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, ServiceConfig::default().to_yaml()?)?;
    Ok(path.to_path_buf())
}

/// Where `config init` writes when no path is given
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAMES[0]))
}
