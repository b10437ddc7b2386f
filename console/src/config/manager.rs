// File: console/src/config/manager.rs
use super::Config;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: &str) -> Result<Self> {
        let config = Self::load_configuration(config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);

        let content = match fs::read_to_string(&main_config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    main_config_path
                );
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(anyhow!(
                    "Failed to read main config {}: {}",
                    main_config_path,
                    e
                ))
            }
        };

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse {}: {}", main_config_path, e))?;

        info!(
            "Loaded configuration from {} (listen {}:{}, database {})",
            main_config_path, config.host, config.port, config.database_path
        );

        Ok(config)
    }
}
