use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct HelloConfig {
    pub common: core_config::Config,
}

impl HelloConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Ok(HelloConfig { common })
    }
}
