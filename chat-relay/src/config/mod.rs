use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub ollama: OllamaSettings,
}

/// Where the inference daemon lives and which model to ask for. The model
/// identifier is configuration rather than a literal so a deployment can
/// switch models without a rebuild.
#[derive(Debug, Clone)]
pub struct OllamaSettings {
    pub url: String,
    pub model: String,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(RelayConfig {
            common,
            ollama: OllamaSettings {
                url: env_or("OLLAMA_URL", "http://host.docker.internal:11434"),
                model: env_or("OLLAMA_MODEL", "codellama:7b"),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
