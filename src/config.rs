use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Bot credential. May be left empty in the file and injected via
    /// HOOKBOT_BOT_TOKEN instead.
    #[serde(default)]
    pub bot_token: String,
    /// Destination chat. May be left empty in the file and injected via
    /// HOOKBOT_CHAT_ID instead.
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind_addr: default_bind_addr(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // Deployment secrets take precedence over whatever is in the file.
        if let Ok(token) = std::env::var("HOOKBOT_BOT_TOKEN") {
            config.telegram.bot_token = token;
        }
        if let Ok(chat_id) = std::env::var("HOOKBOT_CHAT_ID") {
            config.telegram.chat_id = chat_id;
        }

        if config.telegram.bot_token.is_empty() {
            anyhow::bail!(
                "telegram.bot_token is not set: put it in the config file or HOOKBOT_BOT_TOKEN"
            );
        }
        if config.telegram.chat_id.is_empty() {
            anyhow::bail!(
                "telegram.chat_id is not set: put it in the config file or HOOKBOT_CHAT_ID"
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "-100200300"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_explicit_values_kept() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "42"
            api_base = "http://localhost:9999"

            [server]
            bind_addr = "127.0.0.1:3000"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.api_base, "http://localhost:9999");
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
    }
}
