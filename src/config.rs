use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::blockchain::transfer_decoder::{validate_address, AddressFormat};
use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub token: TokenConfig,
    pub fetch: FetchConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL, normally supplied through `MAINNET_RPC_URL`
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// The one ERC-20 token being watched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub contract_address: String,
    /// Display label only
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of blocks behind the head to start from
    pub window_size: u64,
    pub address_format: AddressFormat,
}

/// HTTP front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            contract_address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            address_format: AddressFormat::Lowercase,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl TokenConfig {
    /// The configured contract address, parsed. Never corrected: a value of
    /// the wrong length is reported, not padded or truncated.
    pub fn address(&self) -> Result<Address, ConfigError> {
        validate_address(&self.contract_address).map_err(|reason| ConfigError::InvalidAddress {
            address: self.contract_address.clone(),
            reason,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by `CONFIG_FILE` (default
    /// `config.toml`). A missing file yields the defaults.
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var("MAINNET_RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.rpc.timeout_seconds = parse_env("RPC_TIMEOUT_SECONDS", timeout)?;
        }

        if let Ok(address) = env::var("TOKEN_CONTRACT_ADDRESS") {
            self.token.contract_address = address;
        }
        if let Ok(symbol) = env::var("TOKEN_SYMBOL") {
            self.token.symbol = symbol;
        }
        if let Ok(decimals) = env::var("TOKEN_DECIMALS") {
            self.token.decimals = parse_env("TOKEN_DECIMALS", decimals)?;
        }

        if let Ok(window) = env::var("BLOCK_WINDOW") {
            self.fetch.window_size = parse_env("BLOCK_WINDOW", window)?;
        }
        if let Ok(format) = env::var("ADDRESS_FORMAT") {
            self.fetch.address_format = parse_env("ADDRESS_FORMAT", format)?;
        }

        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = env::var("API_PORT") {
            self.api.port = parse_env("API_PORT", port)?;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("MAINNET_RPC_URL".to_string()));
        }
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }

        self.token.address()?;

        // 10^78 no longer fits in 256 bits
        if self.token.decimals > 77 {
            return Err(ConfigError::InvalidValue {
                key: "token.decimals".to_string(),
                value: self.token.decimals.to_string(),
            });
        }

        if self.fetch.window_size == 0 || self.fetch.window_size > 10_000 {
            return Err(ConfigError::InvalidValue {
                key: "fetch.window_size".to_string(),
                value: self.fetch.window_size.to_string(),
            });
        }

        if self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}
