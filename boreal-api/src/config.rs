use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    pub dedupe: Option<DedupeConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DedupeConfig {
    #[serde(default)]
    pub alias_domains: Vec<AliasDomainConfig>,
}

/// An extra mailbox provider whose addresses ignore `+tags` and/or dots.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AliasDomainConfig {
    pub domain: String,
    pub canonical_domain: Option<String>,
    #[serde(default = "default_true")]
    pub strip_plus_tag: bool,
    #[serde(default)]
    pub strip_dots: bool,
}

fn default_true() -> bool {
    true
}

const DEFAULT_CONFIG: &str = r#"
[cors]
allowed_origins = ["http://localhost:3030"]

[server]
host = "127.0.0.1"
port = 8080

[database]
# path = "/var/lib/boreal/crm.sqlite3"
pool_size = 8

# Additional alias-insensitive mailbox providers (gmail.com and
# googlemail.com are always included).
# [[dedupe.alias_domains]]
# domain = "fastmail.com"
# strip_plus_tag = true
# strip_dots = false
"#;

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        Self::load_from(&get_config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path.to_path_buf()))
    }

    pub fn bind_address(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }

    pub fn alias_domains(&self) -> &[AliasDomainConfig] {
        self.dedupe
            .as_ref()
            .map(|d| d.alias_domains.as_slice())
            .unwrap_or(&[])
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("boreal").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
