use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Args(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub bind_addr: String,
    pub max_line_len: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7777".to_string(),
            max_line_len: net::DEFAULT_MAX_LINE_LEN,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    pub worlds_dir: String,
    pub default_world: String,
    /// Load `default_world` from `worlds_dir` at startup, falling back to
    /// the sample world when no save exists.
    pub autoload: bool,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            worlds_dir: "worlds".to_string(),
            default_world: "sample".to_string(),
            autoload: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "data/accounts.db".to_string(),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub net: NetConfig,
    pub world: WorldSection,
    pub database: DatabaseSection,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path. A missing file
    /// yields the defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&content)?)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Find `--config <path>` in the argument list (program name excluded).
pub fn config_path_from_args(args: &[String]) -> Result<Option<&str>, ConfigError> {
    let mut config_path = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => config_path = Some(path.as_str()),
                None => return Err(ConfigError::Args("--config requires a path argument".into())),
            },
            other => return Err(ConfigError::Args(format!("Unknown argument: {other}"))),
        }
    }
    Ok(config_path)
}

/// Parse CLI arguments and load config.
pub fn parse_cli_args() -> Result<ServerConfig, ConfigError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = config_path_from_args(&args)?;
    ServerConfig::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_values() {
        let config = ServerConfig::default();
        assert_eq!(config.net.bind_addr, "0.0.0.0:7777");
        assert_eq!(config.net.max_line_len, 4096);
        assert_eq!(config.world.worlds_dir, "worlds");
        assert_eq!(config.world.default_world, "sample");
        assert!(config.world.autoload);
        assert_eq!(config.database.path, "data/accounts.db");
    }

    #[test]
    fn load_nonexistent_file_returns_defaults() {
        let config = ServerConfig::load(Some("/tmp/nonexistent_mud_config_12345.toml")).unwrap();
        assert_eq!(config.net.bind_addr, "0.0.0.0:7777");
    }

    #[test]
    fn load_partial_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[net]
bind_addr = "127.0.0.1:9000"

[world]
autoload = false
"#
        )
        .unwrap();

        let config = ServerConfig::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.net.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.net.max_line_len, 4096);
        assert!(!config.world.autoload);
        assert_eq!(config.world.default_world, "sample");
    }

    #[test]
    fn bad_toml_is_an_error() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "[net\nbind_addr = ").unwrap();
        assert!(matches!(
            ServerConfig::load(Some(f.path().to_str().unwrap())),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn cli_config_flag() {
        let args = vec!["--config".to_string(), "mud.toml".to_string()];
        assert_eq!(config_path_from_args(&args).unwrap(), Some("mud.toml"));
        assert_eq!(config_path_from_args(&[]).unwrap(), None);
        assert!(config_path_from_args(&["--config".to_string()]).is_err());
        assert!(config_path_from_args(&["--bogus".to_string()]).is_err());
    }
}
