use crate::highlight::DEFAULT_STYLE;
use byte_unit::Byte;
use config::{self, ConfigError};
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables overriding file values.
///
/// `PBKIT__SERVER__ADDRESS` sets `server.address`.
pub const ENV_PREFIX: &str = "PBKIT";

/// Configuration values.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Paste configuration.
    #[serde(default)]
    pub paste: PasteConfig,
    /// Highlighting configuration.
    #[serde(default)]
    pub highlight: HighlightConfig,
}

/// Server configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind.
    pub address: String,
    /// Number of workers to start.
    pub workers: Option<usize>,
    /// Maximum content length.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: Byte,
}

fn default_max_content_length() -> Byte {
    Byte::from_u64(10_000_000)
}

impl ServerConfig {
    /// Returns the maximum content length in bytes.
    pub fn content_limit(&self) -> usize {
        usize::try_from(self.max_content_length.as_u64()).unwrap_or(usize::MAX)
    }
}

/// Paste configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PasteConfig {
    /// Lifetime of pastes created without an explicit sunset.
    #[serde(default, with = "humantime_serde")]
    pub default_sunset: Option<Duration>,
}

/// Highlighting configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HighlightConfig {
    /// Theme used when the request names none.
    pub default_style: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            default_style: DEFAULT_STYLE.to_string(),
        }
    }
}

impl Config {
    /// Parses the config file and returns the values.
    ///
    /// Environment variables prefixed with [`ENV_PREFIX`] take precedence.
    pub fn parse(path: &Path) -> Result<Config, ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::error::Error;
    use std::io::Write;

    #[test]
    fn test_parse_config() -> Result<(), Box<dyn Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            r#"
[server]
address = "127.0.0.1:8000"
max_content_length = "1KB"

[paste]
default_sunset = "1h"
"#
        )?;
        env::set_var(format!("{ENV_PREFIX}__SERVER__WORKERS"), "3");
        let config = Config::parse(file.path())?;
        env::remove_var(format!("{ENV_PREFIX}__SERVER__WORKERS"));

        assert_eq!("127.0.0.1:8000", config.server.address);
        assert_eq!(Some(3), config.server.workers);
        assert_eq!(1000, config.server.content_limit());
        assert_eq!(
            Some(Duration::from_secs(3600)),
            config.paste.default_sunset
        );
        assert_eq!(DEFAULT_STYLE, config.highlight.default_style);
        Ok(())
    }

    #[test]
    fn test_default_limit() -> Result<(), Box<dyn Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[server]\naddress = \"0.0.0.0:80\"")?;
        let config = Config::parse(file.path())?;
        assert_eq!(10_000_000, config.server.content_limit());
        assert_eq!(None, config.paste.default_sunset);
        Ok(())
    }
}
