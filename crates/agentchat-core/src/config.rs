use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::Agent;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 240;
pub const BASE_URL_ENV: &str = "AGENTCHAT_BASE_URL";

/// On-disk configuration. Every field is optional; missing ones fall back to
/// the defaults when resolved.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub default_agent: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line, highest precedence
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings the client runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub default_agent: Agent,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("agentchat").join("config.json"))
    }

    /// Merge flags, environment and file into [`Settings`].
    ///
    /// An agent name that matches no known agent falls back to the default
    /// agent with a warning.
    pub fn resolve(&self, overrides: &Overrides, env_base_url: Option<String>) -> Settings {
        let base_url = overrides
            .base_url
            .clone()
            .or(env_base_url.filter(|url| !url.trim().is_empty()))
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let default_agent = match overrides.agent.as_deref().or(self.default_agent.as_deref()) {
            Some(name) => name.parse::<Agent>().unwrap_or_else(|e| {
                tracing::warn!("{}, using {}", e, Agent::default().as_str());
                Agent::default()
            }),
            None => Agent::default(),
        };

        let timeout_secs = overrides
            .timeout_secs
            .or(self.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Settings {
            base_url,
            default_agent,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());

        let settings = config.resolve(&Overrides::default(), None);
        assert_eq!(settings.base_url, "http://localhost:8000");
        assert_eq!(settings.default_agent, Agent::AgentFramework);
        assert_eq!(settings.request_timeout, Duration::from_secs(240));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_url": "http://agents:9000", "default_agent": "CodingWizard"}}"#).unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://agents:9000"));
        assert_eq!(config.request_timeout_secs, None);

        let settings = config.resolve(&Overrides::default(), None);
        assert_eq!(settings.default_agent, Agent::CodingWizard);
        assert_eq!(settings.request_timeout, Duration::from_secs(240));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_precedence_flags_env_file() {
        let config = Config {
            base_url: Some("http://file:1".to_string()),
            default_agent: Some("research_agent".to_string()),
            request_timeout_secs: Some(30),
        };

        let from_env = config.resolve(&Overrides::default(), Some("http://env:2".to_string()));
        assert_eq!(from_env.base_url, "http://env:2");
        assert_eq!(from_env.default_agent, Agent::ResearchAgent);
        assert_eq!(from_env.request_timeout, Duration::from_secs(30));

        let overrides = Overrides {
            base_url: Some("http://flag:3".to_string()),
            agent: Some("no_tools_agent".to_string()),
            timeout_secs: Some(5),
        };
        let from_flags = config.resolve(&overrides, Some("http://env:2".to_string()));
        assert_eq!(from_flags.base_url, "http://flag:3");
        assert_eq!(from_flags.default_agent, Agent::NoToolsAgent);
        assert_eq!(from_flags.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_agent_falls_back() {
        let config = Config {
            default_agent: Some("mystery".to_string()),
            ..Default::default()
        };
        let settings = config.resolve(&Overrides::default(), Some(String::new()));
        assert_eq!(settings.default_agent, Agent::AgentFramework);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }
}
