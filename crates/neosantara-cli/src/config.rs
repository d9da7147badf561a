//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for neosantara
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosted Postgres project
    pub supabase: SupabaseConfig,
    /// Reconciliation defaults
    pub reconcile: ReconcileConfig,
    /// Include tool invocations when printing messages
    pub show_tool_invocations: bool,
}

/// Connection settings for the hosted store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// Reconciliation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Derive artifact document ids from their content instead of randomizing
    pub derived_ids: bool,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neosantara")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NEOSANTARA_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        Config::default().save()?;
        Ok(path)
    }

    /// Store URL, preferring `SUPABASE_URL` over the file
    pub fn supabase_url(&self) -> Option<String> {
        std::env::var("SUPABASE_URL")
            .ok()
            .or_else(|| self.supabase.url.clone())
            .filter(|u| !u.is_empty())
    }

    /// Store API key, preferring `SUPABASE_ANON_KEY` over the file
    pub fn supabase_key(&self) -> Option<String> {
        std::env::var("SUPABASE_ANON_KEY")
            .ok()
            .or_else(|| self.supabase.anon_key.clone())
            .filter(|k| !k.is_empty())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# neosantara configuration file
# Place at ~/.config/neosantara/config.toml (Linux) or set NEOSANTARA_CONFIG_PATH

# Print tool invocations along with text, reasoning and code
show_tool_invocations = false

[supabase]
# Project URL and anon key (SUPABASE_URL / SUPABASE_ANON_KEY take precedence)
# url = "https://your-project.supabase.co"
# anon_key = "eyJ..."

[reconcile]
# Derive code artifact ids from their content so repeated runs agree
derived_ids = false
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert!(!config.show_tool_invocations);
        assert!(!config.reconcile.derived_ids);
        assert!(config.supabase.url.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[reconcile]\nderived_ids = true\n").unwrap();
        assert!(config.reconcile.derived_ids);
        assert!(config.supabase.anon_key.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(Config::parse("show_tool_invocations = \"yes\"").is_err());
    }
}
