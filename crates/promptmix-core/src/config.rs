use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::concepts::{ConceptsStore, DEFAULT_ENABLED_CATEGORIES};
use crate::error::{PromptMixError, Result};
use crate::phrase::PhraseSettings;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_BASE_DIR: &str = ".promptmix";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# promptmix configuration file
# Location: ~/.promptmix/config.toml

[concepts]
# Directory holding the concept lists (relative paths resolve from this file's directory)
# Default: "concepts"
dir = "concepts"

# Categories whose files are sampled
# Available: "SFW", "NSFW", "NSFL", "Art Styles"
categories = ["SFW", "Art Styles"]

[phrases]
# Chance that a random phrase ends after each word on the first pass
first_pass_close_probability = 0.25

# Same chance while replacing phrases suppressed by the blacklist
retry_close_probability = 0.75

# Total passes including the first
max_attempts = 10
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub concepts: ConceptsConfig,

    #[serde(default)]
    pub phrases: PhraseSettings,
}

/// Concept list configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptsConfig {
    /// Concepts directory
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Enabled categories
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_dir() -> PathBuf {
    PathBuf::from("concepts")
}

fn default_categories() -> Vec<String> {
    DEFAULT_ENABLED_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ConceptsConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            categories: default_categories(),
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| PromptMixError::ConfigParse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| PromptMixError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// `~/.promptmix`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_BASE_DIR))
            .ok_or(PromptMixError::HomeNotFound)
    }

    /// Concepts directory, resolved against `base_dir` when relative
    pub fn concepts_dir(&self, base_dir: &Path) -> PathBuf {
        if self.concepts.dir.is_absolute() {
            self.concepts.dir.clone()
        } else {
            base_dir.join(&self.concepts.dir)
        }
    }

    pub fn phrase_settings(&self) -> PhraseSettings {
        self.phrases
    }

    /// Open the concepts store with the configured categories
    pub fn open_store(&self, base_dir: &Path) -> Result<ConceptsStore> {
        ConceptsStore::new(self.concepts_dir(base_dir))?.with_categories(&self.concepts.categories)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "concepts.dir" => {
                let dir = value.trim();
                if dir.is_empty() {
                    return Err(invalid(key, "directory must not be empty"));
                }
                self.concepts.dir = PathBuf::from(dir);
            }
            "concepts.categories" => {
                let categories = parse_string_list(value)?;
                if let Some(unknown) = categories
                    .iter()
                    .find(|c| crate::concepts::find_category(c).is_none())
                {
                    return Err(PromptMixError::UnknownCategory {
                        name: unknown.clone(),
                    });
                }
                self.concepts.categories = categories;
            }
            "phrases.first_pass_close_probability" => {
                self.phrases.first_pass_close_probability = parse_probability(key, value)?;
            }
            "phrases.retry_close_probability" => {
                self.phrases.retry_close_probability = parse_probability(key, value)?;
            }
            "phrases.max_attempts" => {
                let attempts: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(key, "expected a positive integer"))?;
                if attempts == 0 {
                    return Err(invalid(key, "must be at least 1"));
                }
                self.phrases.max_attempts = attempts;
            }
            _ => {
                return Err(PromptMixError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "concepts.dir".to_string(),
                self.concepts.dir.display().to_string(),
            ),
            (
                "concepts.categories".to_string(),
                format!("{:?}", self.concepts.categories),
            ),
            (
                "phrases.first_pass_close_probability".to_string(),
                self.phrases.first_pass_close_probability.to_string(),
            ),
            (
                "phrases.retry_close_probability".to_string(),
                self.phrases.retry_close_probability.to_string(),
            ),
            (
                "phrases.max_attempts".to_string(),
                self.phrases.max_attempts.to_string(),
            ),
        ]
    }
}

fn invalid(key: &str, message: &str) -> PromptMixError {
    PromptMixError::ConfigValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_probability(key: &str, value: &str) -> Result<f64> {
    let p: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid(key, "expected a number"))?;
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(key, "must be between 0 and 1"));
    }
    Ok(p)
}

/// Parse a comma-separated or JSON-like list string
fn parse_string_list(value: &str) -> Result<Vec<String>> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    Ok(inner
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_string_list() {
        assert_eq!(parse_string_list("SFW,NSFW").unwrap(), vec!["SFW", "NSFW"]);
        assert_eq!(
            parse_string_list(r#"["SFW", "Art Styles"]"#).unwrap(),
            vec!["SFW", "Art Styles"]
        );
        assert!(parse_string_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_config_get_set() {
        let mut config = Config::default();

        config.set("concepts.categories", "SFW, NSFW").unwrap();
        assert_eq!(config.concepts.categories, vec!["SFW", "NSFW"]);
        assert!(config.get("concepts.categories").unwrap().contains("NSFW"));

        config.set("phrases.max_attempts", "3").unwrap();
        assert_eq!(config.get("phrases.max_attempts").as_deref(), Some("3"));
        assert!(config.get("phrases.unknown").is_none());
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        let err = config
            .set("phrases.retry_close_probability", "1.5")
            .unwrap_err();
        assert!(matches!(err, PromptMixError::ConfigValue { .. }));
        assert!(config.set("phrases.max_attempts", "0").is_err());
        assert!(config.set("phrases.max_attempts", "many").is_err());
        assert!(matches!(
            config.set("concepts.categories", "SFW,Gore").unwrap_err(),
            PromptMixError::UnknownCategory { .. }
        ));
        assert!(matches!(
            config.set("nope", "1").unwrap_err(),
            PromptMixError::ConfigKeyNotFound { .. }
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_template_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_init_save_load() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap(), Config::default());

        let path = Config::init(tmp.path()).unwrap();
        assert!(path.exists());

        let mut config = Config::load(tmp.path()).unwrap();
        config.set("phrases.first_pass_close_probability", "0.5").unwrap();
        config.save(tmp.path()).unwrap();

        let reloaded = Config::load(tmp.path()).unwrap();
        assert_eq!(reloaded.phrases.first_pass_close_probability, 0.5);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[phrases\n").unwrap();
        let err = Config::load(tmp.path()).unwrap_err();
        assert!(matches!(err, PromptMixError::ConfigParse { .. }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_open_store_uses_configured_categories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("concepts")).unwrap();

        let mut config = Config::default();
        config.set("concepts.categories", "NSFW").unwrap();
        let store = config.open_store(tmp.path()).unwrap();
        assert_eq!(store.enabled_categories(), &["NSFW"]);
        assert_eq!(store.concepts_dir(), tmp.path().join("concepts"));
    }
}
