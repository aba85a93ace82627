use crate::core::error::{Result, TchatError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoChat {
    On,
    #[default]
    Off,
}

impl AutoChat {
    pub fn toggled(self) -> Self {
        match self {
            AutoChat::On => AutoChat::Off,
            AutoChat::Off => AutoChat::On,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_in_chat: Option<AutoChat>,
}

impl Config {
    pub fn new(api_link: impl Into<String>) -> Self {
        Self {
            api_link: api_link.into(),
            ..Default::default()
        }
    }

    pub fn auto_chat(&self) -> AutoChat {
        self.auto_in_chat.unwrap_or_default()
    }

    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tchat")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    pub fn history_path() -> PathBuf {
        Self::config_dir().join("input_history.txt")
    }
}

/// Reads and writes the single JSON config document.
///
/// Every write replaces the whole file; there is no partial update.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absent, unparsable and blank-apiLink files all report `ConfigNotFound`
    /// so the caller can fall back to first-run setup.
    pub fn load(&self) -> Result<Config> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config file");
                return Err(TchatError::ConfigNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let config = serde_json::from_str::<Config>(&contents).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unparsable config");
            TchatError::ConfigNotFound
        })?;
        if config.api_link.trim().is_empty() {
            warn!(path = %self.path.display(), "ignoring config with a blank apiLink");
            return Err(TchatError::ConfigNotFound);
        }
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string(config)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Read-merge-write. A missing config starts out empty and is only
    /// saved once `f` sets an api link.
    pub fn update<F>(&self, f: F) -> Result<Config>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = match self.load() {
            Ok(config) => config,
            Err(TchatError::ConfigNotFound) => Config::new(""),
            Err(e) => return Err(e),
        };
        f(&mut config);
        if config.api_link.trim().is_empty() {
            return Err(TchatError::Config("apiLink is not set".to_string()));
        }
        self.save(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.json"))
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            store(&dir).load(),
            Err(TchatError::ConfigNotFound)
        ));
    }

    #[test]
    fn garbage_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(TchatError::ConfigNotFound)));
    }

    #[test]
    fn file_without_api_link_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), r#"{"model":"llama3"}"#).unwrap();
        assert!(matches!(store.load(), Err(TchatError::ConfigNotFound)));
    }

    #[test]
    fn blank_api_link_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), r#"{"apiLink":"   ","autoInChat":"on"}"#).unwrap();
        assert!(matches!(store.load(), Err(TchatError::ConfigNotFound)));
    }

    #[test]
    fn update_repairs_blank_api_link() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), r#"{"apiLink":"","model":"llama3"}"#).unwrap();

        let updated = store
            .update(|c| c.api_link = "http://h:1".to_string())
            .unwrap();
        assert_eq!(updated.api_link, "http://h:1");
        assert_eq!(store.load().unwrap(), updated);
    }

    #[test]
    fn reads_camel_case_document() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(
            store.path(),
            r#"{"apiLink":"http://localhost:11434","model":"mistral","systemPrompt":"be brief","autoInChat":"on"}"#,
        )
        .unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.api_link, "http://localhost:11434");
        assert_eq!(config.model.as_deref(), Some("mistral"));
        assert_eq!(config.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(config.auto_chat(), AutoChat::On);
    }

    #[test]
    fn save_omits_absent_fields() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Config::new("http://localhost:11434")).unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"apiLink":"http://localhost:11434"}"#);
    }

    #[test]
    fn save_of_load_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(
            store.path(),
            r#"{"apiLink":"http://h:1","model":"m","systemPrompt":"","autoInChat":"off"}"#,
        )
        .unwrap();

        store.save(&store.load().unwrap()).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.save(&store.load().unwrap()).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.json"));
        store.save(&Config::new("http://h:1")).unwrap();
        assert_eq!(store.load().unwrap().api_link, "http://h:1");
    }

    #[test]
    fn update_merges_into_existing_fields() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut config = Config::new("http://old:1");
        config.model = Some("llama3".to_string());
        config.auto_in_chat = Some(AutoChat::On);
        store.save(&config).unwrap();

        let updated = store
            .update(|c| c.api_link = "http://new:2".to_string())
            .unwrap();
        assert_eq!(updated.api_link, "http://new:2");
        assert_eq!(updated.model.as_deref(), Some("llama3"));
        assert_eq!(store.load().unwrap(), updated);
    }

    #[test]
    fn update_without_api_link_on_first_run_fails() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let err = store
            .update(|c| c.model = Some("x".to_string()))
            .unwrap_err();
        assert!(matches!(err, TchatError::Config(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn toggling_auto_chat() {
        assert_eq!(AutoChat::Off.toggled(), AutoChat::On);
        assert_eq!(AutoChat::On.toggled(), AutoChat::Off);
        assert_eq!(Config::new("x").auto_chat(), AutoChat::Off);
    }
}
