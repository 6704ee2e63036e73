use crate::models::config::TrackerConfig;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "sr-tracker";
const CONFIG_FILE: &str = "config.json";
const OVERLAY_FILE: &str = "sr.txt";

/// Loads and saves the tracker configuration as JSON
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use the platform config directory (`<config_dir>/sr-tracker`)
    pub fn new() -> Result<Self, String> {
        let config_dir = dirs::config_dir()
            .ok_or("Failed to determine config directory")?
            .join(APP_DIR);

        fs::create_dir_all(&config_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        Ok(Self::with_dir(config_dir))
    }

    /// Use an explicit directory; created lazily on save
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let config_path = config_dir.join(CONFIG_FILE);
        Self {
            config_dir,
            config_path,
        }
    }

    pub fn save(&self, config: &TrackerConfig) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_path, json)
            .map_err(|e| format!("Failed to write config file: {}", e))
    }

    /// Load configuration, or defaults if the file does not exist yet
    pub fn load(&self) -> Result<TrackerConfig, String> {
        if !self.config_exists() {
            return Ok(TrackerConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Where the overlay label goes when the config names no file
    pub fn default_overlay_path(&self) -> PathBuf {
        self.config_dir.join(OVERLAY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;

    fn create_test_manager() -> ConfigManager {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir =
            std::env::temp_dir().join(format!("sr-tracker-test-{}-{}", std::process::id(), id));
        let _ = fs::remove_dir_all(&temp_dir);

        ConfigManager::with_dir(temp_dir)
    }

    fn cleanup_test_files(manager: &ConfigManager) {
        let _ = fs::remove_dir_all(&manager.config_dir);
    }

    #[test]
    fn test_load_default_when_not_exists() {
        let manager = create_test_manager();
        assert!(!manager.config_exists());

        let config = manager.load().expect("load should return defaults");
        assert_eq!(config, TrackerConfig::default());

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_save_and_load() {
        let manager = create_test_manager();

        let mut config = TrackerConfig::default();
        config.target = "Game Capture".to_string();
        config.region = Region::new(860, 40, 200, 60);
        config.capture_interval = 5.0;
        config.api_url = "https://example.com/api/sr".to_string();
        config.api_key = "secret".to_string();
        config.manual_sr = 2200;

        manager.save(&config).expect("save should succeed");
        assert!(manager.config_exists());

        let loaded = manager.load().expect("load should succeed");
        assert_eq!(loaded, config);

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_save_overwrites() {
        let manager = create_test_manager();

        let mut config = TrackerConfig::default();
        config.manual_sr = 1000;
        manager.save(&config).unwrap();
        config.manual_sr = 0;
        manager.save(&config).unwrap();

        assert_eq!(manager.load().unwrap().manual_sr, 0);

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let manager = create_test_manager();
        fs::create_dir_all(&manager.config_dir).unwrap();
        fs::write(manager.config_file_path(), "{ not json").unwrap();

        let err = manager.load().unwrap_err();
        assert!(err.starts_with("Failed to parse config file"), "{}", err);

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_paths() {
        let manager = create_test_manager();
        assert!(manager.config_file_path().ends_with("config.json"));
        assert!(manager.default_overlay_path().ends_with("sr.txt"));
    }
}
