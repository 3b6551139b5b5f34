use std::{fs, path::PathBuf};

use mantaray::reference::{ENCRYPTED_REFERENCE_SIZE, REFERENCE_SIZE};
use mantaray::store::{FsStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

pub const APP_NAME: &str = "mantaray";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Size of the references handed out by the blob store (32 or 64)
    #[serde(default = "default_reference_size")]
    pub reference_size: usize,
    /// Give new manifests a random obfuscation key
    #[serde(default)]
    pub obfuscate: bool,
    /// Default log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_reference_size() -> usize {
    REFERENCE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reference_size: default_reference_size(),
            obfuscate: false,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    fn validate(&self) -> Result<(), StateError> {
        if self.reference_size != REFERENCE_SIZE && self.reference_size != ENCRYPTED_REFERENCE_SIZE
        {
            return Err(StateError::InvalidConfig(format!(
                "reference_size must be 32 or 64, got {}",
                self.reference_size
            )));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, StateError> {
        self.log_level
            .parse()
            .map_err(|_| StateError::InvalidConfig(format!("invalid log_level '{}'", self.log_level)))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.mantaray)
    pub mantaray_dir: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.mantaray)
    pub fn mantaray_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let mantaray_dir = Self::mantaray_dir(custom_path)?;

        if mantaray_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let config = config.unwrap_or_default();
        config.validate()?;

        let blobs_path = mantaray_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        let config_path = mantaray_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            mantaray_dir,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let mantaray_dir = Self::mantaray_dir(custom_path)?;

        if !mantaray_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let blobs_path = mantaray_dir.join(BLOBS_DIR_NAME);
        let config_path = mantaray_dir.join(CONFIG_FILE_NAME);

        if !blobs_path.exists() {
            return Err(StateError::MissingFile("blobs/".to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile("config.toml".to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        config.validate()?;

        Ok(Self {
            mantaray_dir,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Open the blob store manifests and payloads are kept in
    pub async fn store(&self) -> Result<FsStore, StoreError> {
        FsStore::with_reference_size(&self.blobs_path, self.config.reference_size).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("mantaray directory not initialized. Run 'mantaray init' first")]
    NotInitialized,

    #[error("mantaray directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_init_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");

        let config = AppConfig {
            reference_size: 64,
            obfuscate: true,
            log_level: "debug".to_string(),
        };
        let state = AppState::init(Some(path.clone()), Some(config.clone())).unwrap();
        assert!(state.blobs_path.is_dir());
        assert!(state.config_path.is_file());

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.blobs_path, state.blobs_path);
    }

    #[test]
    fn test_init_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = Some(dir.path().to_path_buf());
        AppState::init(path.clone(), None).unwrap();
        assert!(matches!(
            AppState::init(path, None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
        // directory exists but was never initialised
        assert!(matches!(
            AppState::load(Some(dir.path().to_path_buf())),
            Err(StateError::MissingFile(_))
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.reference_size, 32);
        assert!(!config.obfuscate);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::INFO);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            reference_size: 48,
            ..Default::default()
        };
        assert!(matches!(
            AppState::init(Some(dir.path().to_path_buf()), Some(config)),
            Err(StateError::InvalidConfig(_))
        ));

        let config = AppConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            AppState::init(Some(dir.path().to_path_buf()), Some(config)),
            Err(StateError::InvalidConfig(_))
        ));
    }
}
