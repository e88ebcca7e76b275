use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Where the daemon and its clients find their files.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_dir: PathBuf,
}

impl Paths {
    pub fn from_config_dir<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        if config_dir.is_file() {
            bail!("Please provide the path to the config directory, not a file within it")
        }

        if !config_dir.exists() {
            bail!("Configuration directory {} does not exist", config_dir.display());
        }

        Ok(Paths { config_dir: config_dir.canonicalize()? })
    }

    pub fn default() -> Result<Self> {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
            .context("Neither XDG_CONFIG_HOME nor HOME is set")?
            .join("notification-icons");

        if !config_dir.exists() {
            log::info!("Creating config dir {}", config_dir.display());
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;
        }

        Self::from_config_dir(config_dir)
    }

    pub fn get_config_dir(&self) -> &Path {
        self.config_dir.as_path()
    }

    pub fn get_preferences_file(&self) -> PathBuf {
        self.config_dir.join("preferences.json")
    }
}

impl std::fmt::Display for Paths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config-dir: {}, preferences: {}", self.config_dir.display(), self.get_preferences_file().display())
    }
}
