use anyhow::Result;
use lifeline::impl_storage_clone;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    time::Duration,
};

/// User-facing config for the shell, stored at `~/.tabnav/tabnav.yml`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tabs: TabsConfig,

    #[serde(default)]
    pub autosave: AutosaveConfig,

    /// Urls under `<scheme>://` carry their logical path directly
    #[serde(default = "default_internal_scheme")]
    pub internal_scheme: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tabs: TabsConfig::default(),
            autosave: AutosaveConfig::default(),
            internal_scheme: default_internal_scheme(),
        }
    }
}

impl_storage_clone!(Config);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TabsConfig {
    /// When disabled, only the first saved tab is restored
    #[serde(default = "default_tabs_enabled")]
    pub enabled: bool,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            enabled: default_tabs_enabled(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AutosaveConfig {
    /// How long tab changes must be quiet before the snapshot is written
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
}

impl AutosaveConfig {
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_ms)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_threshold_ms(),
        }
    }
}

fn default_tabs_enabled() -> bool {
    true
}

fn default_threshold_ms() -> u64 {
    10 * 1000
}

fn default_internal_scheme() -> String {
    "itch".to_string()
}

pub fn dotdir_path() -> Result<PathBuf> {
    let mut dir = dirs::home_dir().ok_or_else(|| anyhow::Error::msg("home_dir not found"))?;

    dir.push(".tabnav");

    Ok(dir)
}

pub fn mkdir() -> Result<()> {
    let path = dotdir_path()?;
    std::fs::create_dir_all(path)?;
    Ok(())
}

pub fn config_path() -> Result<PathBuf> {
    let mut path = dotdir_path()?;
    path.push("tabnav.yml");
    Ok(path)
}

pub fn log_path() -> Result<PathBuf> {
    let mut path = dotdir_path()?;
    path.push("tabnav.log");
    Ok(path)
}

/// The directory holding one profile data file per profile
pub fn profiles_dir() -> Result<PathBuf> {
    let mut path = dotdir_path()?;
    path.push("profiles");
    Ok(path)
}

pub fn load_config() -> anyhow::Result<Config> {
    let path = config_path()?;
    load_config_from(path.as_path())
}

/// Loads the config at the path, writing the defaults if the file does not exist
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.is_file() {
        let config = Config::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_config(path, &config)?;

        return Ok(config);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_yaml::from_reader(reader)?;

    Ok(config)
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_yaml::to_writer(writer, config)?;
    Ok(())
}
