use crate::CheckOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = ".rulechk.toml";

#[derive(Debug, Clone)]
pub struct Config {
    /// Remote rule database, tried before `rules_path`.
    pub rules_url: Option<String>,
    pub rules_path: Option<PathBuf>,
    pub enabled_categories: Vec<String>,
    pub ignore_case: bool,
    /// Reserved; carried into `CheckOptions` but has no effect yet.
    pub strict_mode: bool,
    pub fetch_timeout_secs: u64,
}

/// One configuration file. Keys it leaves out keep the value of the layer below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub rules_url: Option<String>,
    pub rules_path: Option<PathBuf>,
    pub enabled_categories: Option<Vec<String>>,
    pub ignore_case: Option<bool>,
    pub strict_mode: Option<bool>,
    pub fetch_timeout_secs: Option<u64>,
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_url: None,
            rules_path: None,
            enabled_categories: Vec::new(),
            ignore_case: false,
            strict_mode: false,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Values given on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rules_url: Option<String>,
    pub rules_path: Option<PathBuf>,
    pub categories: Vec<String>,
    pub ignore_case: bool,
    pub strict_mode: bool,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        if overrides.rules_url.is_some() {
            config.rules_url = overrides.rules_url;
        }
        if overrides.rules_path.is_some() {
            config.rules_path = overrides.rules_path;
        }
        if !overrides.categories.is_empty() {
            config.enabled_categories = overrides.categories;
        }
        config.ignore_case |= overrides.ignore_case;
        config.strict_mode |= overrides.strict_mode;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<ConfigFile> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if file.rules_url.is_some() {
            self.rules_url = file.rules_url;
        }
        if file.rules_path.is_some() {
            self.rules_path = file.rules_path;
        }
        if let Some(categories) = file.enabled_categories {
            self.enabled_categories = categories;
        }
        if let Some(ignore_case) = file.ignore_case {
            self.ignore_case = ignore_case;
        }
        if let Some(strict_mode) = file.strict_mode {
            self.strict_mode = strict_mode;
        }
        if let Some(secs) = file.fetch_timeout_secs {
            self.fetch_timeout_secs = secs;
        }
        self
    }

    pub fn check_options(&self) -> CheckOptions {
        CheckOptions::default()
            .with_categories(self.enabled_categories.iter().cloned())
            .ignore_case(self.ignore_case)
            .strict_mode(self.strict_mode)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rulechk").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rulechk").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Where `rules update` stores the downloaded database.
    pub fn downloaded_rules_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("rules.json"))
    }
}
