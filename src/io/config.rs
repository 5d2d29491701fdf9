use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// User configuration, merged from `./.mdtask.yml` and then
/// `~/.config/mdtask/config.yml`. A missing or unreadable config file is
/// silently replaced by defaults so the tool works out of the box.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discovery: Discovery,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Discovery {
    pub enabled: bool,
    /// Path template for branch-based file discovery. `{branch}` is
    /// replaced with the current git branch name.
    pub template: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            discovery: Discovery::default(),
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Discovery {
            enabled: true,
            template: "specs/{branch}/tasks.md".to_string(),
        }
    }
}

/// Load configuration from the first config file that parses, preferring
/// the project-local one.
pub fn load_config() -> Config {
    for path in config_paths() {
        if let Ok(text) = fs::read_to_string(&path) {
            if let Ok(config) = serde_yaml::from_str(&text) {
                return config;
            }
        }
    }
    Config::default()
}

fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".mdtask.yml")];
    if let Some(home) = std::env::home_dir() {
        paths.push(home.join(".config/mdtask/config.yml"));
    }
    paths
}
