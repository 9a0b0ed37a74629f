// File: ./src/config.rs
// Handles settings loading and defaults.
use anyhow::{Context, Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";

fn default_global_filter() -> String {
    String::new()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Only checkbox lines containing this token are tasks. Empty accepts all.
    #[serde(default = "default_global_filter")]
    pub global_filter: String,

    /// Hide the global filter token when rendering descriptions.
    #[serde(default)]
    pub remove_global_filter: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_filter: default_global_filter(),
            remove_global_filter: false,
        }
    }
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load settings from `path`. Returns a contextualized error if reading
    /// or parsing fails.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    /// `$MDTASKS_CONFIG_DIR/config.toml` when set, else the platform config dir.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(dir) = env::var("MDTASKS_CONFIG_DIR") {
            return Ok(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }
        let proj = ProjectDirs::from("org", "mdtasks", "mdtasks")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(proj.config_dir().join(CONFIG_FILE_NAME))
    }

    /// An explicit path must exist. Without one, a missing file at the
    /// default location falls back to defaults; broken files are still errors.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Self::default_path()?;
        match Self::load(&path) {
            Ok(settings) => Ok(settings),
            Err(e) if Self::is_missing_config_error(&e) => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `err` means the config file does not exist, either through our
    /// own not-found message or an IO NotFound anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }
}
