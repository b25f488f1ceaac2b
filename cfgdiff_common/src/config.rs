use crate::{AppConfig, CfgDiffError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "cfgdiff.toml";

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "CFGDIFF_CONFIG";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

/// Load `cfgdiff.toml` from the first location that applies: `CFGDIFF_CONFIG`,
/// next to the executable, then the platform config directory
pub fn load_config() -> Result<LoadedConfig, CfgDiffError> {
    let (path, portable) = resolve_config_path()?;
    load_config_from(&path, portable)
}

/// A missing file yields the defaults
pub fn load_config_from(path: &Path, portable: bool) -> Result<LoadedConfig, CfgDiffError> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| CfgDiffError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
        portable,
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), CfgDiffError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| CfgDiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path() -> Result<(PathBuf, bool), CfgDiffError> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok((PathBuf::from(explicit), false));
    }

    if let Some(portable_path) = portable_config_path() {
        if portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "cfgdiff", "cfgdiff")
        .ok_or_else(|| CfgDiffError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
