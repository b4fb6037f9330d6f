use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::data::model::Field;
use crate::data::schema::ColumnMapping;

/// Startup configuration: where the dataset lives and how its headers map
/// onto record fields.
///
/// ```toml
/// data_path = "C:/Users/me/Documents/JGP.xlsx"
///
/// [columns]
/// national_id = "WHAT IS YOUR NATIONAL ID?"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    for field in Field::ALL {
        if config.columns.header(field).trim().is_empty() {
            bail!("columns.{} must not be blank", field.key());
        }
    }

    // Relative data paths are relative to the config file, not the cwd.
    if let (Some(data), Some(dir)) = (config.data_path.as_mut(), path.parent()) {
        if data.is_relative() {
            *data = dir.join(&*data);
        }
    }

    Ok(config)
}

/// Combine the optional config file with a command-line / environment
/// override of the data path. The override wins.
pub fn resolve(config_path: Option<&Path>, data_override: Option<PathBuf>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if data_override.is_some() {
        config.data_path = data_override;
    }
    Ok(config)
}
