//! Config sources
//!
//! A config is either one JSON file holding every environment, or a directory
//! with one JSON file per environment (`production.json`, `staging.json`).
//! Both return the raw value; [`crate::validate_config`] checks it.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const JSON_EXTENSION: &str = ".json";

/// Read and parse a single JSON file.
pub fn read_config_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| Error::InvalidConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a directory of JSON files into a mapping of file stem to content.
///
/// Every entry must be a `.json` file with a UTF-8 name. Files are read in
/// name order, which becomes the environment order of the config.
pub fn read_config_dir(path: &Path) -> Result<Value> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| Error::io(path, e))? {
        let entry = entry.map_err(|e| Error::io(path, e))?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| Error::InvalidConfigDir {
                path: path.to_path_buf(),
                entry: name.to_string_lossy().into_owned(),
            })?;
        names.push(name);
    }
    names.sort();

    let mut environments = Map::new();
    for name in names {
        let Some(env_name) = name.strip_suffix(JSON_EXTENSION) else {
            return Err(Error::InvalidConfigDir {
                path: path.to_path_buf(),
                entry: name,
            });
        };
        let value = read_config_file(&path.join(&name))?;
        log::debug!("Read environment {env_name} from {name}");
        environments.insert(env_name.to_string(), value);
    }

    Ok(Value::Object(environments))
}
