use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::file_format::FileFormat;

pub type Result<T> = anyhow::Result<T>;

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> Result<String> {
    let mut text = match format {
        FileFormat::Yaml => serde_yml::to_string(value)?,
        FileFormat::Json => serde_json::to_string_pretty(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

pub fn deserialize<T: DeserializeOwned + 'static>(serialized: &str, format: FileFormat) -> Result<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        FileFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

/// Reads `path` and deserializes it in the format implied by its extension.
pub fn read_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T> {
    let format = FileFormat::from_path(path)?;
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    deserialize(&text, format).with_context(|| format!("parsing {}", path.display()))
}

/// Serializes `value` in the format implied by the extension of `path`.
pub fn write_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    let text = serialize(value, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
