use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

pub fn get_file_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|os_str| os_str.to_str())
}

/// Text formats used for configuration and exported results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> FileFormatResult<Self> {
        let ext = get_file_extension(path).ok_or(FileExtensionError::MissingFileExtension)?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FileExtensionError::UnsupportedFileExtension(
                path.display().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_case_insensitively() {
        assert_eq!(
            FileFormat::from_path(Path::new("cfg.YML")).unwrap(),
            FileFormat::Yaml
        );
        assert_eq!(
            FileFormat::from_path(Path::new("dir/cfg.json")).unwrap(),
            FileFormat::Json
        );
    }

    #[test]
    fn rejects_missing_and_unknown_extensions() {
        assert!(matches!(
            FileFormat::from_path(Path::new("settings")),
            Err(FileExtensionError::MissingFileExtension)
        ));
        assert!(matches!(
            FileFormat::from_path(Path::new("settings.toml")),
            Err(FileExtensionError::UnsupportedFileExtension(_))
        ));
    }
}
