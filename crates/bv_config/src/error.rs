//! Error types for configuration loading and entry-point parsing.

/// Errors that can occur when loading a `bv.toml` project descriptor or
/// parsing an entry-point specification string.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// An entry-point specification string (`name(args...)`) was malformed.
    #[error("malformed entry-point specification '{0}': {1}")]
    BadEntryPoint(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.entry".to_string());
        assert_eq!(format!("{err}"), "missing required field: project.entry");
    }

    #[test]
    fn display_bad_entry_point() {
        let err = ConfigError::BadEntryPoint("top(".to_string(), "unbalanced parentheses".to_string());
        assert_eq!(
            format!("{err}"),
            "malformed entry-point specification 'top(': unbalanced parentheses"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read configuration:"));
    }
}
