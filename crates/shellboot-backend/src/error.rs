use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("{tool} not found")]
    NotFound { tool: &'static str },

    #[error("{source_name} is unavailable: {details}")]
    Unavailable {
        source_name: &'static str,
        details: String,
    },

    #[error("Command failed: {stderr}")]
    CommandFailed { stderr: String },

    #[error("Failed to parse {context}: {details}")]
    ParseError {
        context: &'static str,
        details: String,
    },

    #[error("Installation of {identifier} failed: {details}")]
    InstallFailed { identifier: String, details: String },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl SourceError {
    pub fn unavailable(source_name: &'static str, details: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name,
            details: details.into(),
        }
    }

    pub fn parse(context: &'static str, details: impl Into<String>) -> Self {
        Self::ParseError {
            context,
            details: details.into(),
        }
    }

    pub fn install_failed(identifier: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InstallFailed {
            identifier: identifier.into(),
            details: details.into(),
        }
    }

    /// Whether the error concerns the whole source rather than one target.
    /// A checker stops querying a source once it sees one of these.
    #[must_use]
    pub fn is_source_level(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Unavailable { .. })
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SourceError;

    #[test]
    fn io_error_conversion_maps_to_io_variant() {
        let mapped = SourceError::from(std::io::Error::other("permission denied"));
        assert!(
            matches!(mapped, SourceError::IoError { kind, ref message } if kind == std::io::ErrorKind::Other && message.contains("permission denied"))
        );
    }

    #[test]
    fn command_failed_display_includes_stderr() {
        let error = SourceError::CommandFailed {
            stderr: "winget: command not found".to_string(),
        };

        assert_eq!(error.to_string(), "Command failed: winget: command not found");
    }

    #[test]
    fn install_failure_names_the_module() {
        let error = SourceError::install_failed("Terminal-Icons", "access denied");

        assert_eq!(
            error.to_string(),
            "Installation of Terminal-Icons failed: access denied"
        );
    }

    #[test]
    fn only_missing_or_unavailable_sources_are_source_level() {
        assert!(SourceError::NotFound { tool: "winget" }.is_source_level());
        assert!(SourceError::unavailable("PSGallery", "offline").is_source_level());
        assert!(!SourceError::parse("module version", "empty").is_source_level());
        assert!(!SourceError::install_failed("Pester", "denied").is_source_level());
        assert!(
            !SourceError::CommandFailed {
                stderr: "exit 1".to_string()
            }
            .is_source_level()
        );
    }
}
