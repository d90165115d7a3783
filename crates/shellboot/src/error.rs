use shellboot_backend::SourceError;
use shellboot_core::{GateError, TimedOut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    TimedOut(#[from] TimedOut),

    #[error("{operation} failed: {source}")]
    Source {
        operation: &'static str,
        #[source]
        source: SourceError,
    },
}

impl AppError {
    pub fn source_failed(operation: &'static str, source: SourceError) -> Self {
        Self::Source { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use shellboot_backend::SourceError;
    use shellboot_core::TimedOut;

    use super::AppError;

    #[test]
    fn source_constructor_includes_operation() {
        let error = AppError::source_failed(
            "Installing PSReadLine",
            SourceError::install_failed("PSReadLine", "access denied"),
        );

        assert!(error.to_string().starts_with("Installing PSReadLine failed: "));
    }

    #[test]
    fn timeout_display_is_transparent() {
        let error = AppError::from(TimedOut {
            operation: "module install",
            millis: 120_000,
        });

        assert_eq!(
            error.to_string(),
            "module install did not finish within 120000ms"
        );
    }
}
