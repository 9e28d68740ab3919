//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) | ApplicationError::Csv { .. } => {
                        crate::exitcode::DATAERR
                    }
                    ApplicationError::InputNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                    ApplicationError::Render { .. } => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case(ApplicationError::Domain(DomainError::MissingColumn("Label".into())), crate::exitcode::DATAERR)]
    #[case(ApplicationError::InputNotFound(PathBuf::from("x.csv")), crate::exitcode::NOINPUT)]
    #[case(ApplicationError::Config { message: "bad".into() }, crate::exitcode::CONFIG)]
    #[case(ApplicationError::Render { message: "bad".into() }, crate::exitcode::SOFTWARE)]
    fn given_application_error_when_mapping_then_uses_sysexits_code(
        #[case] error: ApplicationError,
        #[case] expected: i32,
    ) {
        assert_eq!(CliError::from(error).exit_code(), expected);
    }

    #[test]
    fn given_usage_error_when_mapping_then_returns_usage() {
        assert_eq!(
            CliError::InvalidArgs("--min > --max".into()).exit_code(),
            crate::exitcode::USAGE
        );
    }
}
