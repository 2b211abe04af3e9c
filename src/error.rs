use thiserror::Error;

use crate::domain::NetworkId;

/// Process-level failure carrying the exit code `main` should return.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures that end a single evaluation.
///
/// An empty filter result is not an error; see `Evaluation::is_empty`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Please enter an LLF code.")]
    MissingInput,

    #[error("No LLF mapping found for DNO {network_id} and LLF code '{code}'.")]
    NotFound { network_id: NetworkId, code: String },
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        let exit_code = match err {
            LookupError::MissingInput => 2,
            LookupError::NotFound { .. } => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors_map_to_exit_codes() {
        let missing: AppError = LookupError::MissingInput.into();
        assert_eq!(missing.exit_code(), 2);

        let not_found: AppError = LookupError::NotFound {
            network_id: NetworkId::new(10),
            code: "999".to_string(),
        }
        .into();
        assert_eq!(not_found.exit_code(), 3);
        assert_eq!(
            not_found.message(),
            "No LLF mapping found for DNO 10 and LLF code '999'."
        );
    }
}
