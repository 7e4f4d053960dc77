//! Document validation boundary.
//!
//! Validation logic lives in collaborator crates; the core only dispatches
//! to whichever registered validator supports the document's type.

use crate::datatype::DataType;
use std::io::Read;

/// Content validator for one or more document formats.
pub trait Validator: Send + Sync {
    /// Types this validator can check.
    fn supported_types(&self) -> Vec<DataType>;

    /// Validate `input` as a document of `datatype`.
    ///
    /// A malformed document is a successful validation with an `Invalid`
    /// report; `Err` is reserved for faults in the validator itself.
    fn validate(
        &self,
        input: &mut dyn Read,
        datatype: &DataType,
    ) -> Result<ValidationReport, ValidateError>;
}

/// Validation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

/// Outcome of validating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    /// Error and warning messages, in discovery order.
    pub messages: Vec<String>,
}

impl ValidationReport {
    /// A clean report.
    pub fn valid() -> Self {
        Self {
            status: ValidationStatus::Valid,
            messages: Vec::new(),
        }
    }

    /// A failed report carrying the collected messages.
    pub fn invalid(messages: Vec<String>) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            messages,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

/// Errors raised on the validation boundary.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("no validator supports {0}")]
    Unsupported(DataType),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("validation failed: {0}")]
    Failed(String),
}
