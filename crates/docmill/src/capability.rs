//! The capability contract implemented by format converters.

use crate::conversion::Conversion;
use std::io::{Read, Write};

/// A collaborator able to perform one or more typed conversions.
///
/// Stream lifecycle belongs to the pipeline executor: a capability reads its
/// input to end-of-stream and writes its whole output (or fails), but does
/// not own closing either end.
pub trait Capability: Send + Sync {
    /// Stable name used for logging and display.
    fn name(&self) -> &str;

    /// Conversions this instance can perform.
    fn conversions(&self) -> Vec<Conversion>;

    /// Perform one conversion, fully consuming `input` and writing the
    /// converted document to `output`.
    fn convert(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        conversion: &Conversion,
    ) -> Result<(), ConvertError>;
}

/// Errors raised by capabilities while transforming data.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("conversion failed: {0}")]
    Failed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conversion not offered by this capability: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
