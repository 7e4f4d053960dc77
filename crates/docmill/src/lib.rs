//! Docmill: cost-ranked document conversion engine
//!
//! Docmill routes documents between formats. Capabilities advertise the
//! conversions they can perform; the engine assembles them into a graph,
//! finds cost-ranked acyclic chains between any two formats, and executes a
//! chosen chain as a streaming thread-per-stage pipeline.

mod capability;
mod conduit;
mod conversion;
mod datatype;
mod finder;
mod graph;
mod pipeline;
mod registry;
mod validator;

pub use capability::{Capability, ConvertError};
pub use conversion::{Conversion, ConversionAction, ConversionPath};
pub use datatype::{DataType, Family};
pub use finder::{PathFinder, UnsupportedConversion};
pub use graph::ConversionGraph;
pub use pipeline::{PipelineError, run_pipeline};
pub use registry::Registry;
pub use validator::{ValidateError, ValidationReport, ValidationStatus, Validator};
