//! Registry of capabilities and validators.

use crate::capability::Capability;
use crate::datatype::DataType;
use crate::validator::{ValidateError, ValidationReport, Validator};
use std::collections::BTreeSet;
use std::io::Read;
use std::sync::Arc;

/// Holds the capability and validator instances an engine is built from.
///
/// Populated once at startup; the conversion graph is derived from it and
/// never mutated afterwards.
#[derive(Clone, Default)]
pub struct Registry {
    capabilities: Vec<Arc<dyn Capability>>,
    validators: Vec<Arc<dyn Validator>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion capability.
    pub fn register_capability(&mut self, capability: impl Capability + 'static) {
        self.capabilities.push(Arc::new(capability));
    }

    /// Register a validator.
    pub fn register_validator(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Arc::new(validator));
    }

    /// Iterate over registered capabilities, in registration order.
    pub fn capabilities(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.capabilities.iter()
    }

    /// Iterate over registered validators, in registration order.
    pub fn validators(&self) -> impl Iterator<Item = &Arc<dyn Validator>> {
        self.validators.iter()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if no capabilities are registered.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Distinct types some validator can check, sorted.
    pub fn supported_validation_types(&self) -> BTreeSet<DataType> {
        self.validators
            .iter()
            .flat_map(|v| v.supported_types())
            .collect()
    }

    /// Validate `input` as `datatype` with the first supporting validator.
    pub fn validate(
        &self,
        input: &mut dyn Read,
        datatype: &DataType,
    ) -> Result<ValidationReport, ValidateError> {
        for validator in &self.validators {
            if validator.supported_types().iter().any(|t| t == datatype) {
                return validator.validate(input, datatype);
            }
        }
        Err(ValidateError::Unsupported(datatype.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Conversion;
    use crate::datatype::Family;
    use std::io::Write;

    fn dt(code: &str) -> DataType {
        DataType::new(code, format!("text/{code}"), "", Family::Text)
    }

    struct StubValidator {
        types: Vec<DataType>,
    }

    impl Validator for StubValidator {
        fn supported_types(&self) -> Vec<DataType> {
            self.types.clone()
        }

        fn validate(
            &self,
            input: &mut dyn Read,
            _datatype: &DataType,
        ) -> Result<ValidationReport, ValidateError> {
            let mut body = String::new();
            input.read_to_string(&mut body)?;
            if body.contains("bad") {
                Ok(ValidationReport::invalid(vec!["found 'bad'".into()]))
            } else {
                Ok(ValidationReport::valid())
            }
        }
    }

    struct StubCapability;

    impl Capability for StubCapability {
        fn name(&self) -> &str {
            "stub"
        }

        fn conversions(&self) -> Vec<Conversion> {
            vec![Conversion::new(dt("a"), dt("b"), 1)]
        }

        fn convert(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            _conversion: &Conversion,
        ) -> Result<(), crate::capability::ConvertError> {
            std::io::copy(input, output)?;
            Ok(())
        }
    }

    #[test]
    fn test_register_and_count() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        registry.register_capability(StubCapability);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_validation_dispatch() {
        let mut registry = Registry::new();
        registry.register_validator(StubValidator {
            types: vec![dt("json")],
        });

        let report = registry.validate(&mut "all good".as_bytes(), &dt("json")).unwrap();
        assert!(report.is_valid());

        let report = registry.validate(&mut "bad data".as_bytes(), &dt("json")).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.messages, ["found 'bad'"]);
    }

    #[test]
    fn test_validation_unsupported_type() {
        let registry = Registry::new();
        let err = registry
            .validate(&mut "{}".as_bytes(), &dt("json"))
            .unwrap_err();
        assert!(matches!(err, ValidateError::Unsupported(_)));
    }

    #[test]
    fn test_supported_validation_types_sorted_and_deduped() {
        let mut registry = Registry::new();
        registry.register_validator(StubValidator {
            types: vec![dt("yaml"), dt("json")],
        });
        registry.register_validator(StubValidator {
            types: vec![dt("json")],
        });

        let codes: Vec<_> = registry
            .supported_validation_types()
            .into_iter()
            .map(|t| t.format)
            .collect();
        assert_eq!(codes, ["json", "yaml"]);
    }
}
