//! Built-in format capabilities for Docmill.
//!
//! Each codec is a [`docmill::Capability`] covering a small group of related
//! formats. Enable formats via feature flags:
//!
//! - `structured` (default) - JSON <-> YAML via serde_json/serde_yaml, plus
//!   well-formedness validation for both
//! - `markdown` (default) - Markdown to HTML via pulldown-cmark
//! - `table` (default) - CSV <-> JSON via csv (arrays of flat objects only)
//! - `all` - everything above

use docmill::Registry;

pub mod formats;

/// Register every enabled codec (and validator) with the registry.
pub fn register_defaults(registry: &mut Registry) {
    #[cfg(feature = "structured")]
    {
        registry.register_capability(StructuredCodec);
        registry.register_validator(StructuredValidator);
    }
    #[cfg(feature = "markdown")]
    {
        registry.register_capability(MarkdownCodec);
    }
    #[cfg(feature = "table")]
    {
        registry.register_capability(TableCodec);
    }
}

// ============================================
// JSON <-> YAML
// ============================================

#[cfg(feature = "structured")]
mod structured_impl {
    use crate::formats;
    use docmill::{
        Capability, Conversion, ConvertError, DataType, ValidateError, ValidationReport, Validator,
    };
    use std::io::{Read, Write};

    /// Convert between JSON and YAML through a neutral value tree.
    pub struct StructuredCodec;

    impl Capability for StructuredCodec {
        fn name(&self) -> &str {
            "structured"
        }

        fn conversions(&self) -> Vec<Conversion> {
            vec![
                Conversion::new(formats::json(), formats::yaml(), 5),
                Conversion::new(formats::yaml(), formats::json(), 5),
            ]
        }

        fn convert(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            conversion: &Conversion,
        ) -> Result<(), ConvertError> {
            match (
                conversion.input.format.as_str(),
                conversion.output.format.as_str(),
            ) {
                ("json", "yaml") => {
                    let value: serde_json::Value = serde_json::from_reader(input)
                        .map_err(|e| ConvertError::InvalidInput(format!("malformed JSON: {e}")))?;
                    serde_yaml::to_writer(output, &value)
                        .map_err(|e| ConvertError::Failed(format!("YAML serialization: {e}")))?;
                }
                ("yaml", "json") => {
                    let value: serde_yaml::Value = serde_yaml::from_reader(input)
                        .map_err(|e| ConvertError::InvalidInput(format!("malformed YAML: {e}")))?;
                    serde_json::to_writer_pretty(&mut *output, &value)
                        .map_err(|e| ConvertError::Failed(format!("JSON serialization: {e}")))?;
                    writeln!(output)?;
                }
                _ => return Err(ConvertError::Unsupported(conversion.to_string())),
            }
            Ok(())
        }
    }

    /// Well-formedness checks for JSON and YAML documents.
    pub struct StructuredValidator;

    impl Validator for StructuredValidator {
        fn supported_types(&self) -> Vec<DataType> {
            vec![formats::json(), formats::yaml()]
        }

        fn validate(
            &self,
            input: &mut dyn Read,
            datatype: &DataType,
        ) -> Result<ValidationReport, ValidateError> {
            match datatype.format.as_str() {
                "json" => match serde_json::from_reader::<_, serde_json::Value>(input) {
                    Ok(_) => Ok(ValidationReport::valid()),
                    Err(e) => Ok(ValidationReport::invalid(vec![e.to_string()])),
                },
                "yaml" => match serde_yaml::from_reader::<_, serde_yaml::Value>(input) {
                    Ok(_) => Ok(ValidationReport::valid()),
                    Err(e) => Ok(ValidationReport::invalid(vec![e.to_string()])),
                },
                _ => Err(ValidateError::Unsupported(datatype.clone())),
            }
        }
    }
}

#[cfg(feature = "structured")]
pub use structured_impl::{StructuredCodec, StructuredValidator};

// ============================================
// Markdown -> HTML
// ============================================

#[cfg(feature = "markdown")]
mod markdown_impl {
    use crate::formats;
    use docmill::{Capability, Conversion, ConvertError};
    use pulldown_cmark::{Parser, html};
    use std::io::{Read, Write};

    /// Render Markdown as HTML.
    pub struct MarkdownCodec;

    impl Capability for MarkdownCodec {
        fn name(&self) -> &str {
            "markdown"
        }

        fn conversions(&self) -> Vec<Conversion> {
            vec![Conversion::new(formats::markdown(), formats::html(), 10)]
        }

        fn convert(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            conversion: &Conversion,
        ) -> Result<(), ConvertError> {
            if conversion.input.format != "markdown" || conversion.output.format != "html" {
                return Err(ConvertError::Unsupported(conversion.to_string()));
            }

            let mut text = String::new();
            input.read_to_string(&mut text)?;

            let mut rendered = String::new();
            html::push_html(&mut rendered, Parser::new(&text));
            output.write_all(rendered.as_bytes())?;
            Ok(())
        }
    }
}

#[cfg(feature = "markdown")]
pub use markdown_impl::MarkdownCodec;

// ============================================
// CSV <-> JSON
// ============================================

#[cfg(feature = "table")]
mod table_impl {
    use crate::formats;
    use docmill::{Capability, Conversion, ConvertError};
    use serde_json::Value;
    use std::io::{Read, Write};

    /// Convert between CSV tables and JSON arrays of flat objects.
    ///
    /// CSV -> JSON is lossless but stringly typed (every cell becomes a JSON
    /// string). JSON -> CSV requires an array of objects sharing one flat
    /// key set; anything nested is rejected as invalid input.
    pub struct TableCodec;

    impl Capability for TableCodec {
        fn name(&self) -> &str {
            "table"
        }

        fn conversions(&self) -> Vec<Conversion> {
            vec![
                Conversion::new(formats::csv(), formats::json(), 9),
                Conversion::new(formats::json(), formats::csv(), 11),
            ]
        }

        fn convert(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            conversion: &Conversion,
        ) -> Result<(), ConvertError> {
            match (
                conversion.input.format.as_str(),
                conversion.output.format.as_str(),
            ) {
                ("csv", "json") => csv_to_json(input, output),
                ("json", "csv") => json_to_csv(input, output),
                _ => Err(ConvertError::Unsupported(conversion.to_string())),
            }
        }
    }

    fn csv_to_json(input: &mut dyn Read, output: &mut dyn Write) -> Result<(), ConvertError> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader
            .headers()
            .map_err(|e| ConvertError::InvalidInput(format!("malformed CSV: {e}")))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| ConvertError::InvalidInput(format!("malformed CSV: {e}")))?;
            let row: serde_json::Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(key, cell)| (key.to_owned(), Value::String(cell.to_owned())))
                .collect();
            rows.push(Value::Object(row));
        }

        serde_json::to_writer_pretty(&mut *output, &Value::Array(rows))
            .map_err(|e| ConvertError::Failed(format!("JSON serialization: {e}")))?;
        writeln!(output)?;
        Ok(())
    }

    fn json_to_csv(input: &mut dyn Read, output: &mut dyn Write) -> Result<(), ConvertError> {
        let value: Value = serde_json::from_reader(input)
            .map_err(|e| ConvertError::InvalidInput(format!("malformed JSON: {e}")))?;
        let Value::Array(rows) = value else {
            return Err(ConvertError::InvalidInput(
                "expected a JSON array of objects".into(),
            ));
        };

        let mut writer = csv::Writer::from_writer(output);
        let mut headers: Option<Vec<String>> = None;
        for row in &rows {
            let Value::Object(fields) = row else {
                return Err(ConvertError::InvalidInput(
                    "expected a JSON array of objects".into(),
                ));
            };
            let keys: Vec<String> = fields.keys().cloned().collect();
            match &headers {
                Some(existing) if *existing != keys => {
                    return Err(ConvertError::InvalidInput(
                        "objects disagree on their keys".into(),
                    ));
                }
                Some(_) => {}
                None => {
                    writer.write_record(&keys).map_err(csv_write_error)?;
                    headers = Some(keys);
                }
            }

            let mut cells = Vec::with_capacity(fields.len());
            for value in fields.values() {
                cells.push(scalar_cell(value)?);
            }
            writer.write_record(&cells).map_err(csv_write_error)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn scalar_cell(value: &Value) -> Result<String, ConvertError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(s.clone()),
            Value::Array(_) | Value::Object(_) => Err(ConvertError::InvalidInput(
                "nested values cannot be represented in CSV".into(),
            )),
        }
    }

    fn csv_write_error(e: csv::Error) -> ConvertError {
        ConvertError::Failed(format!("CSV serialization: {e}"))
    }
}

#[cfg(feature = "table")]
pub use table_impl::TableCodec;
