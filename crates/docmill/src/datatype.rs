//! Typed document formats.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Coarse category a document format belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Text,
    Spreadsheet,
    Presentation,
    #[default]
    Other,
}

impl Family {
    /// Short code used in configuration and URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Family::Text => "text",
            Family::Spreadsheet => "spreadsheet",
            Family::Presentation => "presentation",
            Family::Other => "other",
        }
    }

    /// Human-readable family name.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Text => "Documents",
            Family::Spreadsheet => "Spreadsheets",
            Family::Presentation => "Presentations",
            Family::Other => "Other documents",
        }
    }

    /// Look up a family by its code; unknown codes fall back to `Other`.
    pub fn from_code(code: &str) -> Family {
        match code {
            "text" => Family::Text,
            "spreadsheet" => Family::Spreadsheet,
            "presentation" => Family::Presentation,
            _ => Family::Other,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named document format.
///
/// Equality, hashing and ordering consider only `(format, mime)`; the
/// description and family are informational. Sorting by `(format, mime)`
/// keeps formats of the same family adjacent in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataType {
    /// Format code, e.g. `"markdown"`.
    pub format: String,
    /// MIME type, e.g. `"text/markdown"`.
    pub mime: String,
    /// Human-readable description.
    pub description: String,
    /// Document family.
    #[serde(default)]
    pub family: Family,
}

impl DataType {
    /// Create a new data type.
    pub fn new(
        format: impl Into<String>,
        mime: impl Into<String>,
        description: impl Into<String>,
        family: Family,
    ) -> Self {
        Self {
            format: format.into(),
            mime: mime.into(),
            description: description.into(),
            family,
        }
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format && self.mime == other.mime
    }
}

impl Eq for DataType {}

impl Hash for DataType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.format.hash(state);
        self.mime.hash(state);
    }
}

impl PartialOrd for DataType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataType {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.format, &self.mime).cmp(&(&other.format, &other.mime))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.format, self.mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_description_and_family() {
        let a = DataType::new("markdown", "text/markdown", "Markdown text", Family::Text);
        let b = DataType::new("markdown", "text/markdown", "something else", Family::Other);
        assert_eq!(a, b);

        let c = DataType::new("markdown", "text/plain", "Markdown text", Family::Text);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ordering_by_format_then_mime() {
        let mut types = vec![
            DataType::new("yaml", "application/yaml", "", Family::Text),
            DataType::new("csv", "text/csv", "", Family::Spreadsheet),
            DataType::new("json", "application/json", "", Family::Text),
        ];
        types.sort();
        let codes: Vec<_> = types.iter().map(|t| t.format.as_str()).collect();
        assert_eq!(codes, ["csv", "json", "yaml"]);
    }

    #[test]
    fn test_family_codes() {
        assert_eq!(Family::from_code("spreadsheet"), Family::Spreadsheet);
        assert_eq!(Family::from_code("bogus"), Family::Other);
        assert_eq!(Family::Text.name(), "Documents");
    }
}
