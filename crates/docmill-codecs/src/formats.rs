//! The document formats the built-in codecs speak.

use docmill::{DataType, Family};

pub fn markdown() -> DataType {
    DataType::new("markdown", "text/markdown", "Markdown text", Family::Text)
}

pub fn html() -> DataType {
    DataType::new("html", "text/html", "HTML document", Family::Text)
}

pub fn json() -> DataType {
    DataType::new("json", "application/json", "JSON document", Family::Text)
}

pub fn yaml() -> DataType {
    DataType::new("yaml", "application/yaml", "YAML document", Family::Text)
}

pub fn csv() -> DataType {
    DataType::new("csv", "text/csv", "CSV table", Family::Spreadsheet)
}
