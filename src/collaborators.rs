//! Generic interfaces for the format-specific parsers this crate does not
//! ship (spec §1 non-goals, §6 closing paragraph): YAML, TOML, XML/HTML,
//! Markdown, and key=value. Each trait returns its own summary record; the
//! core only requires that any parse error use the `path`/JSON Pointer
//! grammar shared by [`crate::error::ValidationError`].

use crate::error::ValidationError;
use crate::value::Value;

/// A parsed key=value line.
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

pub trait KvParser {
    fn parse(&self, text: &str) -> Result<Vec<KvEntry>, ValidationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownSummary {
    pub headings: Vec<String>,
    pub code_blocks: Vec<String>,
}

pub trait MarkdownParser {
    fn parse(&self, text: &str) -> Result<MarkdownSummary, ValidationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlSummary {
    pub root_tag: String,
    pub value: Value,
}

pub trait XmlParser {
    fn parse(&self, text: &str) -> Result<XmlSummary, ValidationError>;
}

pub trait TomlParser {
    fn parse(&self, text: &str) -> Result<Value, ValidationError>;
}

pub trait YamlParser {
    fn parse(&self, text: &str) -> Result<Value, ValidationError>;
}
