//! The single error type shared across the extractor, repairing parser,
//! validator, defaulter, repair synthesizer, and streaming core.

use crate::path::{Path, path_str_to_pointer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Type,
    Limit,
    Parse,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Schema => "schema",
            ErrorKind::Type => "type",
            ErrorKind::Limit => "limit",
            ErrorKind::Parse => "parse",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MaxBufferBytes,
    MaxItems,
}

impl LimitKind {
    fn as_str(self) -> &'static str {
        match self {
            LimitKind::MaxBufferBytes => "maxBufferBytes",
            LimitKind::MaxItems => "maxItems",
        }
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitInfo {
    pub kind: LimitKind,
    pub current: u64,
    pub max: u64,
}

/// The crate-wide error record. Every field is always populated: `path` is
/// anchored at `$` and `json_pointer` is mechanically derived from it, so
/// the two can never drift apart (see `path::path_str_to_pointer`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message} (at {path})")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub message: String,
    pub path: String,
    pub json_pointer: String,
    pub limit: Option<LimitInfo>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, path: &Path) -> Self {
        let path_string = path.to_path_string();
        let json_pointer = path.to_pointer();
        Self {
            kind,
            message: message.into(),
            path: path_string,
            json_pointer,
            limit: None,
        }
    }

    /// Build from a literal path string (`"$.stream.maxItems"`), for call
    /// sites that don't have a `Path` builder handy (stream/limit errors,
    /// the SQL collaborator contract).
    pub fn from_path_str(kind: ErrorKind, message: impl Into<String>, path: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            path: path.to_string(),
            json_pointer: path_str_to_pointer(path),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: LimitInfo) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit_error(path: &str, kind: LimitKind, current: u64, max: u64) -> Self {
        Self::from_path_str(
            ErrorKind::Limit,
            format!("{} exceeds limit of {}", kind.as_str(), max),
            path,
        )
        .with_limit(LimitInfo { kind, current, max })
    }
}

pub type JResult<T> = Result<T, ValidationError>;
