use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a calendar upload could not be turned into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseErrorKind {
    /// The calendar decoded fine but holds no VEVENT anywhere in its tree.
    NoEventsFound,
    /// The bytes could not be decoded as a calendar structure at all.
    MalformedInput,
}

impl ParseErrorKind {
    /// Text shown in front of the detail when the error is displayed.
    fn display_prefix(&self) -> &'static str {
        match self {
            Self::NoEventsFound => "",
            Self::MalformedInput => "Error parsing ICS file: ",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEventsFound => f.write_str("NoEventsFound"),
            Self::MalformedInput => f.write_str("MalformedInput"),
        }
    }
}

/// Typed parser failure. Serializes as `{"kind": ..., "detail": ...}`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}{}", .kind.display_prefix(), .detail)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub detail: String,
}

impl ParseError {
    pub const NO_EVENTS_DETAIL: &'static str = "No events found in ICS file.";

    pub fn no_events() -> Self {
        Self {
            kind: ParseErrorKind::NoEventsFound,
            detail: Self::NO_EVENTS_DETAIL.to_string(),
        }
    }

    pub fn malformed<S: Into<String>>(detail: S) -> Self {
        let detail = detail.into();
        Self {
            kind: ParseErrorKind::MalformedInput,
            detail: if detail.trim().is_empty() {
                "unrecognized calendar structure".to_string()
            } else {
                detail
            },
        }
    }

    pub fn is_no_events(&self) -> bool {
        self.kind == ParseErrorKind::NoEventsFound
    }

    pub fn is_malformed(&self) -> bool {
        self.kind == ParseErrorKind::MalformedInput
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store is full: capacity of {limit} entries reached")]
    CapacityExceeded { limit: usize },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Parse failure kind, if this error came out of the parser.
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn is_pii_safe(&self) -> bool {
        match self {
            // Decoder diagnostics can echo fragments of the uploaded file.
            Self::Parse(e) => e.is_no_events(),
            Self::Serialization(_) => false,
            Self::Store(_) | Self::Config(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_pii_safe() {
            self.to_string()
        } else {
            match self {
                Self::Parse(_) => "Error parsing ICS file".to_string(),
                Self::Serialization(_) => "Failed to encode parsed events".to_string(),
                _ => self.to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        assert_eq!(ParseError::no_events().to_string(), "No events found in ICS file.");
        assert_eq!(
            ParseError::malformed("bad line").to_string(),
            "Error parsing ICS file: bad line"
        );
    }

    #[test]
    fn test_parse_error_is_a_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(ParseError::malformed("bad line"));
        assert_eq!(err.to_string(), "Error parsing ICS file: bad line");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_malformed_detail_never_empty() {
        let err = ParseError::malformed("  ");
        assert!(err.is_malformed());
        assert!(!err.detail.is_empty());
    }

    #[test]
    fn test_parse_error_serializes_kind_and_detail() {
        let value = serde_json::to_value(ParseError::no_events()).unwrap();
        assert_eq!(value["kind"], "NoEventsFound");
        assert_eq!(value["detail"], "No events found in ICS file.");
    }

    #[test]
    fn test_safe_string_hides_decoder_detail() {
        let err = AppError::from(ParseError::malformed("SUMMARY:secret"));
        assert!(!err.is_pii_safe());
        assert!(!err.to_safe_string().contains("secret"));
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::MalformedInput));

        let err = AppError::from(StoreError::CapacityExceeded { limit: 2 });
        assert!(err.to_safe_string().contains("capacity of 2"));
        assert_eq!(err.parse_kind(), None);
    }
}
