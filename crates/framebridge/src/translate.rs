//! # Error Translation
//!
//! Turns error frames into an `ApplicationError` the caller can match on.
//!
//! Which `ApplicationErrorKind` a protocol `ErrorCode` becomes is left to an
//! `ErrorMapper`. The default mapper reports every code as `Unknown`.

use std::collections::HashMap;
use std::fmt;

use crate::error::Error;
use crate::error::Result;
use crate::message::ErrorCode;
use crate::message::ResponseFrame;

/// Categories of application-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationErrorKind {
    Unknown,
    UnknownMethod,
    InvalidMessageType,
    WrongMethodName,
    BadSequenceId,
    MissingResult,
    InternalError,
    ProtocolError,
}

/// A structured error raised in place of a response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationError {
    pub kind: ApplicationErrorKind,
    pub message: String,
}

impl ApplicationError {
    pub fn new(kind: ApplicationErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApplicationError {}

/// Chooses the kind of error an error frame becomes.
///
/// `code` is `None` when the frame did not carry a recognizable code.
pub trait ErrorMapper: Send + Sync + 'static {
    fn kind_for(&self, code: Option<ErrorCode>) -> ApplicationErrorKind;
}

/// Maps every code to `ApplicationErrorKind::Unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorMapper;

impl ErrorMapper for DefaultErrorMapper {
    fn kind_for(&self, _code: Option<ErrorCode>) -> ApplicationErrorKind {
        ApplicationErrorKind::Unknown
    }
}

/// A lookup table from codes to kinds, with a fallback for everything else.
#[derive(Debug, Clone)]
pub struct TableErrorMapper {
    table: HashMap<ErrorCode, ApplicationErrorKind>,
    fallback: ApplicationErrorKind,
}

impl TableErrorMapper {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            fallback: ApplicationErrorKind::Unknown,
        }
    }

    pub fn map(mut self, code: ErrorCode, kind: ApplicationErrorKind) -> Self {
        self.table.insert(code, kind);
        self
    }

    pub fn fallback(mut self, kind: ApplicationErrorKind) -> Self {
        self.fallback = kind;
        self
    }
}

impl Default for TableErrorMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorMapper for TableErrorMapper {
    fn kind_for(&self, code: Option<ErrorCode>) -> ApplicationErrorKind {
        code.and_then(|c| self.table.get(&c).copied()).unwrap_or(self.fallback)
    }
}

/// Translates an error frame using `DefaultErrorMapper`.
pub fn translate_error(frame: &ResponseFrame) -> Result<ApplicationError> {
    translate_error_with(frame, &DefaultErrorMapper)
}

/// Translates an error frame, letting `mapper` pick the kind.
///
/// # Errors
/// Returns `Error::Usage` if the frame is not flagged as an error; callers must
/// check `ResponseFrame::is_error` first.
pub fn translate_error_with(
    frame: &ResponseFrame,
    mapper: &dyn ErrorMapper,
) -> Result<ApplicationError> {
    if !frame.is_error() {
        return Err(Error::Usage(format!(
            "Cannot translate a {:?} frame into an application error",
            frame.message_type
        )));
    }

    let kind = mapper.kind_for(frame.error_code);
    let message = frame.error_text.clone().unwrap_or_default();
    Ok(ApplicationError::new(kind, message))
}
