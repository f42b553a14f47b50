//! # Call and Response Types
//!
//! What the call/response layer hands us: a `Call` when a request is opened,
//! and exactly one `ResponseFrame` when it completes.

/// One logical request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub hostport: String,
    pub service: String,
    pub endpoint: String,
    /// Assigned by the call/response layer.
    pub seq: u32,
}

impl Call {
    pub fn new(
        hostport: impl Into<String>,
        service: impl Into<String>,
        endpoint: impl Into<String>,
        seq: u32,
    ) -> Self {
        Self {
            hostport: hostport.into(),
            service: service.into(),
            endpoint: endpoint.into(),
            seq,
        }
    }
}

/// The kind of a response frame, as flagged by the call/response layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A successful call response.
    Reply,
    /// A protocol-level error.
    Error,
}

impl MessageType {
    /// The one byte tag written into framed payloads.
    pub fn as_tag(self) -> u8 {
        match self {
            Self::Reply => 0x04,
            Self::Error => 0xff,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x04 => Some(Self::Reply),
            0xff => Some(Self::Error),
            _ => None,
        }
    }
}

/// Protocol error codes carried by error frames.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Timeout = 0x01,
    Cancelled = 0x02,
    Busy = 0x03,
    Declined = 0x04,
    UnexpectedError = 0x05,
    BadRequest = 0x06,
    NetworkError = 0x07,
    Unhealthy = 0x08,
    FatalProtocolError = 0xff,
}

impl ErrorCode {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Timeout),
            0x02 => Some(Self::Cancelled),
            0x03 => Some(Self::Busy),
            0x04 => Some(Self::Declined),
            0x05 => Some(Self::UnexpectedError),
            0x06 => Some(Self::BadRequest),
            0x07 => Some(Self::NetworkError),
            0x08 => Some(Self::Unhealthy),
            0xff => Some(Self::FatalProtocolError),
            _ => None,
        }
    }
}

/// A complete response, never a partial one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub message_type: MessageType,
    pub payload: Vec<u8>,
    pub error_text: Option<String>,
    pub error_code: Option<ErrorCode>,
}

impl ResponseFrame {
    /// A successful response carrying `payload`.
    pub fn reply(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            message_type: MessageType::Reply,
            payload: payload.into(),
            error_text: None,
            error_code: None,
        }
    }

    /// An error response. Error frames carry no payload.
    pub fn error(code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Error,
            payload: Vec::new(),
            error_text: Some(text.into()),
            error_code: Some(code),
        }
    }

    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
    }
}
