//! # Framebridge
//!
//! Lets a synchronous, byte-stream RPC decoder read responses that arrive
//! asynchronously over a call/response channel.
//!
//! ## Architecture
//!
//! - `transport`: the `CallChannel` the bridge sits on, and the `FrameTransport`
//!   a protocol client writes to and flushes.
//! - `relay`: one `FrameRelay` per call, the single-slot handoff between the
//!   network completion path and the decoder.
//! - `framing`: the metadata prefix (endpoint, message type, sequence id) that
//!   the relay writes in front of each reply payload.
//! - `translate`: error frames to `ApplicationError`.

pub mod error;
pub mod framing;
pub mod message;
pub mod mock;
pub mod relay;
pub mod translate;
pub mod transport;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use error::Result;
pub use framing::FramedMessage;
pub use framing::encode_framed;
pub use message::Call;
pub use message::ErrorCode;
pub use message::MessageType;
pub use message::ResponseFrame;
pub use relay::FrameRelay;
pub use translate::ApplicationError;
pub use translate::ApplicationErrorKind;
pub use translate::ErrorMapper;
pub use translate::translate_error;
pub use translate::translate_error_with;
pub use transport::CallChannel;
pub use transport::ChannelTransport;
pub use transport::FrameTransport;
pub use transport::TransportBuilder;
pub use transport::TransportError;
