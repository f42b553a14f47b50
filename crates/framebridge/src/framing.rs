//! # Framed Payloads
//!
//! A byte-stream decoder only ever sees payload bytes, yet it needs the
//! endpoint name, message type and sequence id that live on the `Call`. The
//! relay writes those three fields in front of the payload so the decoder can
//! pull them with its ordinary sequential reads.
//!
//! ## Wire Format
//! - String: endpoint name
//! - U8: message type tag (`MessageType::as_tag`)
//! - U32: sequence id
//! - Payload bytes, verbatim, up to the end of the buffer

use framepack::Decoder;
use framepack::Encoder;

use crate::error::Error;
use crate::error::Result;
use crate::message::MessageType;

/// Prepends the call metadata header to `payload`.
pub fn encode_framed(
    endpoint: &str,
    message_type: MessageType,
    seq: u32,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let mut enc = Encoder::with_capacity(endpoint.len() + payload.len());
    enc.str(endpoint)?;
    enc.u8(message_type.as_tag());
    enc.u32(seq);
    enc.raw(payload);
    Ok(enc.into_bytes())
}

/// A framed payload, split back into its metadata and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage<'a> {
    pub endpoint: &'a str,
    pub message_type: MessageType,
    pub seq: u32,
    pub payload: &'a [u8],
}

impl<'a> FramedMessage<'a> {
    /// Reads the header fields in wire order; everything after them is the payload.
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let endpoint = dec.str()?;
        let tag = dec.u8()?;
        let message_type = MessageType::from_tag(tag)
            .ok_or_else(|| Error::Protocol(format!("Unknown message type tag: {:#04x}", tag)))?;
        let seq = dec.u32()?;

        Ok(Self {
            endpoint,
            message_type,
            seq,
            payload: dec.rest(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_framed(self.endpoint, self.message_type, self.seq, self.payload)
    }
}
