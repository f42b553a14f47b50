//! # Frame Relay
//!
//! A single-slot handoff between the network completion path and the
//! decoder. The completion path calls `deliver_frame` once; the decoder
//! awaits `retrieve_frame` (or `read_frame`) once. Either side may arrive
//! first: a frame delivered early waits in the slot, and a reader that
//! arrives early suspends until the frame is pushed.
//!
//! ## Invariants
//! - At most one frame is ever delivered per relay.
//! - At most one reader ever receives it.
//! - Any second delivery or retrieval fails with `Error::Usage`.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::sync::oneshot;
use tracing::debug;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;
use crate::framing::encode_framed;
use crate::message::Call;
use crate::message::ResponseFrame;
use crate::translate::DefaultErrorMapper;
use crate::translate::ErrorMapper;
use crate::translate::translate_error_with;

/// The relay slot owned by one `Call`.
pub struct FrameRelay {
    call: Call,
    tx: Mutex<Option<oneshot::Sender<ResponseFrame>>>,
    rx: Mutex<Option<oneshot::Receiver<ResponseFrame>>>,
    mapper: Arc<dyn ErrorMapper>,
}

/// Takes the value out of a slot. A poisoned lock still holds a whole `Option`.
fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

impl FrameRelay {
    pub fn new(call: Call) -> Self {
        Self::with_mapper(call, Arc::new(DefaultErrorMapper))
    }

    /// Creates a relay whose `read_frame` translates error frames with `mapper`.
    pub fn with_mapper(call: Call, mapper: Arc<dyn ErrorMapper>) -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            call,
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            mapper,
        }
    }

    pub fn call(&self) -> &Call {
        &self.call
    }

    /// True once a frame has been delivered or the relay has been closed.
    pub fn is_filled(&self) -> bool {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// Makes `frame` available to the (possibly already waiting) reader.
    ///
    /// # Errors
    /// Returns `Error::Usage` if a frame was already delivered or the relay was closed.
    /// The rejected frame is dropped.
    pub fn deliver_frame(&self, frame: ResponseFrame) -> Result<()> {
        let Some(tx) = take(&self.tx) else {
            warn!(endpoint = %self.call.endpoint, seq = self.call.seq, "frame delivered twice");
            return Err(Error::Usage(format!(
                "A frame was already delivered for call {} (seq {})",
                self.call.endpoint, self.call.seq
            )));
        };

        debug!(
            endpoint = %self.call.endpoint,
            seq = self.call.seq,
            message_type = ?frame.message_type,
            len = frame.payload.len(),
            "frame delivered"
        );

        if tx.send(frame).is_err() {
            // the reader took the slot and then gave up waiting
            debug!(
                endpoint = %self.call.endpoint,
                seq = self.call.seq,
                "reader went away, frame dropped"
            );
        }
        Ok(())
    }

    /// Closes the producer side without delivering anything.
    ///
    /// A reader waiting on this relay wakes up with `Error::Closed`.
    pub fn close(&self) {
        if take(&self.tx).is_some() {
            debug!(
                endpoint = %self.call.endpoint,
                seq = self.call.seq,
                "relay closed without a frame"
            );
        }
    }

    /// Waits for the delivered frame and returns it unchanged.
    ///
    /// # Errors
    /// - `Error::Usage` if the frame was already retrieved.
    /// - `Error::Closed` if the relay was closed before delivery.
    pub async fn retrieve_frame(&self) -> Result<ResponseFrame> {
        let Some(rx) = take(&self.rx) else {
            warn!(endpoint = %self.call.endpoint, seq = self.call.seq, "frame retrieved twice");
            return Err(Error::Usage(format!(
                "The frame for call {} (seq {}) was already retrieved",
                self.call.endpoint, self.call.seq
            )));
        };

        let frame = rx.await.map_err(|_| Error::Closed)?;
        debug!(endpoint = %self.call.endpoint, seq = self.call.seq, "frame retrieved");
        Ok(frame)
    }

    /// Waits for the frame and returns what the decoder reads.
    ///
    /// Reply frames come back with the call metadata prepended (see `framing`).
    /// Error frames become `Error::Application`.
    pub async fn read_frame(&self) -> Result<Vec<u8>> {
        let frame = self.retrieve_frame().await?;
        if frame.is_error() {
            let error = translate_error_with(&frame, self.mapper.as_ref())?;
            return Err(Error::Application(error));
        }
        encode_framed(&self.call.endpoint, frame.message_type, self.call.seq, &frame.payload)
    }
}

impl std::fmt::Debug for FrameRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRelay")
            .field("call", &self.call)
            .field("filled", &self.is_filled())
            .finish()
    }
}
