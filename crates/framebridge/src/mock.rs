//! Mock call channels for testing.
//!
//! These stand in for a real call/response network layer in the test suites.

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use tokio::sync::Mutex;
use tokio::sync::oneshot;

use crate::message::Call;
use crate::message::ResponseFrame;
use crate::transport;
use crate::transport::CallChannel;
use crate::transport::TransportError;

/// Hands out sequence ids the way a connection does: counting up from a start value.
struct SeqGen(AtomicU32);

impl SeqGen {
    fn new(first: u32) -> Self {
        Self(AtomicU32::new(first))
    }

    fn open(&self, hostport: &str, service: &str, endpoint: &str) -> Call {
        let seq = self.0.fetch_add(1, Ordering::Relaxed);
        Call::new(hostport, service, endpoint, seq)
    }
}

/// A channel that answers every call by running a closure over the request.
pub struct HandlerChannel<F>
where
    F: Fn(&Call, &[u8]) -> transport::Result<ResponseFrame> + Send + Sync,
{
    seq: SeqGen,
    handler: F,
}

impl<F> HandlerChannel<F>
where
    F: Fn(&Call, &[u8]) -> transport::Result<ResponseFrame> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self::starting_at(1, handler)
    }

    /// Like `new`, but the first call gets sequence id `first`.
    pub fn starting_at(first: u32, handler: F) -> Self {
        Self { seq: SeqGen::new(first), handler }
    }
}

#[async_trait::async_trait]
impl<F> CallChannel for HandlerChannel<F>
where
    F: Fn(&Call, &[u8]) -> transport::Result<ResponseFrame> + Send + Sync + 'static,
{
    fn initiate(&self, hostport: &str, service: &str, endpoint: &str) -> Call {
        self.seq.open(hostport, service, endpoint)
    }

    async fn call(&self, call: &Call, payload: Vec<u8>) -> transport::Result<ResponseFrame> {
        (self.handler)(call, &payload)
    }
}

/// A handler that needs no captured state.
pub type HandlerFn = fn(&Call, &[u8]) -> transport::Result<ResponseFrame>;

/// A channel that echoes the request body back as a successful reply.
pub fn echo_channel() -> HandlerChannel<HandlerFn> {
    HandlerChannel::new(echo as HandlerFn)
}

fn echo(_call: &Call, body: &[u8]) -> transport::Result<ResponseFrame> {
    Ok(ResponseFrame::reply(body))
}

/// A channel whose every call fails with the same transport error.
pub struct FailingChannel {
    seq: SeqGen,
    error: TransportError,
}

impl FailingChannel {
    pub fn new(error: TransportError) -> Self {
        Self { seq: SeqGen::new(1), error }
    }
}

#[async_trait::async_trait]
impl CallChannel for FailingChannel {
    fn initiate(&self, hostport: &str, service: &str, endpoint: &str) -> Call {
        self.seq.open(hostport, service, endpoint)
    }

    async fn call(&self, _call: &Call, _payload: Vec<u8>) -> transport::Result<ResponseFrame> {
        Err(self.error.clone())
    }
}

/// A channel whose single call completes only when the test says so.
///
/// The request body is reported on the returned receiver as soon as it is sent,
/// and the response is whatever the test pushes into the returned sender.
pub struct GatedChannel {
    seq: SeqGen,
    sent: Mutex<Option<oneshot::Sender<Vec<u8>>>>,
    gate: Mutex<Option<oneshot::Receiver<transport::Result<ResponseFrame>>>>,
}

impl GatedChannel {
    pub fn new() -> (
        Self,
        oneshot::Receiver<Vec<u8>>,
        oneshot::Sender<transport::Result<ResponseFrame>>,
    ) {
        let (sent_tx, sent_rx) = oneshot::channel();
        let (gate_tx, gate_rx) = oneshot::channel();
        let channel = Self {
            seq: SeqGen::new(1),
            sent: Mutex::new(Some(sent_tx)),
            gate: Mutex::new(Some(gate_rx)),
        };
        (channel, sent_rx, gate_tx)
    }
}

#[async_trait::async_trait]
impl CallChannel for GatedChannel {
    fn initiate(&self, hostport: &str, service: &str, endpoint: &str) -> Call {
        self.seq.open(hostport, service, endpoint)
    }

    async fn call(&self, _call: &Call, payload: Vec<u8>) -> transport::Result<ResponseFrame> {
        if let Some(sent) = self.sent.lock().await.take() {
            let _ = sent.send(payload);
        }
        let gate = self.gate.lock().await.take()
            .ok_or_else(|| TransportError::Io("GatedChannel only serves one call".into()))?;
        gate.await
            .map_err(|_| TransportError::ConnectionLost("Gate dropped".into()))?
    }
}
