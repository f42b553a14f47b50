//! # Transport Abstraction
//!
//! Two layers live here:
//!
//! - `CallChannel`: the call/response network layer we sit on. It opens calls,
//!   assigns sequence ids, and eventually produces one `ResponseFrame` per call.
//!   It knows nothing about framed payloads.
//! - `FrameTransport`: what a byte-stream protocol client drives. It buffers
//!   writes for the current call, sends them on `flush`, and hands the reply back
//!   through the call's `FrameRelay`.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::message::Call;
use crate::message::ResponseFrame;
use crate::relay::FrameRelay;
use crate::translate::DefaultErrorMapper;
use crate::translate::ErrorMapper;

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer is unreachable or the connection was dropped.
    ConnectionLost(String),
    /// The operation timed out before a response was received.
    Timeout,
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// The call/response layer underneath the bridge.
///
/// This trait is designed to be object-safe (`Arc<dyn CallChannel>`).
#[async_trait::async_trait]
pub trait CallChannel: Send + Sync + 'static {
    /// Opens a logical call and assigns its sequence id.
    fn initiate(&self, hostport: &str, service: &str, endpoint: &str) -> Call;

    /// Sends the request body for `call` and waits for its response.
    ///
    /// # invariants
    /// - Must return exactly one complete frame on success.
    /// - Must return `Err` if the network fails.
    /// - Should not interpret the payload content.
    async fn call(&self, call: &Call, payload: Vec<u8>) -> Result<ResponseFrame>;
}

/// Per-transport state shared by every `FrameTransport`.
pub struct TransportState {
    hostport: String,
    service: String,
    channel: Arc<dyn CallChannel>,
    mapper: Arc<dyn ErrorMapper>,
    relay: Option<Arc<FrameRelay>>,
    buffer: Vec<u8>,
}

impl TransportState {
    pub fn new(
        hostport: impl Into<String>,
        service: impl Into<String>,
        channel: Arc<dyn CallChannel>,
    ) -> Self {
        Self {
            hostport: hostport.into(),
            service: service.into(),
            channel,
            mapper: Arc::new(DefaultErrorMapper),
            relay: None,
            buffer: Vec::new(),
        }
    }

    pub fn with_mapper(mut self, mapper: Arc<dyn ErrorMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn hostport(&self) -> &str {
        &self.hostport
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn channel(&self) -> &Arc<dyn CallChannel> {
        &self.channel
    }

    /// The relay of the current call.
    ///
    /// # Errors
    /// Returns `Error::Usage` if no call has been initiated.
    pub fn relay(&self) -> crate::Result<Arc<FrameRelay>> {
        self.relay.clone().ok_or_else(|| {
            Error::Usage("No call in progress; call init_call first".into())
        })
    }

    /// Bytes written since the current call was initiated.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Drains the write buffer.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    fn begin(&mut self, call: Call) -> Arc<FrameRelay> {
        // A relay that already holds a frame keeps it; close is a no-op then.
        if let Some(prev) = self.relay.take() {
            prev.close();
        }
        let relay = Arc::new(FrameRelay::with_mapper(call, self.mapper.clone()));
        self.relay = Some(relay.clone());
        self.buffer.clear();
        relay
    }
}

/// A byte-stream transport bridged onto a call/response channel.
///
/// Only whole frames can be read back: `read` and `recv_call` always fail.
/// `flush` must be supplied by a concrete transport; the provided one fails.
#[async_trait::async_trait]
pub trait FrameTransport: Send + Sync {
    fn state(&self) -> &TransportState;
    fn state_mut(&mut self) -> &mut TransportState;

    /// Opens a new call for `endpoint` and gives it a fresh relay.
    ///
    /// Any bytes buffered for a previous call are discarded. A reader still
    /// waiting on the previous call wakes up with `Error::Closed`.
    fn init_call(&mut self, endpoint: &str) -> Arc<FrameRelay> {
        let state = self.state_mut();
        let call = state.channel().initiate(state.hostport(), state.service(), endpoint);
        debug!(
            hostport = %call.hostport,
            service = %call.service,
            endpoint = %call.endpoint,
            seq = call.seq,
            "call initiated"
        );
        state.begin(call)
    }

    /// Appends request bytes for the current call.
    fn write(&mut self, bytes: &[u8]) -> crate::Result<()> {
        let state = self.state_mut();
        if state.relay.is_none() {
            return Err(Error::Usage("write() before init_call()".into()));
        }
        state.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// The relay of the current call, for readers running beside `flush`.
    fn relay(&self) -> crate::Result<Arc<FrameRelay>> {
        self.state().relay()
    }

    /// Sends the buffered request. Concrete transports must override this.
    async fn flush(&mut self) -> crate::Result<()> {
        Err(Error::Usage("flush() must be implemented by a concrete transport".into()))
    }

    /// Waits for the current call's response, framed for the decoder.
    async fn read_frame(&self) -> crate::Result<Vec<u8>> {
        let relay = self.relay()?;
        relay.read_frame().await
    }

    /// Partial reads are not supported; use `read_frame`.
    fn read(&mut self, _n: usize) -> crate::Result<Vec<u8>> {
        Err(Error::Usage("read() must not be called directly. Use read_frame().".into()))
    }

    /// Receiving calls is not supported; use `read_frame`.
    fn recv_call(&mut self) -> crate::Result<Call> {
        Err(Error::Usage("recv_call() is not supported. Use read_frame().".into()))
    }
}

/// The concrete transport: sends each call over a `CallChannel`.
pub struct ChannelTransport {
    state: TransportState,
}

impl ChannelTransport {
    pub fn new(state: TransportState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl FrameTransport for ChannelTransport {
    fn state(&self) -> &TransportState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TransportState {
        &mut self.state
    }

    /// Sends the buffered bytes and delivers the response into the call's relay.
    ///
    /// Transport failures are returned unchanged and close the relay, so a
    /// concurrent reader sees `Error::Closed` instead of waiting forever.
    async fn flush(&mut self) -> crate::Result<()> {
        let relay = self.state.relay()?;
        if relay.is_filled() {
            return Err(Error::Usage(format!(
                "Call {} (seq {}) was already flushed",
                relay.call().endpoint, relay.call().seq
            )));
        }

        let payload = self.state.take_buffer();
        debug!(
            endpoint = %relay.call().endpoint,
            seq = relay.call().seq,
            len = payload.len(),
            "flushing call"
        );

        match self.state.channel().call(relay.call(), payload).await {
            Ok(frame) => relay.deliver_frame(frame),
            Err(e) => {
                relay.close();
                Err(Error::Transport(e))
            }
        }
    }
}

/// Fluent builder for a `ChannelTransport`.
pub struct TransportBuilder {
    hostport: String,
    service: String,
    mapper: Option<Arc<dyn ErrorMapper>>,
}

impl TransportBuilder {
    pub fn new(hostport: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            hostport: hostport.into(),
            service: service.into(),
            mapper: None,
        }
    }

    /// Sets how error frames are classified by `read_frame`.
    pub fn error_mapper(mut self, mapper: impl ErrorMapper) -> Self {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn build(self, channel: Arc<dyn CallChannel>) -> ChannelTransport {
        let mut state = TransportState::new(self.hostport, self.service, channel);
        if let Some(mapper) = self.mapper {
            state = state.with_mapper(mapper);
        }
        ChannelTransport::new(state)
    }
}
