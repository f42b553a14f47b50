use std::sync::Arc;
use std::time::Duration;

use framepack::Decoder;
use framepack::Encoder;

use crate::*;
use crate::translate::DefaultErrorMapper;
use crate::translate::TableErrorMapper;

fn foo_call(seq: u32) -> Call {
    Call::new("localhost:4040", "foo", "FooService::doBar", seq)
}

// ============================================================================
//  1. RELAY HANDOFF
// ============================================================================

#[tokio::test]
async fn test_deliver_then_retrieve_returns_same_frame() -> Result<()> {
    let relay = FrameRelay::new(foo_call(1));
    let frame = ResponseFrame::reply(b"hello".to_vec());

    relay.deliver_frame(frame.clone())?;
    assert!(relay.is_filled());
    assert_eq!(relay.retrieve_frame().await?, frame);
    Ok(())
}

#[tokio::test]
async fn test_reader_waits_for_late_delivery() -> Result<()> {
    let relay = Arc::new(FrameRelay::new(foo_call(1)));

    let reader = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.retrieve_frame().await })
    };

    // give the reader a chance to park on the empty slot
    tokio::task::yield_now().await;
    assert!(!reader.is_finished());

    relay.deliver_frame(ResponseFrame::reply(b"late".to_vec()))?;
    let frame = reader.await.expect("reader panicked")?;
    assert_eq!(frame.payload, b"late");
    Ok(())
}

#[tokio::test]
async fn test_empty_relay_does_not_resolve() {
    let relay = FrameRelay::new(foo_call(1));
    let waited = tokio::time::timeout(Duration::from_millis(20), relay.retrieve_frame()).await;
    assert!(waited.is_err(), "retrieve_frame resolved without a delivery");
}

#[tokio::test]
async fn test_second_retrieve_is_usage_error() -> Result<()> {
    let relay = FrameRelay::new(foo_call(1));
    relay.deliver_frame(ResponseFrame::reply(Vec::new()))?;
    relay.retrieve_frame().await?;

    match relay.retrieve_frame().await {
        Err(Error::Usage(_)) => Ok(()),
        other => panic!("Expected Usage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_second_delivery_is_usage_error_and_keeps_first() -> Result<()> {
    let relay = FrameRelay::new(foo_call(1));
    relay.deliver_frame(ResponseFrame::reply(b"first".to_vec()))?;

    let second = relay.deliver_frame(ResponseFrame::reply(b"second".to_vec()));
    assert!(matches!(second, Err(Error::Usage(_))));

    assert_eq!(relay.retrieve_frame().await?.payload, b"first");
    Ok(())
}

#[tokio::test]
async fn test_closed_relay_wakes_reader() {
    let relay = Arc::new(FrameRelay::new(foo_call(1)));
    let reader = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.retrieve_frame().await })
    };
    tokio::task::yield_now().await;

    relay.close();
    let result = reader.await.expect("reader panicked");
    assert!(matches!(result, Err(Error::Closed)));
    assert!(matches!(relay.deliver_frame(ResponseFrame::reply(Vec::new())), Err(Error::Usage(_))));
}

// ============================================================================
//  2. FRAMED PAYLOADS
// ============================================================================

#[test]
fn test_framed_layout_matches_byte_primitives() -> Result<()> {
    let framed = encode_framed("FooService::doBar", MessageType::Reply, 42, b"hello")?;

    let mut enc = Encoder::new();
    enc.str("FooService::doBar")?;
    enc.u8(MessageType::Reply.as_tag());
    enc.u32(42);
    let header = enc.into_bytes();

    assert_eq!(&framed[..header.len()], header.as_slice());
    assert_eq!(&framed[header.len()..], b"hello");
    Ok(())
}

#[test]
fn test_decoder_reads_metadata_first() -> Result<()> {
    let framed = encode_framed("FooService::doBar", MessageType::Reply, 42, b"hello")?;

    let mut dec = Decoder::new(&framed);
    assert_eq!(dec.str()?, "FooService::doBar");
    assert_eq!(MessageType::from_tag(dec.u8()?), Some(MessageType::Reply));
    assert_eq!(dec.u32()?, 42);
    assert_eq!(dec.rest(), b"hello");
    Ok(())
}

#[test]
fn test_framed_message_decode() -> Result<()> {
    let framed = encode_framed("Svc::m", MessageType::Error, 7, &[])?;
    let msg = FramedMessage::decode(&framed)?;

    assert_eq!(msg.endpoint, "Svc::m");
    assert_eq!(msg.message_type, MessageType::Error);
    assert_eq!(msg.seq, 7);
    assert!(msg.payload.is_empty());
    assert_eq!(msg.encode()?, framed);
    Ok(())
}

#[test]
fn test_framed_message_rejects_unknown_type_tag() {
    let mut enc = Encoder::new();
    enc.str("Svc::m").unwrap();
    enc.u8(0x42);
    enc.u32(1);
    let bytes = enc.into_bytes();

    assert!(matches!(FramedMessage::decode(&bytes), Err(Error::Protocol(_))));
}

#[test]
fn test_unframed_payload_is_rejected() {
    assert!(matches!(FramedMessage::decode(b"hello"), Err(Error::Pack(_))));
    assert!(matches!(
        FramedMessage::decode(&[]),
        Err(Error::Pack(framepack::Error::UnexpectedEnd))
    ));
}

#[tokio::test]
async fn test_read_frame_prefixes_reply() -> Result<()> {
    let relay = FrameRelay::new(foo_call(42));
    relay.deliver_frame(ResponseFrame::reply(b"hello".to_vec()))?;

    let bytes = relay.read_frame().await?;
    assert_eq!(bytes, encode_framed("FooService::doBar", MessageType::Reply, 42, b"hello")?);
    Ok(())
}

// ============================================================================
//  3. ERROR TRANSLATION
// ============================================================================

#[test]
fn test_translate_error_carries_text() -> Result<()> {
    let frame = ResponseFrame::error(ErrorCode::Timeout, "timeout");
    let err = translate_error(&frame)?;
    assert_eq!(err.message, "timeout");
    assert_eq!(err.kind, ApplicationErrorKind::Unknown);
    Ok(())
}

#[test]
fn test_translate_error_without_text() -> Result<()> {
    let frame = ResponseFrame {
        message_type: MessageType::Error,
        payload: Vec::new(),
        error_text: None,
        error_code: None,
    };
    assert_eq!(translate_error(&frame)?.message, "");
    Ok(())
}

#[test]
fn test_translate_rejects_reply_frame() {
    let frame = ResponseFrame::reply(b"ok".to_vec());
    assert!(matches!(translate_error(&frame), Err(Error::Usage(_))));
}

#[test]
fn test_table_mapper() -> Result<()> {
    let mapper = TableErrorMapper::new()
        .map(ErrorCode::BadRequest, ApplicationErrorKind::ProtocolError)
        .fallback(ApplicationErrorKind::InternalError);

    let bad = ResponseFrame::error(ErrorCode::BadRequest, "bad");
    let busy = ResponseFrame::error(ErrorCode::Busy, "busy");
    let uncoded = ResponseFrame {
        message_type: MessageType::Error,
        payload: Vec::new(),
        error_text: Some("no code".into()),
        error_code: None,
    };

    let kind = |frame: &ResponseFrame| translate_error_with(frame, &mapper).map(|e| e.kind);
    assert_eq!(kind(&bad)?, ApplicationErrorKind::ProtocolError);
    assert_eq!(kind(&busy)?, ApplicationErrorKind::InternalError);

    // a frame without a code falls back too, and keeps its text
    assert_eq!(kind(&uncoded)?, ApplicationErrorKind::InternalError);
    assert_eq!(translate_error_with(&uncoded, &mapper)?.message, "no code");

    let unknown = translate_error_with(&busy, &DefaultErrorMapper)?;
    assert_eq!(unknown, ApplicationError::new(ApplicationErrorKind::Unknown, "busy"));
    Ok(())
}

#[tokio::test]
async fn test_read_frame_translates_error_frame() {
    let mapper =
        TableErrorMapper::new().map(ErrorCode::Timeout, ApplicationErrorKind::InternalError);
    let relay = FrameRelay::with_mapper(foo_call(3), Arc::new(mapper));
    relay.deliver_frame(ResponseFrame::error(ErrorCode::Timeout, "timeout")).unwrap();

    match relay.read_frame().await {
        Err(Error::Application(e)) => {
            assert_eq!(e.kind, ApplicationErrorKind::InternalError);
            assert_eq!(e.message, "timeout");
        }
        other => panic!("Expected Application error, got {:?}", other),
    }
}

// ============================================================================
//  4. WIRE TAGS
// ============================================================================

#[test]
fn test_tags_roundtrip() {
    for ty in [MessageType::Reply, MessageType::Error] {
        assert_eq!(MessageType::from_tag(ty.as_tag()), Some(ty));
    }
    assert_eq!(MessageType::from_tag(0x01), None);

    for code in [ErrorCode::Timeout, ErrorCode::Unhealthy, ErrorCode::FatalProtocolError] {
        assert_eq!(ErrorCode::from_u8(code as u8), Some(code));
    }
    assert_eq!(ErrorCode::from_u8(0x09), None);
}
