// In: src/itch/tests.rs

use std::io::Cursor;

use super::*;
use crate::config::FeedConfig;
use crate::error::TaqError;

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn prefix(tag: u8) -> Vec<u8> {
    let mut p = vec![tag];
    p.extend_from_slice(&1u16.to_be_bytes());
    p.extend_from_slice(&2u16.to_be_bytes());
    p.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0xF4]);
    p
}

fn add_order_payload() -> Vec<u8> {
    let mut p = prefix(b'A');
    p.extend_from_slice(&42u64.to_be_bytes());
    p.push(b'B');
    p.extend_from_slice(&100u32.to_be_bytes());
    p.extend_from_slice(b"AAPL    ");
    p.extend_from_slice(&1_234_500u32.to_be_bytes());
    p
}

fn system_event_payload() -> Vec<u8> {
    let mut p = prefix(b'S');
    p.push(b'O');
    p
}

fn decode_all(bytes: Vec<u8>, config: FeedConfig) -> (Vec<Result<BinaryMessage, TaqError>>, FeedStats) {
    let mut decoder = MessageDecoder::new(Cursor::new(bytes), config);
    let items: Vec<_> = decoder.by_ref().collect();
    (items, decoder.stats())
}

#[test]
fn test_add_order_fields() {
    let (items, stats) = decode_all(frame(&add_order_payload()), FeedConfig::default());
    assert_eq!(items.len(), 1);

    let BinaryMessage::AddOrder(order) = items[0].as_ref().unwrap() else {
        panic!("expected an add order, got {:?}", items[0]);
    };
    assert_eq!(order.header.tag, 'A');
    assert_eq!(order.header.stock_locate, 1);
    assert_eq!(order.header.tracking_number, 2);
    assert_eq!(order.header.timestamp_ns, 500);
    assert_eq!(order.order_reference_number, 42);
    assert_eq!(order.buy_sell_indicator, 'B');
    assert_eq!(order.shares, 100);
    assert_eq!(order.stock.as_str(), "AAPL");
    assert_eq!(order.price.to_f64(), 123.45);
    assert_eq!(stats.messages, 1);
}

#[test]
fn test_layout_table_matches_message_set() {
    let expected: &[(u8, usize)] = &[
        (b'S', 12), (b'R', 39), (b'H', 25), (b'Y', 20), (b'L', 26), (b'V', 35), (b'W', 12),
        (b'K', 28), (b'A', 36), (b'F', 40), (b'E', 31), (b'C', 36), (b'X', 23), (b'D', 19),
        (b'U', 35), (b'P', 44), (b'Q', 40), (b'B', 19), (b'I', 50),
    ];
    assert_eq!(MESSAGE_LAYOUTS.len(), expected.len());
    for &(tag, len) in expected {
        let layout = layout_for(tag).unwrap();
        assert_eq!(layout.len, len, "tag {}", tag as char);
    }
    assert!(layout_for(b'Z').is_none());
}

#[test]
fn test_every_layout_consumes_its_whole_payload() {
    for layout in MESSAGE_LAYOUTS {
        let mut payload = prefix(layout.tag);
        payload.resize(layout.len, b' ');
        let message = layout.decode(&payload).unwrap();
        assert_eq!(message.tag(), layout.tag);
        assert_eq!(message.header().unwrap().timestamp_ns, 500);
        assert!(payload.len() > HEADER_LEN);
    }
}

#[test]
fn test_unknown_and_empty_frames_are_skipped() {
    let mut bytes = frame(b"Zjunk");
    bytes.extend(frame(&[]));
    bytes.extend(frame(&system_event_payload()));

    let (items, stats) = decode_all(bytes, FeedConfig::default());
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Ok(BinaryMessage::SystemEvent(ref e)) if e.event_code == 'O'));
    assert_eq!(
        stats,
        FeedStats {
            frames: 3,
            messages: 1,
            skipped_unknown: 1,
            skipped_empty: 1,
        }
    );
}

#[test]
fn test_unknown_frames_can_be_emitted() {
    let config = FeedConfig {
        emit_unrecognized: true,
        ..Default::default()
    };
    let (items, _) = decode_all(frame(b"Zjunk"), config);
    match items[0].as_ref().unwrap() {
        BinaryMessage::Unrecognized { tag, payload } => {
            assert_eq!(*tag, b'Z');
            assert_eq!(payload, b"Zjunk");
        }
        other => panic!("expected unrecognized, got {:?}", other),
    }
}

#[test]
fn test_truncated_length_prefix() {
    let mut bytes = frame(&system_event_payload());
    bytes.push(0x00);
    let (items, _) = decode_all(bytes, FeedConfig::default());
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(
        items[1],
        Err(TaqError::TruncatedFrame { expected: 2, actual: 1 })
    ));
}

#[test]
fn test_truncated_payload() {
    let mut bytes = frame(&add_order_payload());
    bytes.truncate(bytes.len() - 4);
    let (items, stats) = decode_all(bytes, FeedConfig::default());
    assert_eq!(items.len(), 1);
    assert!(matches!(
        items[0],
        Err(TaqError::TruncatedFrame { expected: 36, actual: 32 })
    ));
    assert_eq!(stats.messages, 0);
}

#[test]
fn test_known_tag_with_wrong_length_is_malformed() {
    let mut payload = add_order_payload();
    payload.push(0);
    let mut bytes = frame(&payload);
    bytes.extend(frame(&system_event_payload()));

    let (items, _) = decode_all(bytes, FeedConfig::default());
    assert_eq!(items.len(), 1);
    assert!(matches!(
        items[0],
        Err(TaqError::MalformedMessage { tag: 'A', expected: 36, actual: 37 })
    ));
}

#[test]
fn test_empty_input_yields_nothing() {
    let (items, stats) = decode_all(Vec::new(), FeedConfig::default());
    assert!(items.is_empty());
    assert_eq!(stats, FeedStats::default());
}

#[test]
fn test_json_output() {
    let (items, _) = decode_all(frame(&add_order_payload()), FeedConfig::default());
    let json: serde_json::Value =
        serde_json::from_str(&items[0].as_ref().unwrap().to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "AddOrder");
    assert_eq!(json["tag"], "A");
    assert_eq!(json["stock"], "AAPL");
    assert_eq!(json["price"], 123.45);
    assert_eq!(json["timestamp_ns"], 500);
}
