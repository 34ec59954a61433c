//! Deserialization tests for the inbound event union and frame decoding.

use tickertape::models::SubscribeDirective;
use tickertape::models::event::{MarketEvent, decode_frame};

#[test]
fn decodes_trade_event() {
    let json = r#"{"ev":"T","sym":"AAPL","p":189.42,"s":250,"x":4,"t":1706000000123}"#;

    let events = decode_frame(json).unwrap();
    assert_eq!(events.len(), 1);

    let MarketEvent::Trade(trade) = &events[0] else {
        panic!("expected trade event");
    };
    assert_eq!(trade.symbol, "AAPL");
    assert_eq!(trade.price, 189.42);
    assert_eq!(trade.size, 250);
    assert_eq!(trade.exchange, 4);
    assert_eq!(trade.timestamp, 1706000000123);
}

#[test]
fn decodes_aggregate_event() {
    let json = r#"{
        "ev": "AM",
        "sym": "MSFT",
        "o": 402.10,
        "c": 403.55,
        "h": 404.00,
        "l": 401.80,
        "v": 12000,
        "av": 8543000,
        "op": 400.25
    }"#;

    let events = decode_frame(json).unwrap();
    let MarketEvent::Aggregate(agg) = &events[0] else {
        panic!("expected aggregate event");
    };
    assert_eq!(agg.symbol, "MSFT");
    assert_eq!(agg.open, 402.10);
    assert_eq!(agg.close, 403.55);
    assert_eq!(agg.high, 404.00);
    assert_eq!(agg.low, 401.80);
    assert_eq!(agg.volume, 12000);
    assert_eq!(agg.accumulated_volume, 8543000);
    assert_eq!(agg.official_open, 400.25);
}

#[test]
fn aggregate_accepts_both_wire_tags() {
    let am = r#"{"ev":"AM","sym":"MSFT","o":1.0,"c":2.0,"h":3.0,"l":0.5,"v":10,"av":100,"op":1.5}"#;
    let a = r#"{"ev":"A","sym":"MSFT","o":1.0,"c":2.0,"h":3.0,"l":0.5,"v":10,"av":100,"op":1.5}"#;

    assert!(matches!(
        decode_frame(am).unwrap()[0],
        MarketEvent::Aggregate(_)
    ));
    assert!(matches!(
        decode_frame(a).unwrap()[0],
        MarketEvent::Aggregate(_)
    ));
}

#[test]
fn decodes_index_event_with_capital_t_ticker() {
    let json = r#"{"ev":"V","T":"I:SPX","val":4890.97,"t":1706000000500}"#;

    let events = decode_frame(json).unwrap();
    let MarketEvent::Index(index) = &events[0] else {
        panic!("expected index event");
    };
    assert_eq!(index.ticker, "I:SPX");
    assert_eq!(index.value, 4890.97);
    assert_eq!(index.timestamp, 1706000000500);
}

#[test]
fn unknown_discriminator_maps_to_ignored() {
    let json = r#"{"ev":"Q","sym":"AAPL","bp":189.40,"ap":189.44}"#;

    let events = decode_frame(json).unwrap();
    assert_eq!(events, vec![MarketEvent::Ignored]);
}

#[test]
fn decodes_batched_array_frame_in_order() {
    let json = r#"[
        {"ev":"T","sym":"AAPL","p":189.42,"s":100,"x":4,"t":1},
        {"ev":"V","T":"I:DJI","val":38000.1,"t":2},
        {"ev":"AM","sym":"AAPL","o":188.0,"c":189.5,"h":190.0,"l":187.5,"v":500,"av":9000,"op":188.2}
    ]"#;

    let events = decode_frame(json).unwrap();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], MarketEvent::Trade(_)));
    assert!(matches!(events[1], MarketEvent::Index(_)));
    assert!(matches!(events[2], MarketEvent::Aggregate(_)));
}

#[test]
fn malformed_element_is_skipped_without_poisoning_the_batch() {
    let json = r#"[
        {"ev":"T","sym":"AAPL","p":"not a price","s":100,"x":4,"t":1},
        {"ev":"T","sym":"MSFT","p":403.1,"s":50,"x":11,"t":2}
    ]"#;

    let events = decode_frame(json).unwrap();
    assert_eq!(events.len(), 1);
    let MarketEvent::Trade(trade) = &events[0] else {
        panic!("expected trade event");
    };
    assert_eq!(trade.symbol, "MSFT");
}

#[test]
fn rejects_non_json_frame() {
    assert!(decode_frame("not json at all").is_err());
}

#[test]
fn rejects_scalar_frame() {
    assert!(decode_frame("42").is_err());
}

#[test]
fn subscribe_directive_serializes_to_ticker_object() {
    let directive = SubscribeDirective::new("AAPL");

    let json = serde_json::to_string(&directive).expect("Failed to serialize directive");
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("Failed to parse serialized JSON");

    assert_eq!(value, serde_json::json!({ "ticker": "AAPL" }));
}
