use std::sync::Arc;
use std::time::Duration;

use completion_bridge::{
    bridge, Bridge, BridgeConfig, BridgeError, Checked, MisuseKind, RecordingSink, Response,
    Resumer,
};

mod utils;
use utils::complete_later;

// a completion handler API reporting an optional value and an optional error
fn fetch_optional<F>(value: Option<u32>, error: Option<&'static str>, on_complete: F)
where
    F: FnOnce(Option<u32>, Option<&'static str>) + Send + 'static,
{
    complete_later(Duration::from_millis(1), move || on_complete(value, error));
}

#[test]
fn optional_value_only() {
    let bridge: Bridge<u32, &str> = bridge(|resumer| {
        fetch_optional(Some(1), None, resumer.optional_handler());
    });
    assert_eq!(bridge.wait(), Ok(1));
}

#[test]
fn optional_error_wins() {
    let both: Bridge<u32, &str> = bridge(|resumer| {
        fetch_optional(Some(1), Some("partial"), resumer.optional_handler());
    });
    assert_eq!(both.wait(), Err(BridgeError::Failed("partial")));

    let error_only: Bridge<u32, &str> = bridge(|resumer| {
        resumer.resume_optional(None, Some("denied"));
    });
    assert_eq!(error_only.wait(), Err(BridgeError::Failed("denied")));
}

#[test]
fn optional_missing_result() {
    let unchecked: Bridge<u32, &str> = bridge(|resumer| {
        fetch_optional(None, None, resumer.optional_handler());
    });
    assert_eq!(unchecked.wait(), Err(BridgeError::MissingResult));

    let sink = Arc::new(RecordingSink::new());
    let checked: Bridge<u32, &str, Checked> = BridgeConfig::new()
        .shared_sink(sink.clone())
        .bridge(|resumer| {
            assert!(resumer.resume_optional(None, None));
        });
    assert_eq!(checked.wait(), Err(BridgeError::MissingResult));
    // a missing result is delivered as an error, not reported as misuse
    assert!(sink.is_empty());
}

#[test]
fn response_keeps_value_on_error() {
    let bridge: Bridge<Response<Vec<u8>, String>> = bridge(|resumer| {
        let handler = resumer.response_handler();
        complete_later(Duration::from_millis(1), move || {
            handler(Some(vec![1, 2]), Some("truncated".to_owned()))
        });
    });
    let (value, result) = bridge.wait().unwrap().split();
    assert_eq!(value, Some(vec![1, 2]));
    assert_eq!(result, Err("truncated".to_owned()));
}

#[test]
fn response_without_error() {
    let bridge: Bridge<Response<u8, ()>> = bridge(|resumer| {
        resumer.resume_response(Some(4), None);
    });
    let response = bridge.wait().unwrap();
    assert_eq!(response.into_parts(), (Some(4), None));
}

#[test]
fn returning_handler() {
    let bridge: Bridge<String> = bridge(|resumer| {
        let handler = resumer.returning_handler();
        complete_later(Duration::from_millis(1), move || handler("ok".to_owned()));
    });
    assert_eq!(bridge.wait(), Ok("ok".to_owned()));
}

#[test]
fn positional_pair() {
    let bridge: Bridge<(u8, u16)> = bridge(|resumer: Resumer<(u8, u16)>| {
        let handler = resumer.values_handler();
        complete_later(Duration::from_millis(1), move || handler(1, 2));
    });
    assert_eq!(bridge.wait(), Ok((1, 2)));
}

#[test]
fn positional_triple_error() {
    let bridge: Bridge<(u8, bool, char), &str> =
        bridge(|resumer: Resumer<(u8, bool, char), &str>| {
            resumer.resume_throwing("offline");
        });
    assert_eq!(bridge.wait(), Err(BridgeError::Failed("offline")));
}

#[test]
fn positional_order() {
    let four: Bridge<(u8, u8, u8, u8)> = bridge(|resumer: Resumer<(u8, u8, u8, u8)>| {
        resumer.resume_values(1, 2, 3, 4);
    });
    assert_eq!(four.wait(), Ok((1, 2, 3, 4)));

    let five: Bridge<(u8, u8, u8, u8, u8)> = bridge(|resumer: Resumer<(u8, u8, u8, u8, u8)>| {
        let handler = resumer.values_handler();
        complete_later(Duration::from_millis(1), move || handler(1, 2, 3, 4, 5));
    });
    assert_eq!(five.wait(), Ok((1, 2, 3, 4, 5)));

    let six: Bridge<(u8, &str, u8, &str, u8, &str)> =
        bridge(|resumer: Resumer<(u8, &str, u8, &str, u8, &str)>| {
            resumer.resume_values(1, "a", 2, "b", 3, "c");
        });
    assert_eq!(six.wait(), Ok((1, "a", 2, "b", 3, "c")));
}

#[test]
fn positional_double_call_reported() {
    let sink = Arc::new(RecordingSink::new());
    let bridge: Bridge<(u8, u8), (), Checked> = BridgeConfig::new()
        .label("pair")
        .shared_sink(sink.clone())
        .bridge(|resumer: Resumer<(u8, u8), (), Checked>| {
            let handler = resumer.values_handler();
            handler(1, 2);
            handler(3, 4);
        });
    assert_eq!(bridge.wait(), Ok((1, 2)));
    assert_eq!(sink.count(MisuseKind::DoubleResume), 1);
}
