//! Value lookup against a typed mirror.
//!
//! Erased payload equality must behave exactly like `PartialEq` on the
//! concrete types: first match wins, equal-looking values of different
//! types never match, and removal by value drops exactly the first match.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use medley::Medley;
use medley::testing::{CounterConverter, LabelConverter, StubEnv, StubView};

#[derive(Debug, PartialEq)]
enum Row {
    Label(String),
    Counter(u32),
}

#[derive(Arbitrary, Debug)]
struct Input {
    rows: Vec<(bool, String, u32)>,
    probe_label: String,
    probe_counter: u32,
}

fuzz_target!(|input: Input| {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    let mut rows = Vec::new();

    for (is_label, text, n) in input.rows {
        if is_label {
            feed.append(LabelConverter::default(), text.clone()).unwrap();
            rows.push(Row::Label(text));
        } else {
            feed.append(CounterConverter::default(), n).unwrap();
            rows.push(Row::Counter(n));
        }
    }

    let label_pos = |rows: &[Row], probe: &str| {
        rows.iter()
            .position(|row| matches!(row, Row::Label(text) if text == probe))
    };
    let counter_pos = |rows: &[Row], probe: u32| {
        rows.iter()
            .position(|row| matches!(row, Row::Counter(n) if *n == probe))
    };

    assert_eq!(
        feed.index_of(&input.probe_label),
        label_pos(&rows, &input.probe_label)
    );
    assert_eq!(
        feed.index_of(&input.probe_counter),
        counter_pos(&rows, input.probe_counter)
    );
    // A counter whose digits spell the label probe still never matches it.
    if let Ok(n) = input.probe_label.parse::<u32>() {
        assert_eq!(feed.index_of(&n), counter_pos(&rows, n));
    }

    // Removing by value drops exactly the first match, or nothing.
    feed.remove_first_value(&input.probe_counter).unwrap();
    if let Some(position) = counter_pos(&rows, input.probe_counter) {
        rows.remove(position);
    }
    assert_eq!(feed.len(), rows.len());

    assert_eq!(
        feed.index_of(&input.probe_counter),
        counter_pos(&rows, input.probe_counter)
    );
    for (position, row) in rows.iter().enumerate() {
        match row {
            Row::Label(text) => assert_eq!(feed.data_at::<String>(position), Some(text)),
            Row::Counter(n) => assert_eq!(feed.data_at::<u32>(position), Some(n)),
        }
    }
});
