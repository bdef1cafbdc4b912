use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chunked_json::{
    json_enum, json_object, to_string, to_string_with_options, to_value, to_vec_with_options,
    to_writer_with_options, write_to_completion, BufferSink, Bytes, Completion, Error, EscapeMode,
    JsonWrite, Streamed, StreamedObject, Utf16, WriterOptions, WriterState,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;

/// Drives `value` to completion through a sink of the given soft capacity.
fn drive<T: JsonWrite + ?Sized>(
    value: &T,
    capacity: usize,
    options: WriterOptions,
) -> (Vec<u8>, Completion) {
    let mut sink = BufferSink::with_capacity(Vec::new(), capacity);
    let mut state = WriterState::new(&mut sink, options);
    let completion = write_to_completion(value, &mut state).unwrap();
    state.flush().unwrap();
    drop(state);
    (sink.into_inner(), completion)
}

/// Deterministic byte generator, so failures reproduce.
fn pseudo_random_bytes(len: usize, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as u8
        })
        .collect()
}

struct Pair {
    a: String,
    b: Vec<i32>,
}

json_object!(Pair { a, b });

#[test]
fn test_fifty_thousand_quotes() {
    let text = "\"".repeat(50_000);
    let options = WriterOptions::new().with_chunk_size(2048);
    let (out, completion) = drive(&text, 600, options);

    let expected = format!("\"{}\"", "\\\"".repeat(50_000));
    assert_eq!(out.len(), expected.len());
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert!(completion.calls > 100);
}

#[test]
fn test_five_thousand_random_bytes() {
    let data = pseudo_random_bytes(5_000, 0x5eed);
    let (out, completion) = drive(&Bytes(&data), 700, WriterOptions::new());

    assert!(completion.flushes > 1);
    assert_eq!(out.first(), Some(&b'"'));
    assert_eq!(out.last(), Some(&b'"'));
    let decoded = STANDARD.decode(&out[1..out.len() - 1]).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn test_object_with_five_byte_sink() {
    let pair = Pair {
        a: "abcdefghij".to_string(),
        b: vec![1, 2, 3],
    };
    let single_call = to_string(&pair).unwrap();
    assert_eq!(single_call, r#"{"a":"abcdefghij","b":[1,2,3]}"#);

    let (out, completion) = drive(&pair, 5, WriterOptions::new().with_flush_threshold(5));
    assert!(completion.calls > 1);
    assert_eq!(String::from_utf8(out).unwrap(), single_call);
}

/// Keeps every chunk handed over by a flush separately.
#[derive(Default)]
struct Flushes(Vec<Vec<u8>>);

impl io::Write for Flushes {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_object_under_five_byte_hard_limit() {
    let pair = Pair {
        a: "abcdefghij".to_string(),
        b: vec![1, 2, 3],
    };
    let options = WriterOptions::new()
        .with_buffer_capacity(5)
        .with_max_buffer(5)
        .with_flush_threshold(5);

    let mut flushes = Flushes::default();
    to_writer_with_options(&mut flushes, &pair, options.clone()).unwrap();
    assert!(flushes.0.iter().all(|chunk| chunk.len() <= 5));
    assert_eq!(
        flushes.0.concat(),
        br#"{"a":"abcdefghij","b":[1,2,3]}"#.to_vec()
    );
    assert_eq!(
        to_string_with_options(&pair, options).unwrap(),
        to_string(&pair).unwrap()
    );
}

#[test]
fn test_hard_limit_only_fails_for_oversized_tokens() {
    let limited = WriterOptions::new().with_max_buffer(8);
    let text = "abcdefghij".to_string();
    assert_eq!(
        to_vec_with_options(&text, limited.clone()).unwrap(),
        b"\"abcdefghij\"".to_vec()
    );

    let err = to_vec_with_options(&u64::MAX, limited).unwrap_err();
    assert!(matches!(
        err,
        Error::CapacityExhausted {
            requested: 20,
            limit: 8
        }
    ));
}

#[test]
fn test_empty_values_complete_in_one_call() {
    for capacity in [1, 2, 1024] {
        let (out, completion) = drive("", capacity, WriterOptions::new());
        assert_eq!((out.as_slice(), completion.calls), (&b"\"\""[..], 1));

        let (out, completion) = drive(&Vec::<u8>::new(), capacity, WriterOptions::new());
        assert_eq!((out.as_slice(), completion.calls), (&b"[]"[..], 1));

        let (out, completion) = drive(&Bytes(Vec::new()), capacity, WriterOptions::new());
        assert_eq!((out.as_slice(), completion.calls), (&b"\"\""[..], 1));
    }
}

#[test]
fn test_collection_reentered_once_per_element() {
    const K: usize = 64;
    let items: Vec<String> = (0..K).map(|i| format!("element-{}", i)).collect();
    let (unbounded, completion) = drive(&items, 1 << 20, WriterOptions::new());
    assert_eq!(completion.calls, 1);

    let (bounded, completion) = drive(&items, 1, WriterOptions::new());
    assert!(completion.calls >= K);
    assert_eq!(bounded, unbounded);
}

#[test]
fn test_different_value_while_suspended_is_protocol_violation() {
    let first = "first ".repeat(100);
    let second = "second ".repeat(100);
    let mut sink = BufferSink::with_capacity(Vec::new(), 8);
    let mut state = WriterState::new(&mut sink, WriterOptions::new());

    assert!(!first.write_json(&mut state).unwrap());
    assert!(state.is_suspended());
    let err = second.write_json(&mut state).unwrap_err();
    assert!(err.is_protocol());

    state.reset();
    assert!(!state.is_suspended());
    while !second.write_json(&mut state).unwrap() {
        state.flush().unwrap();
    }
}

#[test]
fn test_kind_mismatch_is_protocol_violation() {
    let text = "x".repeat(100);
    let items = vec![1u8; 100];
    let mut sink = BufferSink::with_capacity(Vec::new(), 4);
    let mut state = WriterState::new(&mut sink, WriterOptions::new());

    assert!(!text.write_json(&mut state).unwrap());
    let err = items.write_json(&mut state).unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[test]
fn test_utf16_surrogate_pair_across_flushes() {
    let source = "😀a😀b".repeat(300);
    let units = Utf16::from(source.as_str());
    for capacity in [1, 7, 33] {
        let options = WriterOptions::new().with_chunk_size(5);
        let (out, _) = drive(&units, capacity, options);
        assert_eq!(String::from_utf8(out).unwrap(), to_string(&source).unwrap());
    }
}

#[test]
fn test_unpaired_surrogate() {
    let lone = Utf16(vec![0x61, 0xd800]);
    let err = to_string(&lone).unwrap_err();
    assert!(err.is_encoding());

    let options = WriterOptions::new().with_allow_lone_surrogates(true);
    assert_eq!(to_string_with_options(&lone, options).unwrap(), r#""a\ud800""#);
}

#[test]
fn test_escape_modes() {
    let text = "<a href='x'>café</a>\u{2028}";
    assert_eq!(to_string(text).unwrap(), "\"<a href='x'>café</a>\u{2028}\"");

    let html = WriterOptions::new().with_escape_mode(EscapeMode::Html);
    assert_eq!(
        to_string_with_options(text, html).unwrap(),
        r#""\u003ca href=\u0027x\u0027\u003ecafé\u003c/a\u003e\u2028""#
    );

    let ascii = WriterOptions::new().with_escape_mode(EscapeMode::Ascii);
    let out = to_string_with_options(text, ascii).unwrap();
    assert!(out.is_ascii());
    assert_eq!(out, r#""<a href='x'>caf\u00e9</a>\u2028""#);
}

#[test]
fn test_streamed_rows() {
    let rows = Streamed::new((0..500).map(|i| vec![i, i * 2]));
    let (out, completion) = drive(&rows, 16, WriterOptions::new());
    assert!(completion.calls >= 500);

    let parsed: Vec<Vec<i32>> = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed.len(), 500);
    assert_eq!(parsed[499], vec![499, 998]);
}

#[test]
fn test_borrowed_one_pass_sources() {
    let mut inventory = BTreeMap::new();
    inventory.insert("bolts".to_string(), vec![4u32, 8]);
    inventory.insert("nuts".to_string(), vec![16]);

    let object = StreamedObject::new(inventory.iter().filter(|(_, sizes)| sizes.len() > 1));
    let (out, _) = drive(&object, 3, WriterOptions::new());
    assert_eq!(out, br#"{"bolts":[4,8]}"#.to_vec());

    let keys = Streamed::new(inventory.keys());
    let (out, _) = drive(&keys, 1, WriterOptions::new());
    assert_eq!(out, br#"["bolts","nuts"]"#.to_vec());

    let (out, _) = drive(&inventory, 2, WriterOptions::new());
    assert_eq!(out, br#"{"bolts":[4,8],"nuts":[16]}"#.to_vec());
}

#[derive(Serialize)]
struct Order {
    order_id: u32,
    customer: String,
    items: Vec<Item>,
    attachment: serde_bytes_like::Blob,
}

#[derive(Serialize)]
struct Item {
    sku: String,
    price: f64,
    quantity: u32,
}

mod serde_bytes_like {
    use serde::{Serialize, Serializer};

    pub struct Blob(pub Vec<u8>);

    impl Serialize for Blob {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(&self.0)
        }
    }
}

#[test]
fn test_serde_value_through_small_sink() {
    let order = Order {
        order_id: 12345,
        customer: "Alice \"VIP\"".to_string(),
        items: (0..50)
            .map(|i| Item {
                sku: format!("SKU-{:03}", i),
                price: 9.5 + f64::from(i),
                quantity: i,
            })
            .collect(),
        attachment: serde_bytes_like::Blob(pseudo_random_bytes(300, 7)),
    };
    let value = to_value(&order).unwrap();
    let expected = to_string(&value).unwrap();

    let (out, _) = drive(&value, 9, WriterOptions::new());
    assert_eq!(String::from_utf8(out).unwrap(), expected);

    let parsed: serde_json::Value = serde_json::from_str(&expected).unwrap();
    assert_eq!(parsed["customer"], "Alice \"VIP\"");
    assert_eq!(parsed["items"][49]["sku"], "SKU-049");
    let blob = parsed["attachment"].as_str().unwrap();
    assert_eq!(STANDARD.decode(blob).unwrap(), pseudo_random_bytes(300, 7));
}

#[derive(Clone, Copy)]
enum Status {
    Active,
    Suspended,
}

json_enum!(Status { Active => "active", Suspended => "suspended" });

struct Account {
    id: u64,
    status: Status,
    note: Option<String>,
}

json_object!(Account { id, status, note as "comment" });

#[test]
fn test_typed_objects_and_enums() {
    let accounts = vec![
        Account {
            id: 1,
            status: Status::Active,
            note: None,
        },
        Account {
            id: 2,
            status: Status::Suspended,
            note: Some("overdue".to_string()),
        },
    ];
    let expected = concat!(
        r#"[{"id":1,"status":"active","comment":null},"#,
        r#"{"id":2,"status":"suspended","comment":"overdue"}]"#
    );
    assert_eq!(to_string(&accounts).unwrap(), expected);
    let (out, _) = drive(&accounts, 3, WriterOptions::new());
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_to_writer_with_file_like_sink() {
    let text = "line\n".repeat(10_000);
    let mut out = Vec::new();
    let options = WriterOptions::new().with_buffer_capacity(1024);
    to_writer_with_options(&mut out, &text, options).unwrap();
    let parsed: String = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed, text);
}
