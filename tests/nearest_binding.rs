//! Replay of a mark resolves every element exactly like the live source,
//! whatever the nesting of declarations, re-declarations and un-bindings.

use proptest::prelude::*;
use streambuffer::{EventKind, EventSource, StreamBuffer, XmlReader};

/// Per element: default namespace declaration (0 = un-bind) and `p` declaration
type Level = (Option<u8>, Option<u8>);

fn document(levels: &[Level]) -> String {
    let mut xml = String::new();
    for (i, (default, p)) in levels.iter().enumerate() {
        xml.push_str(&format!("<e{i}"));
        match default {
            Some(0) => xml.push_str(" xmlns=''"),
            Some(n) => xml.push_str(&format!(" xmlns='urn:d{n}'")),
            None => {}
        }
        if let Some(n) = p {
            xml.push_str(&format!(" xmlns:p='urn:p{n}'"));
        }
        xml.push('>');
    }
    for i in (0..levels.len()).rev() {
        xml.push_str(&format!("</e{i}>"));
    }
    xml
}

/// (element uri, binding of `p`) for each start element at or below `from`
fn live_resolutions(xml: &str, from: usize) -> Vec<(Option<String>, Option<String>)> {
    let mut reader = XmlReader::new(xml);
    let mut out = Vec::new();
    while reader.next_event().unwrap() != EventKind::EndDocument {
        if reader.event_kind() == EventKind::StartElement && reader.depth() > from {
            out.push((
                reader.namespace_uri().unwrap().map(str::to_string),
                reader.namespace_uri_for_prefix("p").map(str::to_string),
            ));
        }
    }
    out
}

fn levels() -> impl Strategy<Value = (Vec<Level>, usize)> {
    prop::collection::vec((prop::option::of(0u8..3), prop::option::of(1u8..3)), 2..7)
        .prop_flat_map(|levels| {
            let n = levels.len();
            (Just(levels), 1..n)
        })
}

proptest! {
    #[test]
    fn test_mark_replay_matches_live_resolution((levels, at) in levels()) {
        let xml = document(&levels);
        let expected = live_resolutions(&xml, at);

        let mut source = XmlReader::new(&xml);
        while source.depth() < at || source.event_kind() != EventKind::StartElement {
            source.next_event().unwrap();
        }
        let snapshot = source.inscope_namespaces();
        source.next_event().unwrap();
        let mark = StreamBuffer::create_mark(snapshot, &mut source).unwrap();

        let mut replay = mark.reader();
        let mut actual = Vec::new();
        while replay.next_event().unwrap() != EventKind::EndDocument {
            if replay.event_kind() == EventKind::StartElement {
                actual.push((
                    replay.namespace_uri().unwrap().map(str::to_string),
                    replay.namespace_uri_for_prefix("p").map(str::to_string),
                ));
            }
        }
        prop_assert_eq!(actual, expected);
    }
}
