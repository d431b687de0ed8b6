//! Event stream output and protocol log lines.

use chrono::{TimeZone, Utc};
use modular_input::{Event, EventWriter, ModularInputError, Severity, XmlNode, structurally_equal};
use pretty_assertions::assert_eq;

const EVENT_MAXIMAL_XML: &str = include_str!("data/event_maximal.xml");
const STREAM_WITH_TWO_EVENTS_XML: &str = include_str!("data/stream_with_two_events.xml");

const BROADCAST: &str = "This is a test of the emergency broadcast system.";

fn writer() -> EventWriter<Vec<u8>, Vec<u8>> {
    EventWriter::new(Vec::new(), Vec::new())
}

fn maximal_event(time: f64) -> Event {
    Event::new(BROADCAST)
        .with_stanza("fubar")
        .with_source("hilda")
        .with_sourcetype("misc")
        .with_index("main")
        .with_host("localhost")
        .with_time(time)
        .unbroken(true)
        .done(true)
}

fn output(ew: EventWriter<Vec<u8>, Vec<u8>>) -> (String, String) {
    let (out, err) = ew.into_inner();
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

// ── Events ───────────────────────────────────────────────────────

#[test]
fn minimal_event_has_only_data() {
    let mut ew = writer();
    ew.write_event(&Event::new(BROADCAST)).unwrap();
    ew.close().unwrap();

    let (out, err) = output(ew);
    assert_eq!(
        out,
        format!("<stream><event><data>{BROADCAST}</data></event></stream>")
    );
    assert_eq!(err, "");
}

#[test]
fn maximal_event_matches_reference() {
    let mut ew = writer();
    ew.write_event(&maximal_event(1372187084.0)).unwrap();

    let (out, _) = output(ew);
    let stream = XmlNode::parse(&format!("{out}</stream>")).unwrap();
    assert_eq!(stream.children.len(), 1);
    assert!(structurally_equal(
        &XmlNode::parse(EVENT_MAXIMAL_XML).unwrap(),
        &stream.children[0]
    ));
}

#[test]
fn stream_with_two_events_matches_reference() {
    let mut ew = writer();
    ew.write_event(
        &Event::new(BROADCAST)
            .with_stanza("fubar")
            .with_datetime(Utc.timestamp_opt(1372187084, 0).unwrap()),
    )
    .unwrap();
    ew.write_event(&maximal_event(1372274622.493)).unwrap();
    ew.close().unwrap();

    let (out, _) = output(ew);
    assert!(structurally_equal(
        &XmlNode::parse(STREAM_WITH_TWO_EVENTS_XML).unwrap(),
        &XmlNode::parse(&out).unwrap()
    ));
}

#[test]
fn event_text_is_escaped() {
    let mut ew = writer();
    ew.write_event(&Event::new("<tag> & \"quoted\"")).unwrap();
    ew.close().unwrap();

    let (out, _) = output(ew);
    let stream = XmlNode::parse(&out).unwrap();
    assert_eq!(
        stream.children[0].child("data").unwrap().text,
        "<tag> & \"quoted\""
    );
}

#[test]
fn missing_data_is_rejected_without_output() {
    let mut ew = writer();
    let err = ew
        .write_event(&Event::default().with_stanza("fubar"))
        .unwrap_err();

    assert!(matches!(err, ModularInputError::InvalidEvent(_)));
    let (out, _) = output(ew);
    assert_eq!(out, "");
}

#[test]
fn multi_part_events_carry_framing_attributes() {
    let mut ew = writer();
    ew.write_event(&Event::new("part one ").unbroken(true)).unwrap();
    ew.write_event(&Event::new("part two").unbroken(true).done(true))
        .unwrap();
    ew.close().unwrap();

    let (out, _) = output(ew);
    let stream = XmlNode::parse(&out).unwrap();
    assert_eq!(stream.children[0].attribute("unbroken"), Some("1"));
    assert_eq!(stream.children[0].attribute("done"), None);
    assert_eq!(stream.children[1].attribute("unbroken"), Some("1"));
    assert_eq!(stream.children[1].attribute("done"), Some("1"));
}

// ── Stream lifecycle ─────────────────────────────────────────────

#[test]
fn close_without_events_writes_empty_stream_once() {
    let mut ew = writer();
    ew.close().unwrap();
    ew.close().unwrap();

    let (out, _) = output(ew);
    assert_eq!(out, "<stream></stream>");
}

#[test]
fn stream_header_is_written_once() {
    let mut ew = writer();
    for i in 0..100 {
        ew.write_event(&Event::new(format!("line {i}"))).unwrap();
    }
    ew.close().unwrap();

    let (out, _) = output(ew);
    assert_eq!(out.matches("<stream>").count(), 1);
    assert_eq!(out.matches("</stream>").count(), 1);
    assert_eq!(XmlNode::parse(&out).unwrap().children.len(), 100);
}

// ── Logging ──────────────────────────────────────────────────────

#[test]
fn log_writes_severity_prefixed_lines() {
    let mut ew = writer();
    ew.log(Severity::Info, "starting up").unwrap();
    ew.log(Severity::Error, "Something happened!").unwrap();

    let (out, err) = output(ew);
    assert_eq!(out, "");
    assert_eq!(err, "INFO starting up\nERROR Something happened!\n");
}

#[test]
fn log_does_not_touch_the_event_stream() {
    let mut ew = writer();
    ew.write_event(&Event::new("one")).unwrap();
    ew.log(Severity::Warn, "between events").unwrap();
    ew.write_event(&Event::new("two")).unwrap();
    ew.close().unwrap();

    let (out, err) = output(ew);
    assert_eq!(err, "WARN between events\n");
    assert_eq!(XmlNode::parse(&out).unwrap().children.len(), 2);
}
