//! Scheme introspection documents.

use modular_input::{Argument, DataType, Scheme, StreamingMode, XmlNode, structurally_equal};
use pretty_assertions::assert_eq;

const SCHEME_WITH_DEFAULTS_XML: &str = include_str!("data/scheme_with_defaults.xml");
const SCHEME_WITHOUT_DEFAULTS_XML: &str = include_str!("data/scheme_without_defaults.xml");

const UNICODE_DESCRIPTION: &str = "\u{C3BC} and \u{C3B6} and <&> f\u{00FC}r";

fn parse(xml: &str) -> XmlNode {
    XmlNode::parse(xml).unwrap()
}

fn arg_named<'a>(scheme: &'a XmlNode, name: &str) -> &'a XmlNode {
    scheme
        .child("endpoint")
        .and_then(|e| e.child("args"))
        .and_then(|args| args.children.iter().find(|a| a.attribute("name") == Some(name)))
        .unwrap()
}

// ── Reference documents ──────────────────────────────────────────

#[test]
fn scheme_with_defaults_matches_reference() {
    let generated = Scheme::new("abcd").to_xml().unwrap();
    assert!(structurally_equal(
        &parse(SCHEME_WITH_DEFAULTS_XML),
        &parse(&generated)
    ));
}

#[test]
fn scheme_without_defaults_matches_reference() {
    let scheme = Scheme::new("abcd")
        .with_description(UNICODE_DESCRIPTION)
        .with_streaming_mode(StreamingMode::Simple)
        .use_external_validation(false)
        .use_single_instance(true)
        .with_argument(Argument::new("arg1"))
        .with_argument(
            Argument::new("arg2")
                .with_description(UNICODE_DESCRIPTION)
                .with_data_type(DataType::Number)
                .required_on_create(true)
                .required_on_edit(true)
                .with_validation("is_pos_int('some_name')"),
        );

    let generated = scheme.to_xml().unwrap();
    assert!(structurally_equal(
        &parse(SCHEME_WITHOUT_DEFAULTS_XML),
        &parse(&generated)
    ));
}

// ── Field presence ───────────────────────────────────────────────

#[test]
fn unset_argument_fields_are_absent() {
    let xml = Scheme::new("abcd")
        .with_argument(Argument::new("bare"))
        .to_xml()
        .unwrap();
    let root = parse(&xml);
    let arg = arg_named(&root, "bare");

    let names: Vec<_> = arg.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["data_type", "required_on_create", "required_on_edit"]
    );
}

#[test]
fn set_argument_fields_are_emitted_in_order() {
    let xml = Scheme::new("abcd")
        .with_argument(
            Argument::new("full")
                .with_title("Full")
                .with_description("Everything set")
                .with_validation("is_bool('full')")
                .with_data_type(DataType::Boolean),
        )
        .to_xml()
        .unwrap();
    let root = parse(&xml);
    let arg = arg_named(&root, "full");

    let names: Vec<_> = arg.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "title",
            "description",
            "validation",
            "data_type",
            "required_on_create",
            "required_on_edit"
        ]
    );
    assert_eq!(arg.child("data_type").unwrap().text, "boolean");
}

#[test]
fn arguments_keep_declaration_order() {
    let mut scheme = Scheme::new("abcd");
    for name in ["zeta", "alpha", "mid"] {
        scheme.add_argument(Argument::new(name));
    }
    let root = parse(&scheme.to_xml().unwrap());

    let order: Vec<_> = root
        .child("endpoint")
        .unwrap()
        .child("args")
        .unwrap()
        .children
        .iter()
        .filter_map(|a| a.attribute("name"))
        .collect();
    assert_eq!(order, ["zeta", "alpha", "mid"]);
}

// ── Escaping and Unicode ─────────────────────────────────────────

#[test]
fn unicode_and_markup_survive_round_trip() {
    let xml = Scheme::new("t\u{00EE}tle & <co>")
        .with_description(UNICODE_DESCRIPTION)
        .with_argument(Argument::new("q\"uote'").with_title("\u{1F600} emoji"))
        .to_xml()
        .unwrap();
    let root = parse(&xml);

    assert_eq!(root.child("title").unwrap().text, "t\u{00EE}tle & <co>");
    assert_eq!(root.child("description").unwrap().text, UNICODE_DESCRIPTION);
    let arg = arg_named(&root, "q\"uote'");
    assert_eq!(arg.child("title").unwrap().text, "\u{1F600} emoji");
}

#[test]
fn markup_characters_are_escaped_in_output() {
    let xml = Scheme::new("a<b>&c").to_xml().unwrap();
    assert!(xml.contains("a&lt;b"));
    assert!(xml.contains("&amp;c"));
    assert!(!xml.contains("a<b"));
}
