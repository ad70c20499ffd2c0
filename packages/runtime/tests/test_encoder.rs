//! Template encoding through the public runtime API

mod common;

use common::init_tracing;
use std::collections::HashSet;
use trellis_common::IDGenerator;
use trellis_runtime::{
    decode_attribute, html, props, Component, Encoder, RenderFn, Runtime, Stash, TemplateResult,
    Value,
};

fn encode(strings: &[&str], values: Vec<Value>) -> (TemplateResult, Stash) {
    let mut stash = Stash::new();
    let mut ids = IDGenerator::new("trellis");
    let result = Encoder::new(&mut stash, &mut ids, "card").encode(strings, values);
    (result, stash)
}

/// Pull the quoted value of `name` out of encoded markup
fn attribute<'a>(markup: &'a str, name: &str) -> &'a str {
    let needle = format!("{}=\"", name);
    let start = markup.find(&needle).expect("attribute present") + needle.len();
    let end = markup[start..].find('"').expect("closing quote");
    &markup[start..start + end]
}

#[test]
fn test_primitives_round_trip_through_decoder() {
    init_tracing();
    let (result, stash) = encode(
        &["<x-card n=\"", "\" f=\"", "\" b=\"", "\" z=\"", "\"></x-card>"],
        vec![Value::from(42), Value::from(-0.25), Value::from(true), Value::Null],
    );
    let text = result.text();

    assert_eq!(decode_attribute(attribute(text, "n"), &stash), Value::Number(42.0));
    assert_eq!(decode_attribute(attribute(text, "f"), &stash), Value::Number(-0.25));
    assert_eq!(decode_attribute(attribute(text, "b"), &stash), Value::Bool(true));
    assert_eq!(decode_attribute(attribute(text, "z"), &stash), Value::Null);
}

#[test]
fn test_complex_values_round_trip_through_stash() {
    let items = Value::Array(vec![Value::from("a"), Value::from(2)]);
    let config = Value::from(props! { "open" => true });
    let (result, stash) = encode(
        &["<x-list items=\"", "\" config=\"", "\"></x-list>"],
        vec![items.clone(), config.clone()],
    );
    let text = result.text();

    assert_eq!(decode_attribute(attribute(text, "items"), &stash), items);
    assert_eq!(decode_attribute(attribute(text, "config"), &stash), config);
    assert_eq!(stash.count("card"), 2);
}

#[test]
fn test_text_is_escaped_exactly_once() {
    let (inner, _) = encode(&["<b>", "</b>"], vec![Value::from("O'Brien & <b>")]);
    assert_eq!(inner.text(), "<b>O&#x27;Brien &amp; &lt;b&gt;</b>");

    // Nesting a template result does not escape it again
    let (outer, _) = encode(&["<p>", "</p>"], vec![Value::from(inner.clone())]);
    assert_eq!(outer.text(), format!("<p>{}</p>", inner.text()));
}

#[test]
fn test_rendered_text_matches_source_string() {
    #[derive(Default)]
    struct NameTag;

    impl Component for NameTag {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|scope| {
                let inner = html!(scope; "<b>" {"O'Brien & <b>"} "</b>");
                Ok(html!(scope; "<p>" {inner} "</p>").into())
            }))
        }
    }

    let rt = Runtime::new();
    rt.register::<NameTag>().unwrap();
    let body = rt.body();
    rt.set_inner_html(body, "<name-tag></name-tag>").unwrap();

    let bold = rt.query_selector(body, "b").unwrap().unwrap();
    assert_eq!(rt.document().text_content(bold), "O'Brien & <b>");
    assert_eq!(rt.inner_html(bold), "O'Brien &amp; &lt;b&gt;");
}

#[test]
fn test_tokens_are_unique() {
    let mut stash = Stash::new();
    let mut ids = IDGenerator::new("trellis");
    let mut tokens = Vec::new();

    for owner in ["a", "b", "c"] {
        let mut encoder = Encoder::new(&mut stash, &mut ids, owner);
        for i in 0..10 {
            let result = encoder.encode(&["<x-a v=\"", "\"></x-a>"], vec![Value::Array(vec![Value::from(i)])]);
            tokens.push(attribute(result.text(), "v").to_string());
        }
    }

    let unique: HashSet<&String> = tokens.iter().collect();
    assert_eq!(unique.len(), 30);
    assert_eq!(stash.len(), 30);
    assert_eq!(stash.owner(&tokens[12]), Some("b"));
}

#[test]
fn test_unsafe_raw_list_is_not_joined() {
    let raw = vec![TemplateResult::unsafe_raw("<hr>"), TemplateResult::unsafe_raw("<hr>")];
    let (result, stash) = encode(&["<div>", "</div>"], vec![Value::from(raw)]);

    assert!(!result.text().contains("<hr>"));
    assert_eq!(stash.len(), 1);
}

#[test]
fn test_empty_list_renders_nothing() {
    let (result, stash) = encode(&["<ul>", "</ul>"], vec![Value::Array(Vec::new())]);
    assert_eq!(result.text(), "<ul></ul>");
    assert!(stash.is_empty());
}
