use crate::*;

fn parse_into_body(markup: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    doc.set_inner_html(body, markup).unwrap();
    (doc, body)
}

#[test]
fn test_parse_nested_elements() {
    let (doc, body) = parse_into_body(r#"<div id="a"><p class="x">Hi <b>there</b></p></div>"#);

    let div = doc.children(body)[0];
    assert_eq!(doc.tag_name(div), Some("div"));
    assert_eq!(doc.get_attribute(div, "id"), Some("a"));

    let p = doc.children(div)[0];
    assert_eq!(doc.children(p).len(), 2);
    assert_eq!(doc.text(doc.children(p)[0]), Some("Hi "));
    assert_eq!(doc.text_content(p), "Hi there");
}

#[test]
fn test_round_trips_through_serializer() {
    let markup = r#"<ul class="list"><li data-k="1">a</li><li>b &amp; c</li></ul><!--note-->"#;
    let (doc, body) = parse_into_body(markup);
    assert_eq!(doc.inner_html(body), markup);
}

#[test]
fn test_top_level_fragment_nodes_are_detached() {
    let mut doc = Document::new();
    let nodes = doc.parse_fragment("text<span></span>more");

    assert_eq!(nodes.len(), 3);
    assert!(nodes.iter().all(|&n| doc.parent(n).is_none()));
    assert_eq!(doc.text(nodes[2]), Some("more"));
}

#[test]
fn test_void_and_self_closing_elements() {
    let (doc, body) = parse_into_body("<img src=a.png><br/><x-icon name=star />after");

    let children = doc.children(body);
    assert_eq!(children.len(), 4);
    assert_eq!(doc.get_attribute(children[0], "src"), Some("a.png"));
    assert_eq!(doc.get_attribute(children[2], "name"), Some("star"));
    assert!(doc.children(children[2]).is_empty());
    assert_eq!(doc.text(children[3]), Some("after"));
}

#[test]
fn test_attribute_forms() {
    let (doc, body) =
        parse_into_body(r#"<input disabled value='a "b"' data-x=1 TYPE="text" value="dup">"#);

    let input = doc.children(body)[0];
    assert_eq!(
        doc.attributes(input),
        &[
            ("disabled".to_string(), String::new()),
            ("value".to_string(), "a \"b\"".to_string()),
            ("data-x".to_string(), "1".to_string()),
            ("type".to_string(), "text".to_string()),
        ]
    );
}

#[test]
fn test_entities_are_decoded() {
    let (doc, body) = parse_into_body(r#"<p title="&quot;q&quot;">a &lt; b &#x2F; c</p>"#);

    let p = doc.children(body)[0];
    assert_eq!(doc.get_attribute(p, "title"), Some("\"q\""));
    assert_eq!(doc.text_content(p), "a < b / c");
}

#[test]
fn test_raw_text_elements_keep_content() {
    let (doc, body) =
        parse_into_body("<style>p > a { color: red }</style><textarea>&lt;b&gt;</textarea>");

    let style = doc.children(body)[0];
    assert_eq!(doc.text_content(style), "p > a { color: red }");

    let textarea = doc.children(body)[1];
    assert_eq!(doc.text_content(textarea), "<b>");
}

#[test]
fn test_script_end_tag_is_case_insensitive() {
    let (doc, body) = parse_into_body("<script>if (a < b) {}</SCRIPT><p>x</p>");

    assert_eq!(doc.children(body).len(), 2);
    assert_eq!(doc.text_content(doc.children(body)[0]), "if (a < b) {}");
}

#[test]
fn test_lenient_recovery() {
    let (doc, body) = parse_into_body("<div><span>open</div></em>tail < 3");

    let children = doc.children(body);
    assert_eq!(children.len(), 2);
    assert_eq!(doc.outer_html(children[0]), "<div><span>open</span></div>");
    assert_eq!(doc.text(children[1]), Some("tail < 3"));
}

#[test]
fn test_placeholder_tokens_survive_as_text() {
    let (doc, body) = parse_into_body("<p>placehold:trellis0:trellis1__</p>");
    let p = doc.children(body)[0];
    assert_eq!(doc.text_content(p), "placehold:trellis0:trellis1__");
}
