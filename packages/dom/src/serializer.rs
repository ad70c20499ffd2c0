use crate::document::Document;
use crate::node::{is_raw_text_element, is_void_element, NodeId, NodeKind};
use trellis_common::{escape_attribute, escape_text};

struct Context {
    buffer: String,
}

impl Context {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Serialize a node including its own tag
pub fn serialize_node(doc: &Document, node: NodeId) -> String {
    let mut ctx = Context::new();
    write_node(doc, node, false, &mut ctx);
    ctx.get_output()
}

/// Serialize the children of a node
pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut ctx = Context::new();
    write_children(doc, node, &mut ctx);
    ctx.get_output()
}

fn write_children(doc: &Document, node: NodeId, ctx: &mut Context) {
    let raw = doc.tag_name(node).map(is_raw_text_element).unwrap_or(false);
    for &child in doc.children(node) {
        write_node(doc, child, raw, ctx);
    }
}

fn write_node(doc: &Document, node: NodeId, raw_text: bool, ctx: &mut Context) {
    let Some(kind) = doc.kind(node) else {
        return;
    };

    match kind {
        NodeKind::Document | NodeKind::ShadowRoot { .. } => write_children(doc, node, ctx),
        NodeKind::Text { content } => {
            if raw_text {
                ctx.add(content);
            } else {
                ctx.add(&escape_text(content));
            }
        }
        NodeKind::Comment { content } => {
            ctx.add("<!--");
            ctx.add(content);
            ctx.add("-->");
        }
        NodeKind::Element(element) => {
            ctx.add("<");
            ctx.add(&element.tag);
            for (name, value) in &element.attributes {
                ctx.add(" ");
                ctx.add(name);
                ctx.add("=\"");
                ctx.add(&escape_attribute(value));
                ctx.add("\"");
            }
            ctx.add(">");

            if is_void_element(&element.tag) {
                return;
            }

            write_children(doc, node, ctx);
            ctx.add("</");
            ctx.add(&element.tag);
            ctx.add(">");
        }
    }
}
