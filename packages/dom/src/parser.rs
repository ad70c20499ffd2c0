use crate::document::Document;
use crate::lexer::{read_attribute_value, AttrToken, ContentToken};
use crate::node::{is_escapable_raw_text_element, is_raw_text_element, is_void_element, NodeId};
use logos::{Lexer, Logos};
use trellis_common::decode_entities;

/// Parse markup into detached nodes owned by `doc`.
///
/// The parser never fails: unknown end tags are dropped, unclosed elements are
/// closed at the end of input, and a stray `<` is kept as text.
pub fn parse_fragment(doc: &mut Document, source: &str) -> Vec<NodeId> {
    let mut parser = Parser::new(doc);
    parser.run(source);
    parser.finish()
}

struct Parser<'doc> {
    doc: &'doc mut Document,
    roots: Vec<NodeId>,
    open: Vec<NodeId>,
    text: String,
}

impl<'doc> Parser<'doc> {
    fn new(doc: &'doc mut Document) -> Self {
        Self {
            doc,
            roots: Vec::new(),
            open: Vec::new(),
            text: String::new(),
        }
    }

    fn run(&mut self, source: &str) {
        let mut lex = ContentToken::lexer(source);

        while let Some(token) = lex.next() {
            match token {
                Ok(ContentToken::Text(text)) => self.text.push_str(text),
                Ok(ContentToken::Lt) | Err(()) => self.text.push_str(lex.slice()),
                Ok(ContentToken::Doctype) => self.flush_text(),
                Ok(ContentToken::Comment(content)) => {
                    self.flush_text();
                    let comment = self.doc.create_comment(content);
                    self.append(comment);
                }
                Ok(ContentToken::EndTag(name)) => {
                    self.flush_text();
                    self.close(&name.to_ascii_lowercase());
                }
                Ok(ContentToken::StartTag(name)) => {
                    self.flush_text();
                    let mut attr_lex = lex.morph::<AttrToken>();
                    let (attributes, self_closing) = read_attributes(&mut attr_lex);
                    lex = attr_lex.morph();

                    let tag = name.to_ascii_lowercase();
                    let element = self.doc.create_element_with(tag.as_str(), attributes);
                    self.append(element);

                    if is_void_element(&tag) || self_closing {
                        continue;
                    }

                    if is_raw_text_element(&tag) || is_escapable_raw_text_element(&tag) {
                        self.read_raw_text(&mut lex, element, &tag);
                        continue;
                    }

                    self.open.push(element);
                }
            }
        }
    }

    /// Consume everything up to the matching end tag as a single text child
    fn read_raw_text<'src>(
        &mut self,
        lex: &mut Lexer<'src, ContentToken<'src>>,
        element: NodeId,
        tag: &str,
    ) {
        let rest = lex.remainder();
        let needle = format!("</{}", tag);
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());

        let raw = &rest[..end];
        if !raw.is_empty() {
            let content = if is_escapable_raw_text_element(tag) {
                decode_entities(raw)
            } else {
                raw.to_string()
            };
            let text = self.doc.create_text(content);
            self.doc.push_child(element, text);
        }

        let closing = rest[end..]
            .find('>')
            .map(|i| i + 1)
            .unwrap_or(rest.len() - end);
        lex.bump(end + closing);
    }

    fn append(&mut self, node: NodeId) {
        match self.open.last() {
            Some(&parent) => self.doc.push_child(parent, node),
            None => self.roots.push(node),
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let content = decode_entities(&std::mem::take(&mut self.text));
        let text = self.doc.create_text(content);
        self.append(text);
    }

    fn close(&mut self, tag: &str) {
        let position = self
            .open
            .iter()
            .rposition(|&id| self.doc.tag_name(id) == Some(tag));
        if let Some(position) = position {
            self.open.truncate(position);
        }
    }

    fn finish(mut self) -> Vec<NodeId> {
        self.flush_text();
        self.roots
    }
}

/// Read attributes up to the end of the start tag. Returns whether the tag self-closed.
fn read_attributes<'src>(lex: &mut Lexer<'src, AttrToken<'src>>) -> (Vec<(String, String)>, bool) {
    let mut attributes = Vec::new();
    let mut pending: Option<String> = None;

    while let Some(token) = lex.next() {
        match token {
            Ok(AttrToken::Name(name)) => {
                if let Some(previous) = pending.take() {
                    push_attribute(&mut attributes, previous, String::new());
                }
                pending = Some(name.to_ascii_lowercase());
            }
            Ok(AttrToken::Equals) => {
                let value = read_attribute_value(lex);
                if let Some(name) = pending.take() {
                    push_attribute(&mut attributes, name, decode_entities(value));
                }
            }
            Ok(AttrToken::Close) | Ok(AttrToken::SelfClose) => {
                if let Some(name) = pending.take() {
                    push_attribute(&mut attributes, name, String::new());
                }
                return (attributes, token == Ok(AttrToken::SelfClose));
            }
            Ok(AttrToken::Slash) | Err(()) => {}
        }
    }

    if let Some(name) = pending {
        push_attribute(&mut attributes, name, String::new());
    }
    (attributes, false)
}

// First occurrence of a name wins
fn push_attribute(attributes: &mut Vec<(String, String)>, name: String, value: String) {
    if !attributes.iter().any(|(existing, _)| *existing == name) {
        attributes.push((name, value));
    }
}
