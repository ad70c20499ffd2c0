use crate::document::Document;
use crate::node::{ElementData, NodeId, NodeKind};

/// Visitor pattern for walking a document tree immutably
///
/// Default implementations walk the light tree. Shadow roots are only visited
/// when a walk starts at one; override `visit_element` to descend into them.
pub trait Visitor: Sized {
    fn visit_node(&mut self, doc: &Document, node: NodeId) {
        walk_node(self, doc, node);
    }

    fn visit_element(&mut self, doc: &Document, node: NodeId, _element: &ElementData) {
        walk_children(self, doc, node);
    }

    fn visit_shadow_root(&mut self, doc: &Document, node: NodeId) {
        walk_children(self, doc, node);
    }

    fn visit_text(&mut self, _doc: &Document, _node: NodeId, _content: &str) {
        // Leaf node, no children to walk
    }

    fn visit_comment(&mut self, _doc: &Document, _node: NodeId, _content: &str) {
        // Leaf node, no children to walk
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, doc: &Document, node: NodeId) {
    match doc.kind(node) {
        Some(NodeKind::Document) => walk_children(visitor, doc, node),
        Some(NodeKind::ShadowRoot { .. }) => visitor.visit_shadow_root(doc, node),
        Some(NodeKind::Element(element)) => visitor.visit_element(doc, node, element),
        Some(NodeKind::Text { content }) => visitor.visit_text(doc, node, content),
        Some(NodeKind::Comment { content }) => visitor.visit_comment(doc, node, content),
        None => {}
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, doc: &Document, node: NodeId) {
    for &child in doc.children(node) {
        visitor.visit_node(doc, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TagCounter {
        elements: Vec<String>,
        comments: usize,
    }

    impl Visitor for TagCounter {
        fn visit_element(&mut self, doc: &Document, node: NodeId, element: &ElementData) {
            self.elements.push(element.tag.clone());
            walk_children(self, doc, node);
        }

        fn visit_comment(&mut self, _doc: &Document, _node: NodeId, _content: &str) {
            self.comments += 1;
        }
    }

    #[test]
    fn test_visitor_walks_light_tree_in_order() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(body, "<ul><li>a</li><!-- x --><li>b</li></ul>")
            .unwrap();
        let host = doc.query_selector(body, &"ul".parse().unwrap()).unwrap();
        let shadow = doc.attach_shadow(host).unwrap();
        let hidden = doc.create_element("p");
        doc.append_child(shadow, hidden).unwrap();

        let mut counter = TagCounter {
            elements: Vec::new(),
            comments: 0,
        };
        counter.visit_node(&doc, body);

        assert_eq!(counter.elements, vec!["body", "ul", "li", "li"]);
        assert_eq!(counter.comments, 1);
    }
}
