use crate::error::{DomError, DomResult};
use crate::node::{ElementData, Node, NodeId, NodeKind};
use crate::parser::parse_fragment;
use crate::selector::Selector;
use crate::serializer::{serialize_children, serialize_node};
use crate::visitor::{walk_children, Visitor};
use trellis_common::to_kebab_case;

/// Arena-backed document tree.
///
/// Every node ever created stays addressable through its [`NodeId`]; removing a
/// node only detaches it. A node is *connected* when walking up its parents
/// (and from shadow roots to their hosts) reaches the document root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Document {
    /// Create a document with an empty `<html><head></head><body></body></html>` skeleton
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node::new(NodeKind::Document)],
            root: NodeId(0),
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };

        doc.html = doc.create_element("html");
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.push_child(doc.root, doc.html);
        doc.push_child(doc.html, doc.head);
        doc.push_child(doc.html, doc.body);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn html(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_element_with(
        &mut self,
        tag: impl Into<String>,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let mut data = ElementData::new(tag);
        data.attributes = attributes;
        self.alloc(NodeKind::Element(data))
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text {
            content: content.into(),
        })
    }

    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment {
            content: content.into(),
        })
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            _ => Err(DomError::NotAnElement { node: id }),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|data| data.tag.as_str())
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text { content }) => Some(content),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text { content } | NodeKind::Comment { content } => {
                *content = text.into();
                Ok(())
            }
            _ => {
                let text = self.create_text(text);
                self.clear_children(id)?;
                self.append_child(id, text)
            }
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|data| data.attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attribute(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id)
            .map(|data| data.has_attribute(name))
            .unwrap_or(false)
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        let name = name.into().to_ascii_lowercase();
        self.element_mut(id)?.set_attribute(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self.element_mut(id)?.remove_attribute(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.node(host)?.shadow_root
    }

    /// Host element of a shadow root
    pub fn host(&self, shadow: NodeId) -> Option<NodeId> {
        match self.kind(shadow) {
            Some(NodeKind::ShadowRoot { host }) => Some(*host),
            _ => None,
        }
    }

    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        if !self.is_element(host) {
            return Err(DomError::NotAnElement { node: host });
        }
        if self.shadow_root(host).is_some() {
            return Err(DomError::ShadowRootExists { host });
        }

        let shadow = self.alloc(NodeKind::ShadowRoot { host });
        self.node_mut(host)?.shadow_root = Some(shadow);
        Ok(shadow)
    }

    /// Append without validation. Only for freshly created, detached nodes.
    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or at the end).
    ///
    /// The child is detached from its current parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_node = self.node(parent).ok_or(DomError::UnknownNode(parent))?;
        if !parent_node.kind.is_container() {
            return Err(DomError::NotAContainer { node: parent });
        }
        match self.kind(child) {
            None => return Err(DomError::UnknownNode(child)),
            Some(NodeKind::Document | NodeKind::ShadowRoot { .. }) => {
                return Err(DomError::HierarchyRequest { parent, child })
            }
            Some(_) => {}
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        // Inserting a node before itself keeps it in place
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other,
        };

        self.remove(child)?;

        let children = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent. Detached nodes stay valid.
    pub fn remove(&mut self, node: NodeId) -> DomResult<()> {
        let Some(parent) = self.node(node).ok_or(DomError::UnknownNode(node))?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&c| c != node);
        self.node_mut(node)?.parent = None;
        Ok(())
    }

    /// Detach and return all children of a node
    pub fn clear_children(&mut self, node: NodeId) -> DomResult<Vec<NodeId>> {
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for &child in &children {
            self.nodes[child.0].parent = None;
        }
        Ok(children)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(node)?);
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    /// Whether `ancestor` is `node` or one of its (light tree) ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Like `is_inclusive_ancestor`, but steps from a shadow root to its host
    pub fn is_composed_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id).or_else(|| self.host(id));
        }
        false
    }

    /// Top of the tree containing `node`, without crossing shadow boundaries
    pub fn root_node(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether the node is part of the live document, looking through shadow roots
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            let top = self.root_node(current);
            if top == self.root {
                return true;
            }
            match self.host(top) {
                Some(host) => current = host,
                None => return false,
            }
        }
    }

    /// Light tree descendants in document order, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Descendants including shadow trees; a shadow root comes right after its host
    pub fn composed_descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
            if let Some(shadow) = self.shadow_root(id) {
                stack.push(shadow);
            }
        }
        out
    }

    pub fn text_content(&self, node: NodeId) -> String {
        struct TextCollector(String);

        impl Visitor for TextCollector {
            fn visit_text(&mut self, _doc: &Document, _node: NodeId, content: &str) {
                self.0.push_str(content);
            }
        }

        if let Some(text) = self.text(node) {
            return text.to_string();
        }
        let mut collector = TextCollector(String::new());
        walk_children(&mut collector, self, node);
        collector.0
    }

    /// Deep copy of a node and its light tree. The copy is detached.
    pub fn deep_clone(&mut self, node: NodeId) -> DomResult<NodeId> {
        let kind = match self.kind(node).ok_or(DomError::UnknownNode(node))? {
            NodeKind::Document | NodeKind::ShadowRoot { .. } => {
                return Err(DomError::NotAnElement { node })
            }
            kind => kind.clone(),
        };
        let copy = self.alloc(kind);
        let children = self.children(node).to_vec();
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.push_child(copy, child_copy);
        }
        Ok(copy)
    }

    /// Set one inline style declaration; camelCase names are converted to CSS names
    pub fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> DomResult<()> {
        let property = to_kebab_case(property);
        let element = self.element_mut(node)?;
        let mut declarations = parse_style(element.get_attribute("style").unwrap_or_default());

        match declarations.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => declarations.push((property, value.to_string())),
        }

        let style = declarations
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        element.set_attribute("style", style);
        Ok(())
    }

    pub fn style_property(&self, node: NodeId, property: &str) -> Option<String> {
        let property = to_kebab_case(property);
        parse_style(self.get_attribute(node, "style")?)
            .into_iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value)
    }

    /// Parse markup into detached top-level nodes
    pub fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        parse_fragment(self, markup)
    }

    /// Replace the children of `node` with parsed markup; returns the new top-level nodes
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> DomResult<Vec<NodeId>> {
        self.clear_children(node)?;
        let fragment = self.parse_fragment(markup);
        for &child in &fragment {
            self.append_child(node, child)?;
        }
        Ok(fragment)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        serialize_children(self, node)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        serialize_node(self, node)
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node)
            .map(|data| selector.matches(data))
            .unwrap_or(false)
    }

    /// Nearest inclusive ancestor element matching the selector.
    ///
    /// Starting from a non-element (e.g. a text node) begins at its parent.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.matches(id, selector) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.matches(id, selector))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.html()), Some("html"));
        assert_eq!(doc.children(doc.html()), &[doc.head(), doc.body()]);
        assert!(doc.is_connected(doc.body()));
    }

    #[test]
    fn test_append_moves_node() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");

        doc.append_child(a, child).unwrap();
        doc.append_child(b, child).unwrap();

        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn test_insert_before_reference() {
        let mut doc = Document::new();
        let list = doc.create_element("ul");
        let first = doc.create_element("li");
        let second = doc.create_element("li");
        doc.append_child(list, second).unwrap();
        doc.insert_before(list, first, Some(second)).unwrap();

        assert_eq!(doc.children(list), &[first, second]);
        assert_eq!(doc.next_sibling(first), Some(second));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        let err = doc.append_child(inner, outer).unwrap_err();
        assert_eq!(err, DomError::HierarchyRequest { parent: inner, child: outer });
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut doc = Document::new();
        let text = doc.create_text("hi");
        let span = doc.create_element("span");
        assert!(matches!(
            doc.append_child(text, span),
            Err(DomError::NotAContainer { .. })
        ));
    }

    #[test]
    fn test_connected_through_shadow_root() {
        let mut doc = Document::new();
        let host = doc.create_element("x-card");
        let shadow = doc.attach_shadow(host).unwrap();
        let inner = doc.create_element("p");
        doc.append_child(shadow, inner).unwrap();

        assert!(!doc.is_connected(inner));
        let body = doc.body();
        doc.append_child(body, host).unwrap();
        assert!(doc.is_connected(inner));
        assert_eq!(doc.host(shadow), Some(host));
        assert!(doc.attach_shadow(host).is_err());

        assert!(!doc.is_inclusive_ancestor(body, inner));
        assert!(doc.is_composed_inclusive_ancestor(body, inner));
    }

    #[test]
    fn test_composed_descendants_include_shadow_tree() {
        let mut doc = Document::new();
        let host = doc.create_element("x-card");
        let light = doc.create_element("span");
        doc.append_child(host, light).unwrap();
        let shadow = doc.attach_shadow(host).unwrap();
        let inner = doc.create_element("p");
        doc.append_child(shadow, inner).unwrap();

        let wrapper = doc.create_element("div");
        doc.append_child(wrapper, host).unwrap();

        assert_eq!(doc.descendants(wrapper), vec![host, light]);
        assert_eq!(
            doc.composed_descendants(wrapper),
            vec![host, shadow, inner, light]
        );
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let mut doc = Document::new();
        let div = doc.create_element_with("div", vec![("class".into(), "box".into())]);
        let text = doc.create_text("hello");
        doc.append_child(div, text).unwrap();

        let copy = doc.deep_clone(div).unwrap();
        assert_ne!(copy, div);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.outer_html(copy), doc.outer_html(div));
        assert_ne!(doc.children(copy)[0], text);
    }

    #[test]
    fn test_style_properties() {
        let mut doc = Document::new();
        let div = doc.create_element_with("div", vec![("style".into(), "color: red".into())]);

        doc.set_style_property(div, "backgroundColor", "blue").unwrap();
        doc.set_style_property(div, "color", "green").unwrap();

        assert_eq!(
            doc.get_attribute(div, "style"),
            Some("color: green; background-color: blue;")
        );
        assert_eq!(doc.style_property(div, "background-color"), Some("blue".to_string()));
    }

    #[test]
    fn test_text_content() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(body, "<p>Hello <b>world</b></p><!-- skip -->")
            .unwrap();
        assert_eq!(doc.text_content(body), "Hello world");
    }

    #[test]
    fn test_closest_and_query() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(
            body,
            r#"<nav class="menu"><a data-event="go" href="/x"><span>Go</span></a></nav>"#,
        )
        .unwrap();

        let span = doc.query_selector(body, &"span".parse().unwrap()).unwrap();
        let link = doc.closest(span, &"[data-event]".parse().unwrap()).unwrap();
        assert_eq!(doc.tag_name(link), Some("a"));
        assert_eq!(
            doc.query_selector_all(body, &"nav.menu, a".parse().unwrap()).len(),
            2
        );
    }
}
