//! Arena document tree.
//!
//! Nodes never move and never die: a `NodeId` handed out at parse or
//! append time stays valid for the page session, which is what lets
//! installed bindings hold typed element handles instead of re-querying.

use std::collections::HashMap;

use crate::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let id_attr = attrs.get("id").cloned();
        let element = Element { tag_name, attrs };
        let id = self.create_node(parent, NodeType::Element(element));
        if let Some(id_attr) = id_attr {
            // First occurrence wins, matching getElementById.
            self.id_index.entry(id_attr).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(parent, NodeType::Text(text))
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0).map(|node| &node.node_type) {
            Some(NodeType::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.node_type) {
            Some(NodeType::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
    }

    pub(crate) fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag_name.as_str())
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|element| element.attrs.get(name))
            .map(String::as_str)
    }

    pub(crate) fn set_attr(&mut self, id: NodeId, name: &str, value: String) {
        if !self.is_element(id) {
            return;
        }
        if name == "id" {
            self.id_index.entry(value.clone()).or_insert(id);
        }
        if let Some(element) = self.element_mut(id) {
            element.attrs.insert(name.to_string(), value);
        }
    }

    pub(crate) fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub(crate) fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.id_index.get(id_attr).copied()
    }

    /// Elements in document order (depth-first, children after parent).
    pub(crate) fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Whitespace-normalized text of a node's subtree.
    pub(crate) fn text_content(&self, id: NodeId) -> String {
        let mut raw = String::new();
        let mut stack = vec![id];
        let mut ordered = Vec::new();
        while let Some(node) = stack.pop() {
            ordered.push(node);
            for child in self.children(node).iter().rev() {
                stack.push(*child);
            }
        }
        for node in ordered {
            if let Some(Node {
                node_type: NodeType::Text(text),
                ..
            }) = self.node(node)
            {
                raw.push_str(text);
                raw.push(' ');
            }
        }
        raw.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub(crate) fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let decls = style::parse_declarations(self.attr(id, "style"));
        style::get_declaration(&decls, name).map(str::to_string)
    }

    pub(crate) fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        if !self.is_element(id) {
            return;
        }
        let mut decls = style::parse_declarations(self.attr(id, "style"));
        style::set_declaration(&mut decls, name, value);
        let serialized = style::serialize_declarations(&decls);
        self.set_attr(id, "style", serialized);
    }

    /// Opening-tag rendering of a node, for diagnostics.
    pub(crate) fn snippet(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return match self.node(id).map(|node| &node.node_type) {
                Some(NodeType::Document) => "#document".to_string(),
                Some(NodeType::Text(text)) => format!("#text {text:?}"),
                _ => "#unknown".to_string(),
            };
        };
        let mut out = format!("<{}", element.tag_name);
        let mut attrs = element.attrs.iter().collect::<Vec<_>>();
        attrs.sort();
        for (name, value) in attrs {
            out.push_str(&format!(" {name}='{value}'"));
        }
        out.push('>');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn id_index_keeps_first_occurrence() {
        let mut dom = Dom::new();
        let root = dom.root();
        let first = dom.create_element(root, "div".into(), attrs(&[("id", "dup")]));
        let _second = dom.create_element(root, "span".into(), attrs(&[("id", "dup")]));
        assert_eq!(dom.element_by_id("dup"), Some(first));
    }

    #[test]
    fn style_property_round_trips_through_attribute() {
        let mut dom = Dom::new();
        let root = dom.root();
        let nav = dom.create_element(
            root,
            "nav".into(),
            attrs(&[("style", "padding: 4px; transform: translateY(0)")]),
        );
        dom.set_style_property(nav, "transform", "translateY(-3px)");
        assert_eq!(
            dom.style_property(nav, "transform").as_deref(),
            Some("translateY(-3px)")
        );
        assert_eq!(dom.style_property(nav, "padding").as_deref(), Some("4px"));
        assert_eq!(
            dom.attr(nav, "style"),
            Some("padding: 4px; transform: translateY(-3px);")
        );
    }

    #[test]
    fn text_content_normalizes_whitespace() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_element(root, "p".into(), HashMap::new());
        dom.create_text(p, "  hello\n".into());
        let em = dom.create_element(p, "em".into(), HashMap::new());
        dom.create_text(em, "  big   world ".into());
        assert_eq!(dom.text_content(p), "hello big world");
    }

    #[test]
    fn elements_walk_is_document_order() {
        let mut dom = Dom::new();
        let root = dom.root();
        let a = dom.create_element(root, "header".into(), HashMap::new());
        let b = dom.create_element(a, "a".into(), HashMap::new());
        let c = dom.create_element(root, "main".into(), HashMap::new());
        assert_eq!(dom.elements(), vec![a, b, c]);
    }
}
