//! Format-neutral node tree produced by serializer strategies

use crate::record::Scalar;

/// Content of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// Leaf value
    Scalar(Scalar),
    /// Ordered child nodes
    Group(Vec<Node>),
}

/// One named node, with optional attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub content: NodeContent,
}

impl Node {
    /// Create a leaf node
    pub fn scalar(name: impl Into<String>, value: Scalar) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: NodeContent::Scalar(value),
        }
    }

    /// Create a group node
    pub fn group(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: NodeContent::Group(children),
        }
    }

    /// Create an empty leaf, rendered as an empty element or cell
    pub fn empty(name: impl Into<String>) -> Self {
        Self::scalar(name, Scalar::Null)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Rename the node, keeping its content
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a child, turning an empty leaf into a group
    pub fn push(&mut self, child: Node) {
        match &mut self.content {
            NodeContent::Group(children) => children.push(child),
            NodeContent::Scalar(_) => self.content = NodeContent::Group(vec![child]),
        }
    }

    /// Child nodes, empty for leaves
    pub fn children(&self) -> &[Node] {
        match &self.content {
            NodeContent::Group(children) => children,
            NodeContent::Scalar(_) => &[],
        }
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Leaf value, `None` for groups
    pub fn value(&self) -> Option<&Scalar> {
        match &self.content {
            NodeContent::Scalar(value) => Some(value),
            NodeContent::Group(_) => None,
        }
    }

    /// Check if the node renders as an empty element
    pub fn is_empty(&self) -> bool {
        match &self.content {
            NodeContent::Scalar(Scalar::Null) => true,
            NodeContent::Scalar(Scalar::Text(s)) => s.is_empty(),
            NodeContent::Scalar(_) => false,
            NodeContent::Group(children) => children.is_empty(),
        }
    }
}
