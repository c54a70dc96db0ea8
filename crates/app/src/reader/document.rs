//! Minimal model of the rendered page the reader operates on.
//!
//! The host shell owns the real document; the reader only needs a tree of
//! element/text nodes, each element's display kind, and viewport
//! rectangles for text leaves. Geometry is consumed through the
//! [`GeometryQuery`] capability so the session logic can be tested
//! without any rendered page at all.

use tracing::trace;

/// Index of a node within its [`Document`].
pub type NodeId = usize;

/// Viewport coordinates of the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Edge-inclusive containment, matching how browsers hit-test a
    /// range's bounding rectangle.
    pub fn contains(&self, point: Point) -> bool {
        self.left <= point.x && point.x <= self.right && self.top <= point.y && point.y <= self.bottom
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }
}

/// Computed display of an element, reduced to the only distinction the
/// reader cares about: does hovering this element mean hovering its
/// enclosing block?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Block,
    Inline,
}

#[derive(Debug)]
enum NodeData {
    Element { tag: String, display: DisplayKind },
    Text { content: String, rect: Option<Rect> },
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree of element and text nodes with a block-level root.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element {
                    tag: "body".to_string(),
                    display: DisplayKind::Block,
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn element(&mut self, parent: NodeId, tag: &str, display: DisplayKind) -> NodeId {
        self.push(parent, NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            display,
        })
    }

    pub fn text(&mut self, parent: NodeId, content: &str, rect: Rect) -> NodeId {
        self.push(parent, NodeData::Text {
            content: content.to_string(),
            rect: Some(rect),
        })
    }

    /// A text node without geometry, as produced by detached or
    /// display:none content.
    pub fn detached_text(&mut self, parent: NodeId, content: &str) -> NodeId {
        self.push(parent, NodeData::Text {
            content: content.to_string(),
            rect: None,
        })
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn text_content(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node].data {
            NodeData::Text { content, .. } => Some(content),
            NodeData::Element { .. } => None,
        }
    }

    /// Nearest ancestor-or-self with block display. Text nodes and
    /// inline elements delegate to their parent, so hovering a `<span>`
    /// (or its text) resolves to the paragraph around it.
    pub fn block_ancestor(&self, node: NodeId) -> NodeId {
        let mut current = node;
        loop {
            let inline = match &self.nodes[current].data {
                NodeData::Text { .. } => true,
                NodeData::Element { display, .. } => *display == DisplayKind::Inline,
            };
            if !inline {
                return current;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// All text leaves under `node` in document order, descending
    /// depth-first through elements and skipping script content.
    pub fn text_leaves(&self, node: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        self.collect_text_leaves(node, &mut leaves);
        trace!("Collected {} text leaves under node {}", leaves.len(), node);
        leaves
    }

    fn collect_text_leaves(&self, node: NodeId, leaves: &mut Vec<NodeId>) {
        match &self.nodes[node].data {
            NodeData::Text { .. } => leaves.push(node),
            NodeData::Element { tag, .. } => {
                if tag == "script" {
                    return;
                }
                for &child in &self.nodes[node].children {
                    self.collect_text_leaves(child, leaves);
                }
            }
        }
    }
}

/// Hit-testing capability over text fragments.
pub trait GeometryQuery {
    /// Viewport rectangle of a text node, or `None` when the node is
    /// detached or has no area — such fragments never qualify for a
    /// session.
    fn node_rect(&self, node: NodeId) -> Option<Rect>;
}

impl GeometryQuery for Document {
    fn node_rect(&self, node: NodeId) -> Option<Rect> {
        match &self.nodes[node].data {
            NodeData::Text { rect: Some(rect), .. } if !rect.is_empty() => Some(*rect),
            _ => None,
        }
    }
}
