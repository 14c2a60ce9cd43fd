#![forbid(unsafe_code)]

//! The canonical tree model.
//!
//! A [`VNode`] is either a text node or a tagged element with uniquely keyed
//! children and an explicit render order. Nodes are plain data: the host
//! reference produced by the reconciler lives in a side table keyed by
//! [`NodeId`], never inside the node itself, so trees stay trivially
//! testable without a display surface.
//!
//! Trees are built fresh on every render pass. Sibling key uniqueness is
//! enforced at build time by [`Element::build`]; violating it is a hard
//! error, not a warning.

use crate::error::TreeError;
use ahash::AHashMap;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use vireo_state::Value;

/// Sibling key. Unique among the children of one element.
pub type Key = String;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a tree node, used to key the host-reference side table.
///
/// Ids are process-unique and survive in-place patching: when the reconciler
/// evolves a node, the node keeps its id and only the side-table entry moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An attribute value: plain data, or an opaque event handler.
///
/// Handler equality is reference identity (`Rc::ptr_eq`). Two separately
/// built handlers never compare equal, so the attribute diff always
/// reapplies them; equivalence of closures cannot be decided.
#[derive(Clone)]
pub enum AttrValue {
    /// Plain data, diffed by structural equality.
    Data(Value),
    /// Event handler invoked by the host with an event payload.
    Handler(Rc<dyn Fn(&Value)>),
}

impl AttrValue {
    /// Build a handler attribute from a closure.
    #[must_use]
    pub fn handler(f: impl Fn(&Value) + 'static) -> Self {
        Self::Handler(Rc::new(f))
    }

    /// True if this is a handler attribute.
    #[must_use]
    pub fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => write!(f, "Data({value:?})"),
            Self::Handler(h) => write!(f, "Handler({:p})", Rc::as_ptr(h)),
        }
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Data(Value::from(s))
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Data(Value::from(b))
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Data(Value::from(n))
    }
}

/// A text leaf.
#[derive(Debug, Clone)]
pub struct TextNode {
    /// Stable node identity.
    pub id: NodeId,
    /// The text content.
    pub value: String,
}

/// A tagged element with keyed children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    /// Stable node identity.
    pub id: NodeId,
    /// Tag name; differing tags never patch into each other.
    pub tag: String,
    /// Attributes in declaration order.
    pub attrs: IndexMap<String, AttrValue>,
    /// Children by sibling key.
    pub children: AHashMap<Key, VNode>,
    /// Render order; always a permutation of `children`'s keys.
    pub child_order: Vec<Key>,
}

/// A node of the canonical tree.
#[derive(Debug, Clone)]
pub enum VNode {
    /// Text leaf.
    Text(TextNode),
    /// Tagged element.
    Element(ElementNode),
}

impl VNode {
    /// Build a text node.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(TextNode {
            id: NodeId::fresh(),
            value: value.into(),
        })
    }

    /// The node's stable identity.
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Self::Text(t) => t.id,
            Self::Element(e) => e.id,
        }
    }

    /// Tag name for elements, `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Element(e) => Some(&e.tag),
        }
    }
}

/// Builder for element nodes.
///
/// Children are collected in call order; [`build`](Self::build) verifies key
/// uniqueness and derives `child_order` from it.
///
/// ```
/// use vireo_vdom::{Element, VNode};
///
/// let node = Element::new("ul")
///     .attr("class", "todo-list")
///     .child("a", VNode::text("first"))
///     .child("b", VNode::text("second"))
///     .build()
///     .unwrap();
/// assert_eq!(node.tag(), Some("ul"));
/// ```
#[derive(Debug)]
pub struct Element {
    tag: String,
    attrs: IndexMap<String, AttrValue>,
    children: Vec<(Key, VNode)>,
}

impl Element {
    /// Start building an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute. A repeated key overwrites the earlier value.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Add a keyed child.
    #[must_use]
    pub fn child(mut self, key: impl Into<Key>, node: VNode) -> Self {
        self.children.push((key.into(), node));
        self
    }

    /// Finish the element, failing on duplicate sibling keys.
    pub fn build(self) -> Result<VNode, TreeError> {
        let mut children = AHashMap::with_capacity(self.children.len());
        let mut child_order = Vec::with_capacity(self.children.len());
        for (key, node) in self.children {
            if children.insert(key.clone(), node).is_some() {
                return Err(TreeError::DuplicateKey { tag: self.tag, key });
            }
            child_order.push(key);
        }
        Ok(VNode::Element(ElementNode {
            id: NodeId::fresh(),
            tag: self.tag,
            attrs: self.attrs,
            children,
            child_order,
        }))
    }
}

impl ElementNode {
    /// Verify that `child_order` is a permutation of the children's keys.
    pub fn check_order(&self) -> Result<(), TreeError> {
        if self.child_order.len() != self.children.len() {
            let key = self
                .children
                .keys()
                .find(|k| !self.child_order.contains(k))
                .or_else(|| {
                    self.child_order
                        .iter()
                        .find(|k| !self.children.contains_key(*k))
                })
                .cloned()
                .unwrap_or_default();
            return Err(TreeError::OrderKeyMismatch {
                tag: self.tag.clone(),
                key,
            });
        }
        for key in &self.child_order {
            if !self.children.contains_key(key) {
                return Err(TreeError::OrderKeyMismatch {
                    tag: self.tag.clone(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }
}
