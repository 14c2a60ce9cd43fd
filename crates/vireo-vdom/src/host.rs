#![forbid(unsafe_code)]

//! Host binding surface.
//!
//! [`HostBackend`] is the only seam through which the reconciler touches a
//! display surface. The engine never interprets host references; it stores
//! them in a side table and hands them back to the backend.
//!
//! [`MemoryHost`] is an id-indexed in-memory backend that records every
//! mutation it performs. Tests use it to assert reconciliation properties
//! (idempotence performs zero mutations, a rotation performs exactly one
//! move) and to take structural snapshots without a real display surface.

use crate::error::HostError;
use crate::node::AttrValue;
use indexmap::IndexMap;
use std::fmt;

/// Callbacks a display surface supplies to the reconciler.
///
/// Attach operations have move semantics: appending or inserting a node that
/// already has a parent detaches it first and repositions it, matching how
/// retained display trees behave.
pub trait HostBackend {
    /// Opaque handle to a host node.
    type Ref: Clone + PartialEq + fmt::Debug;

    /// Create a detached element node.
    fn create_element(&mut self, tag: &str) -> Result<Self::Ref, HostError>;

    /// Create a detached text node.
    fn create_text(&mut self, value: &str) -> Result<Self::Ref, HostError>;

    /// Attach `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Ref, child: &Self::Ref) -> Result<(), HostError>;

    /// Attach `child` immediately before `anchor` under `parent`.
    fn insert_before(
        &mut self,
        parent: &Self::Ref,
        child: &Self::Ref,
        anchor: &Self::Ref,
    ) -> Result<(), HostError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Ref, child: &Self::Ref) -> Result<(), HostError>;

    /// Set or overwrite an attribute.
    fn set_attribute(
        &mut self,
        node: &Self::Ref,
        key: &str,
        value: &AttrValue,
    ) -> Result<(), HostError>;

    /// Remove an attribute.
    fn remove_attribute(&mut self, node: &Self::Ref, key: &str) -> Result<(), HostError>;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: &Self::Ref, value: &str) -> Result<(), HostError>;
}

/// Handle into a [`MemoryHost`] node store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemRef(usize);

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    /// A detached element was created.
    CreateElement(String),
    /// A detached text node was created.
    CreateText(String),
    /// A detached node was attached at the end.
    Append(MemRef),
    /// A detached node was attached before an anchor.
    Insert(MemRef),
    /// An already-attached node was repositioned.
    Move(MemRef),
    /// A node was detached.
    Remove(MemRef),
    /// An attribute was written.
    SetAttr(String),
    /// An attribute was removed.
    RemoveAttr(String),
    /// Text content was replaced.
    SetText(String),
}

/// Structural snapshot of a host subtree, for test assertions.
///
/// Attributes are sorted by key so snapshots compare independently of the
/// order in which a reconciliation pass happened to write them.
#[derive(Debug, Clone, PartialEq)]
pub enum HostSnapshot {
    /// Text leaf.
    Text(String),
    /// Element with sorted attributes and ordered children.
    Element {
        /// Tag name.
        tag: String,
        /// Attributes sorted by key.
        attrs: Vec<(String, AttrValue)>,
        /// Children in display order.
        children: Vec<HostSnapshot>,
    },
}

#[derive(Debug)]
enum MemNodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, AttrValue>,
        children: Vec<MemRef>,
    },
    Text {
        value: String,
    },
}

#[derive(Debug)]
struct MemNode {
    kind: MemNodeKind,
    parent: Option<MemRef>,
}

/// In-memory recording host backend.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<MemNode>,
    ops: Vec<HostOp>,
    fail_text_updates: bool,
    fail_attribute_writes: bool,
    fail_element_creates: bool,
}

impl MemoryHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container element to mount into.
    pub fn create_root(&mut self) -> MemRef {
        let node = MemNode {
            kind: MemNodeKind::Element {
                tag: "#root".to_owned(),
                attrs: IndexMap::new(),
                children: Vec::new(),
            },
            parent: None,
        };
        self.nodes.push(node);
        MemRef(self.nodes.len() - 1)
    }

    /// All mutations recorded so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain and return the recorded mutations.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of reposition operations recorded.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, HostOp::Move(_)))
            .count()
    }

    /// Make subsequent `set_text` calls fail, to exercise the best-effort
    /// failure policy.
    pub fn fail_text_updates(&mut self, on: bool) {
        self.fail_text_updates = on;
    }

    /// Make subsequent `set_attribute` calls fail.
    pub fn fail_attribute_writes(&mut self, on: bool) {
        self.fail_attribute_writes = on;
    }

    /// Make subsequent `create_element` calls fail, to exercise subtree
    /// mount failures.
    pub fn fail_element_creates(&mut self, on: bool) {
        self.fail_element_creates = on;
    }

    /// Structural snapshot of the subtree under `node`.
    #[must_use]
    pub fn snapshot(&self, node: MemRef) -> HostSnapshot {
        match &self.nodes[node.0].kind {
            MemNodeKind::Text { value } => HostSnapshot::Text(value.clone()),
            MemNodeKind::Element {
                tag,
                attrs,
                children,
            } => {
                let mut sorted: Vec<(String, AttrValue)> = attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                HostSnapshot::Element {
                    tag: tag.clone(),
                    attrs: sorted,
                    children: children.iter().map(|c| self.snapshot(*c)).collect(),
                }
            }
        }
    }

    /// Display-order children of an element.
    #[must_use]
    pub fn children_of(&self, node: MemRef) -> Vec<MemRef> {
        match &self.nodes[node.0].kind {
            MemNodeKind::Element { children, .. } => children.clone(),
            MemNodeKind::Text { .. } => Vec::new(),
        }
    }

    fn alloc(&mut self, kind: MemNodeKind) -> MemRef {
        self.nodes.push(MemNode { kind, parent: None });
        MemRef(self.nodes.len() - 1)
    }

    fn detach(&mut self, child: MemRef) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            if let MemNodeKind::Element { children, .. } = &mut self.nodes[parent.0].kind {
                children.retain(|c| *c != child);
            }
        }
    }

    fn attach_at(&mut self, parent: MemRef, child: MemRef, index: Option<usize>) {
        if let MemNodeKind::Element { children, .. } = &mut self.nodes[parent.0].kind {
            match index {
                Some(i) => children.insert(i, child),
                None => children.push(child),
            }
        }
        self.nodes[child.0].parent = Some(parent);
    }

    fn check(&self, node: MemRef) -> Result<(), HostError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(HostError::UnknownRef(format!("mem node {}", node.0)))
        }
    }
}

impl HostBackend for MemoryHost {
    type Ref = MemRef;

    fn create_element(&mut self, tag: &str) -> Result<MemRef, HostError> {
        if self.fail_element_creates {
            return Err(HostError::Backend("injected create failure".into()));
        }
        let node = self.alloc(MemNodeKind::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        });
        self.ops.push(HostOp::CreateElement(tag.to_owned()));
        Ok(node)
    }

    fn create_text(&mut self, value: &str) -> Result<MemRef, HostError> {
        let node = self.alloc(MemNodeKind::Text {
            value: value.to_owned(),
        });
        self.ops.push(HostOp::CreateText(value.to_owned()));
        Ok(node)
    }

    fn append_child(&mut self, parent: &MemRef, child: &MemRef) -> Result<(), HostError> {
        self.check(*parent)?;
        self.check(*child)?;
        let was_attached = self.nodes[child.0].parent.is_some();
        self.detach(*child);
        self.attach_at(*parent, *child, None);
        self.ops.push(if was_attached {
            HostOp::Move(*child)
        } else {
            HostOp::Append(*child)
        });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &MemRef,
        child: &MemRef,
        anchor: &MemRef,
    ) -> Result<(), HostError> {
        self.check(*parent)?;
        self.check(*child)?;
        let was_attached = self.nodes[child.0].parent.is_some();
        self.detach(*child);
        let index = match &self.nodes[parent.0].kind {
            MemNodeKind::Element { children, .. } => {
                children.iter().position(|c| c == anchor).ok_or_else(|| {
                    HostError::Backend(format!("anchor {anchor:?} is not a child of {parent:?}"))
                })?
            }
            MemNodeKind::Text { .. } => {
                return Err(HostError::Backend("text nodes have no children".into()));
            }
        };
        self.attach_at(*parent, *child, Some(index));
        self.ops.push(if was_attached {
            HostOp::Move(*child)
        } else {
            HostOp::Insert(*child)
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &MemRef, child: &MemRef) -> Result<(), HostError> {
        self.check(*parent)?;
        self.check(*child)?;
        if self.nodes[child.0].parent != Some(*parent) {
            return Err(HostError::Backend(format!(
                "{child:?} is not a child of {parent:?}"
            )));
        }
        self.detach(*child);
        self.ops.push(HostOp::Remove(*child));
        Ok(())
    }

    fn set_attribute(
        &mut self,
        node: &MemRef,
        key: &str,
        value: &AttrValue,
    ) -> Result<(), HostError> {
        self.check(*node)?;
        if self.fail_attribute_writes {
            return Err(HostError::Backend("injected attribute failure".into()));
        }
        match &mut self.nodes[node.0].kind {
            MemNodeKind::Element { attrs, .. } => {
                attrs.insert(key.to_owned(), value.clone());
                self.ops.push(HostOp::SetAttr(key.to_owned()));
                Ok(())
            }
            MemNodeKind::Text { .. } => {
                Err(HostError::Backend("text nodes have no attributes".into()))
            }
        }
    }

    fn remove_attribute(&mut self, node: &MemRef, key: &str) -> Result<(), HostError> {
        self.check(*node)?;
        match &mut self.nodes[node.0].kind {
            MemNodeKind::Element { attrs, .. } => {
                attrs.shift_remove(key);
                self.ops.push(HostOp::RemoveAttr(key.to_owned()));
                Ok(())
            }
            MemNodeKind::Text { .. } => {
                Err(HostError::Backend("text nodes have no attributes".into()))
            }
        }
    }

    fn set_text(&mut self, node: &MemRef, value: &str) -> Result<(), HostError> {
        self.check(*node)?;
        if self.fail_text_updates {
            return Err(HostError::Backend("injected text failure".into()));
        }
        match &mut self.nodes[node.0].kind {
            MemNodeKind::Text { value: slot } => {
                *slot = value.to_owned();
                self.ops.push(HostOp::SetText(value.to_owned()));
                Ok(())
            }
            MemNodeKind::Element { .. } => {
                Err(HostError::Backend("cannot set text on an element".into()))
            }
        }
    }
}
