#![forbid(unsafe_code)]

//! The diff/patch engine.
//!
//! [`Reconciler::reconcile`] compares the retained tree with a freshly built
//! one and evolves the retained tree in place while driving the host backend
//! through the minimal set of structural edits: text updates, attribute
//! writes, keyed child insertion/removal, and heuristic minimal-move
//! reordering (see [`crate::order`]).
//!
//! Node identity is preserved whenever discriminant and key match, so host
//! nodes are reused instead of recreated. Host-callback failures are caught
//! at each edit site, logged, and skipped; a pass is best-effort, never
//! transactional, and the retained tree may diverge from the host for a
//! failed subtree until the next pass.

use crate::error::HostError;
use crate::host::HostBackend;
use crate::node::{ElementNode, Key, NodeId, VNode};
use crate::order::longest_retained_run;
use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::warn;

fn log_host_err<T>(result: Result<T, HostError>, op: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%err, op, "host callback failed; continuing best-effort");
            None
        }
    }
}

/// Diff/patch engine bound to one host backend.
///
/// Owns the side table mapping [`NodeId`] to host references; canonical tree
/// nodes themselves stay plain data.
pub struct Reconciler<H: HostBackend> {
    host: H,
    refs: AHashMap<NodeId, H::Ref>,
}

impl<H: HostBackend> Reconciler<H> {
    /// Wrap a host backend.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            host,
            refs: AHashMap::new(),
        }
    }

    /// Borrow the host backend.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutably borrow the host backend.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Host reference of a mounted node, if any.
    #[must_use]
    pub fn ref_of(&self, id: NodeId) -> Option<&H::Ref> {
        self.refs.get(&id)
    }

    /// Reconcile the retained tree in `slot` against `next` under `parent`.
    ///
    /// Restores the invariant "host mirror matches `next`": an empty slot
    /// mounts, an empty `next` unmounts, and two present trees are patched
    /// with identity preservation. `slot` afterwards holds the tree the host
    /// now mirrors.
    pub fn reconcile(&mut self, slot: &mut Option<VNode>, next: Option<VNode>, parent: &H::Ref) {
        match (slot.take(), next) {
            (None, None) => {}
            (None, Some(next)) => match self.mount(&next, parent, None) {
                Ok(_) => *slot = Some(next),
                Err(err) => {
                    warn!(%err, "failed to mount root; host left empty");
                }
            },
            (Some(prev), None) => self.unmount(&prev, parent),
            (Some(mut prev), Some(next)) => {
                self.patch(&mut prev, next, parent);
                *slot = Some(prev);
            }
        }
    }

    /// Create the host subtree for `node` and attach it under `parent`.
    ///
    /// Child mount failures are logged and skipped; a failure to create or
    /// attach `node` itself aborts this subtree.
    fn mount(
        &mut self,
        node: &VNode,
        parent: &H::Ref,
        anchor: Option<&H::Ref>,
    ) -> Result<H::Ref, HostError> {
        let node_ref = match node {
            VNode::Text(text) => self.host.create_text(&text.value)?,
            VNode::Element(el) => {
                let el_ref = self.host.create_element(&el.tag)?;
                for (key, value) in &el.attrs {
                    log_host_err(self.host.set_attribute(&el_ref, key, value), "set_attribute");
                }
                for key in &el.child_order {
                    if let Some(child) = el.children.get(key) {
                        if let Err(err) = self.mount(child, &el_ref, None) {
                            warn!(%err, %key, "failed to mount child; continuing with siblings");
                        }
                    }
                }
                el_ref
            }
        };
        let attached = match anchor {
            Some(anchor) => self.host.insert_before(parent, &node_ref, anchor),
            None => self.host.append_child(parent, &node_ref),
        };
        if let Err(err) = attached {
            self.forget(node);
            return Err(err);
        }
        self.refs.insert(node.id(), node_ref.clone());
        Ok(node_ref)
    }

    /// Detach `node` from the host and drop its side-table entries.
    fn unmount(&mut self, node: &VNode, parent: &H::Ref) {
        if let Some(node_ref) = self.refs.get(&node.id()).cloned() {
            log_host_err(self.host.remove_child(parent, &node_ref), "remove_child");
        }
        self.forget(node);
    }

    /// Drop side-table entries for `node` and all descendants.
    fn forget(&mut self, node: &VNode) {
        self.refs.remove(&node.id());
        if let VNode::Element(el) = node {
            for child in el.children.values() {
                self.forget(child);
            }
        }
    }

    fn patch(&mut self, prev: &mut VNode, next: VNode, parent: &H::Ref) {
        match (prev, next) {
            (VNode::Text(prev_text), VNode::Text(next_text)) => {
                if prev_text.value != next_text.value {
                    if let Some(node_ref) = self.refs.get(&prev_text.id).cloned() {
                        log_host_err(
                            self.host.set_text(&node_ref, &next_text.value),
                            "set_text",
                        );
                    }
                    // Record the new value even if the host write failed;
                    // the host catches up on the next full pass.
                    prev_text.value = next_text.value;
                }
            }
            (VNode::Element(prev_el), VNode::Element(next_el)) if prev_el.tag == next_el.tag => {
                self.patch_element(prev_el, next_el);
            }
            (prev, next) => self.replace(prev, next, parent),
        }
    }

    /// Discriminant mismatch: swap in a fresh host subtree for `next` and
    /// overwrite the retained node in place so external tree references stay
    /// valid.
    fn replace(&mut self, prev: &mut VNode, next: VNode, parent: &H::Ref) {
        let old_ref = self.refs.get(&prev.id()).cloned();
        match self.mount(&next, parent, old_ref.as_ref()) {
            Ok(_) => {
                if let Some(old_ref) = old_ref {
                    log_host_err(self.host.remove_child(parent, &old_ref), "remove_child");
                }
                self.forget(prev);
                *prev = next;
            }
            Err(err) => {
                warn!(%err, "failed to mount replacement; keeping previous subtree");
            }
        }
    }

    fn patch_element(&mut self, prev: &mut ElementNode, next: ElementNode) {
        let Some(node_ref) = self.refs.get(&prev.id).cloned() else {
            warn!(node = %prev.id, tag = %prev.tag, "element has no host reference; skipping subtree");
            return;
        };
        let ElementNode {
            attrs: next_attrs,
            children: mut next_children,
            child_order: next_order,
            ..
        } = next;

        // Attribute diff. Handlers never compare equal, so they are always
        // rewritten (closure equivalence is undecidable).
        for (key, value) in &next_attrs {
            if prev.attrs.get(key) != Some(value) {
                log_host_err(
                    self.host.set_attribute(&node_ref, key, value),
                    "set_attribute",
                );
            }
        }
        for key in prev.attrs.keys() {
            if !next_attrs.contains_key(key) {
                log_host_err(self.host.remove_attribute(&node_ref, key), "remove_attribute");
            }
        }
        prev.attrs = next_attrs;

        // Removals first: splice dropped keys out of the live order.
        let mut live: SmallVec<[Key; 8]> = SmallVec::new();
        let old_order = std::mem::take(&mut prev.child_order);
        for key in &old_order {
            if next_children.contains_key(key) {
                live.push(key.clone());
            } else if let Some(old_child) = prev.children.remove(key) {
                self.unmount(&old_child, &node_ref);
            }
        }

        // Patch survivors, append insertions at the end of the live order.
        for key in &next_order {
            let incoming = next_children.remove(key);
            match (prev.children.get_mut(key), incoming) {
                (Some(prev_child), Some(next_child)) => {
                    self.patch(prev_child, next_child, &node_ref);
                }
                (None, Some(next_child)) => match self.mount(&next_child, &node_ref, None) {
                    Ok(_) => {
                        prev.children.insert(key.clone(), next_child);
                        live.push(key.clone());
                    }
                    Err(err) => {
                        warn!(%err, %key, "failed to mount inserted child; continuing");
                    }
                },
                _ => {}
            }
        }

        // Adopt only keys that actually mounted, so a failed insertion
        // never leaves child_order out of step with children.
        let adopted: Vec<Key> = next_order
            .into_iter()
            .filter(|key| prev.children.contains_key(key))
            .collect();
        self.reorder(&node_ref, &live, &adopted, &prev.children);
        prev.child_order = adopted;
    }

    /// Reorder the host children from `live` to `target` by leaving the
    /// longest retained run alone and moving everything else: keys before
    /// the run prepend in reverse (each before the previous front), keys
    /// after it append.
    fn reorder(
        &mut self,
        parent: &H::Ref,
        live: &[Key],
        target: &[Key],
        children: &AHashMap<Key, VNode>,
    ) {
        if live.len() <= 1 || live == target {
            return;
        }
        if live.len() != target.len() {
            // A child mount failed earlier this pass; leave the order as is
            // and let the next pass repair it.
            warn!(
                live = live.len(),
                target = target.len(),
                "child order out of sync; skipping reorder"
            );
            return;
        }
        let run = longest_retained_run(live, target);
        let pre = &target[..run.target_start];
        let post = &target[run.target_start + run.len..];

        let child_ref = |this: &Self, key: &Key| -> Option<H::Ref> {
            children
                .get(key)
                .and_then(|child| this.refs.get(&child.id()).cloned())
        };

        let Some(mut anchor) = child_ref(self, &target[run.target_start]) else {
            warn!("run anchor has no host reference; skipping reorder");
            return;
        };
        for key in pre.iter().rev() {
            let Some(node_ref) = child_ref(self, key) else {
                warn!(%key, "missing host reference during reorder");
                continue;
            };
            log_host_err(self.host.insert_before(parent, &node_ref, &anchor), "insert_before");
            anchor = node_ref;
        }
        for key in post {
            let Some(node_ref) = child_ref(self, key) else {
                warn!(%key, "missing host reference during reorder");
                continue;
            };
            log_host_err(self.host.append_child(parent, &node_ref), "append_child");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostOp, HostSnapshot, MemRef, MemoryHost};
    use crate::node::Element;
    use proptest::prelude::*;
    use vireo_state::Value;

    fn list_of(tags: &[&str]) -> VNode {
        let mut el = Element::new("ul");
        for tag in tags {
            el = el.child(*tag, VNode::text(*tag));
        }
        el.build().expect("build list")
    }

    fn mounted(next: VNode) -> (Reconciler<MemoryHost>, Option<VNode>, MemRef) {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut rec = Reconciler::new(host);
        let mut slot = None;
        rec.reconcile(&mut slot, Some(next), &root);
        rec.host_mut().take_ops();
        (rec, slot, root)
    }

    fn fresh_snapshot(node: &VNode) -> HostSnapshot {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut rec = Reconciler::new(host);
        let mut slot = None;
        rec.reconcile(&mut slot, Some(node.clone()), &root);
        rec.host().snapshot(root)
    }

    #[test]
    fn mount_builds_the_full_tree() {
        let tree = Element::new("div")
            .attr("class", "box")
            .child("msg", VNode::text("hello"))
            .build()
            .expect("build");
        let (rec, slot, root) = mounted(tree);
        assert!(slot.is_some());
        assert_eq!(
            rec.host().snapshot(root),
            HostSnapshot::Element {
                tag: "#root".into(),
                attrs: vec![],
                children: vec![HostSnapshot::Element {
                    tag: "div".into(),
                    attrs: vec![("class".into(), "box".into())],
                    children: vec![HostSnapshot::Text("hello".into())],
                }],
            }
        );
    }

    #[test]
    fn unmount_empties_the_host() {
        let (mut rec, mut slot, root) = mounted(list_of(&["a", "b"]));
        rec.reconcile(&mut slot, None, &root);
        assert!(slot.is_none());
        assert!(rec.host().children_of(root).is_empty());
    }

    #[test]
    fn same_tree_is_a_no_op() {
        let (mut rec, mut slot, root) = mounted(list_of(&["a", "b", "c"]));
        rec.reconcile(&mut slot, Some(list_of(&["a", "b", "c"])), &root);
        assert!(
            rec.host().ops().is_empty(),
            "identical trees must produce zero host mutations, got {:?}",
            rec.host().ops()
        );
    }

    #[test]
    fn text_change_updates_in_place() {
        let (mut rec, mut slot, root) = mounted(VNode::text("before"));
        let id = slot.as_ref().map(VNode::id).expect("mounted");
        rec.reconcile(&mut slot, Some(VNode::text("after")), &root);
        assert_eq!(rec.host().ops(), [HostOp::SetText("after".into())]);
        // Identity survives an in-place patch.
        assert_eq!(slot.as_ref().map(VNode::id), Some(id));
    }

    #[test]
    fn tag_change_replaces_the_node() {
        let before = Element::new("span").build().expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        let after = Element::new("div").build().expect("build");
        rec.reconcile(&mut slot, Some(after), &root);
        assert_eq!(
            rec.host().snapshot(root),
            HostSnapshot::Element {
                tag: "#root".into(),
                attrs: vec![],
                children: vec![HostSnapshot::Element {
                    tag: "div".into(),
                    attrs: vec![],
                    children: vec![],
                }],
            }
        );
    }

    #[test]
    fn text_to_element_replaces_the_node() {
        let (mut rec, mut slot, root) = mounted(VNode::text("plain"));
        let after = Element::new("b").child("t", VNode::text("bold")).build().expect("build");
        rec.reconcile(&mut slot, Some(after.clone()), &root);
        assert_eq!(rec.host().snapshot(root), fresh_snapshot(&after));
    }

    #[test]
    fn attribute_add_change_remove() {
        let before = Element::new("div")
            .attr("a", "1")
            .attr("b", "2")
            .build()
            .expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        let after = Element::new("div")
            .attr("b", "changed")
            .attr("c", "3")
            .build()
            .expect("build");
        rec.reconcile(&mut slot, Some(after.clone()), &root);
        let ops = rec.host_mut().take_ops();
        assert!(ops.contains(&HostOp::SetAttr("b".into())));
        assert!(ops.contains(&HostOp::SetAttr("c".into())));
        assert!(ops.contains(&HostOp::RemoveAttr("a".into())));
        assert_eq!(rec.host().snapshot(root), fresh_snapshot(&after));
    }

    #[test]
    fn unchanged_attribute_is_not_rewritten() {
        let before = Element::new("div").attr("keep", "same").build().expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        let after = Element::new("div").attr("keep", "same").build().expect("build");
        rec.reconcile(&mut slot, Some(after), &root);
        assert!(rec.host().ops().is_empty());
    }

    #[test]
    fn handler_attribute_is_always_rewritten() {
        let before = Element::new("button")
            .attr("on-press", crate::node::AttrValue::handler(|_| {}))
            .build()
            .expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        let after = Element::new("button")
            .attr("on-press", crate::node::AttrValue::handler(|_| {}))
            .build()
            .expect("build");
        rec.reconcile(&mut slot, Some(after), &root);
        assert_eq!(rec.host().ops(), [HostOp::SetAttr("on-press".into())]);
    }

    #[test]
    fn keyed_insert_and_remove() {
        let (mut rec, mut slot, root) = mounted(list_of(&["a", "b", "c"]));
        let after = list_of(&["a", "c", "d"]);
        rec.reconcile(&mut slot, Some(after.clone()), &root);
        assert_eq!(rec.host().snapshot(root), fresh_snapshot(&after));
    }

    #[test]
    fn rotation_costs_exactly_one_move() {
        let (mut rec, mut slot, root) = mounted(list_of(&["a", "b", "c"]));
        rec.reconcile(&mut slot, Some(list_of(&["c", "a", "b"])), &root);
        assert_eq!(rec.host().move_count(), 1);
        assert_eq!(rec.host().snapshot(root), fresh_snapshot(&list_of(&["c", "a", "b"])));
    }

    #[test]
    fn failed_text_write_does_not_stop_the_pass() {
        let before = Element::new("p")
            .child("a", VNode::text("one"))
            .child("b", VNode::text("two"))
            .build()
            .expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        rec.host_mut().fail_text_updates(true);
        let after = Element::new("p")
            .child("a", VNode::text("ONE"))
            .child("b", VNode::text("TWO"))
            .attr("done", true)
            .build()
            .expect("build");
        rec.reconcile(&mut slot, Some(after), &root);
        // Both text writes failed, but the attribute write still landed.
        assert!(rec.host().ops().contains(&HostOp::SetAttr("done".into())));
        // The retained tree recorded the new values; the host lags behind.
        let VNode::Element(el) = slot.as_ref().expect("tree kept") else {
            panic!("expected element");
        };
        let VNode::Text(t) = &el.children["a"] else {
            panic!("expected text child");
        };
        assert_eq!(t.value, "ONE");
    }

    #[test]
    fn failed_attribute_write_does_not_stop_the_pass() {
        let before = Element::new("div")
            .attr("a", "1")
            .child("t", VNode::text("old"))
            .build()
            .expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        rec.host_mut().fail_attribute_writes(true);
        let after = Element::new("div")
            .attr("a", "2")
            .child("t", VNode::text("new"))
            .build()
            .expect("build");
        rec.reconcile(&mut slot, Some(after), &root);
        let ops = rec.host_mut().take_ops();
        // The attribute write failed, but the text update still landed.
        assert!(ops.contains(&HostOp::SetText("new".into())));
        assert!(!ops.iter().any(|op| matches!(op, HostOp::SetAttr(_))));
        // The retained tree recorded the new attribute; the host lags behind.
        let VNode::Element(el) = slot.as_ref().expect("tree kept") else {
            panic!("expected element");
        };
        assert_eq!(el.attrs["a"], crate::node::AttrValue::from("2"));
    }

    #[test]
    fn failed_child_mount_keeps_order_consistent() {
        let before = Element::new("ul")
            .child("a", Element::new("li").build().expect("build"))
            .build()
            .expect("build");
        let (mut rec, mut slot, root) = mounted(before);
        rec.host_mut().fail_element_creates(true);
        fn grown() -> VNode {
            Element::new("ul")
                .child("a", Element::new("li").build().expect("build"))
                .child("b", Element::new("li").build().expect("build"))
                .build()
                .expect("build")
        }
        rec.reconcile(&mut slot, Some(grown()), &root);
        let VNode::Element(el) = slot.as_ref().expect("tree kept") else {
            panic!("expected element");
        };
        // The failed insertion must not be adopted into the order.
        assert_eq!(el.child_order, ["a"]);
        el.check_order().expect("order stays a permutation of children");

        // The next pass repairs the host once creates succeed again.
        rec.host_mut().fail_element_creates(false);
        rec.reconcile(&mut slot, Some(grown()), &root);
        assert_eq!(rec.host().snapshot(root), fresh_snapshot(&grown()));
        let VNode::Element(el) = slot.as_ref().expect("tree kept") else {
            panic!("expected element");
        };
        assert_eq!(el.child_order, ["a", "b"]);
    }

    // --- Property tests ----------------------------------------------------

    #[derive(Debug, Clone)]
    enum Blueprint {
        Text(u8),
        El {
            tag: u8,
            attrs: Vec<(u8, u8)>,
            children: Vec<(u8, Blueprint)>,
        },
    }

    fn arb_blueprint() -> impl Strategy<Value = Blueprint> {
        let leaf = (0u8..5).prop_map(Blueprint::Text);
        leaf.prop_recursive(3, 16, 4, |inner| {
            (
                0u8..3,
                proptest::collection::vec((0u8..4, 0u8..4), 0..3),
                proptest::collection::vec((0u8..6, inner), 0..4),
            )
                .prop_map(|(tag, attrs, children)| Blueprint::El { tag, attrs, children })
        })
    }

    fn build_node(blueprint: &Blueprint) -> VNode {
        match blueprint {
            Blueprint::Text(n) => VNode::text(format!("text-{n}")),
            Blueprint::El { tag, attrs, children } => {
                let mut el = Element::new(format!("tag{tag}"));
                for (k, v) in attrs {
                    el = el.attr(format!("a{k}"), Value::from(f64::from(*v)));
                }
                let mut seen = Vec::new();
                for (key, child) in children {
                    if seen.contains(key) {
                        continue;
                    }
                    seen.push(*key);
                    el = el.child(format!("k{key}"), build_node(child));
                }
                el.build().expect("generated keys are deduplicated")
            }
        }
    }

    proptest! {
        #[test]
        fn reconcile_is_idempotent(blueprint in arb_blueprint()) {
            let (mut rec, mut slot, root) = mounted(build_node(&blueprint));
            rec.reconcile(&mut slot, Some(build_node(&blueprint)), &root);
            prop_assert!(rec.host().ops().is_empty(), "ops: {:?}", rec.host().ops());
        }

        #[test]
        fn reconcile_round_trips((a, b) in (arb_blueprint(), arb_blueprint())) {
            let target = build_node(&b);
            let (mut rec, mut slot, root) = mounted(build_node(&a));
            rec.reconcile(&mut slot, Some(target.clone()), &root);
            prop_assert_eq!(rec.host().snapshot(root), fresh_snapshot(&target));
        }
    }
}
