#![forbid(unsafe_code)]

//! The render driver.
//!
//! [`App`] ties a [`Store`] to a view function and a host backend. Commits
//! mark the app dirty; [`App::flush`] rebuilds the view from current state
//! and reconciles it against the retained tree in one pass. Any number of
//! commits between flushes coalesce into a single render, which is what
//! makes batch dispatch cheap: callers dispatch freely and flush once at
//! the end of the turn.

use crate::error::AppError;
use crate::store::{Store, StoreConfig};
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;
use vireo_state::Value;
use vireo_vdom::{HostBackend, Reconciler, TreeError, VNode};

/// Builds the view tree for a given state.
pub type ViewFn = dyn Fn(&Value) -> Result<VNode, TreeError>;

/// A store wired to a view function and a host.
///
/// The app owns its store; use [`store`](App::store) and
/// [`store_mut`](App::store_mut) to register bindings, middleware, and
/// watchers or to dispatch actions, then call [`flush`](App::flush) to bring
/// the host tree up to date.
pub struct App<H: HostBackend> {
    store: Store,
    view: Box<ViewFn>,
    reconciler: Reconciler<H>,
    root: H::Ref,
    current: Option<VNode>,
    dirty: Rc<Cell<bool>>,
}

impl<H: HostBackend> App<H> {
    /// Build an app with the default store configuration.
    pub fn new(
        host: H,
        root: H::Ref,
        view: impl Fn(&Value) -> Result<VNode, TreeError> + 'static,
    ) -> Self {
        Self::with_config(host, root, view, StoreConfig::default())
    }

    /// Build an app with explicit store options.
    pub fn with_config(
        host: H,
        root: H::Ref,
        view: impl Fn(&Value) -> Result<VNode, TreeError> + 'static,
        config: StoreConfig,
    ) -> Self {
        let mut store = Store::with_config(config);
        let dirty = Rc::new(Cell::new(false));
        let flag = dirty.clone();
        store.watch(move |_, _| flag.set(true));
        Self {
            store,
            view: Box::new(view),
            reconciler: Reconciler::new(host),
            root,
            current: None,
            dirty,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The underlying store, mutably.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// The host backend.
    #[must_use]
    pub fn host(&self) -> &H {
        self.reconciler.host()
    }

    /// The host backend, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        self.reconciler.host_mut()
    }

    /// True if a commit has landed since the last flush.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get() || (self.current.is_none() && self.store.is_ready())
    }

    /// Render pending state changes, if any.
    ///
    /// Rebuilds the view and reconciles it against the retained tree. All
    /// commits since the previous flush collapse into this one pass. Returns
    /// whether a render happened; a clean app (or one whose state was never
    /// set) is a no-op.
    pub fn flush(&mut self) -> Result<bool, AppError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        let state = self.store.state()?;
        let next = (self.view)(state)?;
        trace!("flushing view");
        self.reconciler
            .reconcile(&mut self.current, Some(next), &self.root);
        self.dirty.set(false);
        Ok(true)
    }

    /// Tear down the rendered tree, releasing every host node.
    pub fn unmount(&mut self) {
        self.reconciler
            .reconcile(&mut self.current, None, &self.root);
        self.dirty.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_vdom::{Element, HostOp, MemoryHost};

    fn counter_app() -> App<MemoryHost> {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut app = App::new(host, root, |state| {
            Element::new("label")
                .attr("count", state.clone())
                .build()
        });
        app.store_mut().on("increment", |state, _| {
            Value::from(state.as_number().unwrap_or(0.0) + 1.0)
        });
        app
    }

    #[test]
    fn flush_before_set_state_is_a_noop() {
        let mut app = counter_app();
        assert_eq!(app.flush(), Ok(false));
        assert!(app.host_mut().take_ops().is_empty());
    }

    #[test]
    fn first_flush_mounts_the_view() {
        let mut app = counter_app();
        app.store_mut().set_state(0.0).expect("init");
        assert_eq!(app.flush(), Ok(true));
        let ops = app.host_mut().take_ops();
        assert!(
            ops.iter()
                .any(|op| matches!(op, HostOp::CreateElement(tag) if tag == "label"))
        );
    }

    #[test]
    fn commits_between_flushes_coalesce() {
        let mut app = counter_app();
        app.store_mut().set_state(0.0).expect("init");
        app.flush().expect("mount");
        app.host_mut().take_ops();

        for _ in 0..3 {
            app.store_mut()
                .dispatch("increment", Value::Null)
                .expect("dispatch");
        }
        app.flush().expect("render");
        let ops = app.host_mut().take_ops();
        // One attribute write, not three: intermediate states never render.
        let attr_writes = ops
            .iter()
            .filter(|op| matches!(op, HostOp::SetAttr(_)))
            .count();
        assert_eq!(attr_writes, 1);
    }

    #[test]
    fn clean_flush_is_a_noop() {
        let mut app = counter_app();
        app.store_mut().set_state(0.0).expect("init");
        app.flush().expect("mount");
        app.host_mut().take_ops();
        assert_eq!(app.flush(), Ok(false));
        assert!(app.host_mut().take_ops().is_empty());
    }

    #[test]
    fn cancelled_dispatch_does_not_dirty() {
        use crate::middleware::{Middleware, Next, Outcome};
        use crate::{Action, StoreError};

        struct Deny;
        impl Middleware for Deny {
            fn intercept(
                &self,
                _state: Value,
                _action: &Action,
                _next: Next<'_>,
            ) -> Result<Outcome, StoreError> {
                Ok(Outcome::Cancelled)
            }
        }
        let mut app = counter_app();
        app.store_mut().set_state(0.0).expect("init");
        app.flush().expect("mount");
        app.host_mut().take_ops();

        app.store_mut().add_middleware(Deny);
        app.store_mut()
            .dispatch("increment", Value::Null)
            .expect("dispatch");
        assert_eq!(app.flush(), Ok(false));
    }

    #[test]
    fn unmount_releases_the_tree() {
        let mut app = counter_app();
        app.store_mut().set_state(0.0).expect("init");
        app.flush().expect("mount");
        app.host_mut().take_ops();
        app.unmount();
        let ops = app.host_mut().take_ops();
        assert!(ops.iter().any(|op| matches!(op, HostOp::Remove(_))));
        assert_eq!(app.flush(), Ok(true), "state is still set; flush remounts");
    }
}
