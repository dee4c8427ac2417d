//! The state container.
//!
//! An [`Atom`] owns the canonical state, the list of attached render
//! targets and the list of subscribers. Every update runs to completion
//! before returning:
//!
//! ```text
//! set_state(partial) ──→ merge ──→ render every target ──→ notify subscribers
//! ```
//!
//! Nothing here fails loudly. Degraded paths (duplicate attach, dropped
//! targets, broken directives) report a [`Diagnostic`] and carry on.

mod error;
mod subscription;

use std::sync::Arc;

use parking_lot::Mutex;

pub use error::AtomError;
pub use subscription::{Subscriber, SubscriberId, Subscription};

use subscription::{SubscriberEntry, SubscriberRegistry};

use crate::config::{AtomConfig, DuplicatePolicy};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
use crate::dom::{DomNode, Element, NodeHandle};
use crate::render::Renderer;
use crate::state::{merge_state, AtomState, ReadOnlyState};

/// Reactive state container bound to render targets of type `N`.
///
/// Cloning an `Atom` clones the handle; both handles drive the same
/// container.
pub struct Atom<N: DomNode = Element> {
    inner: Arc<Mutex<AtomInner<N>>>,
}

struct AtomInner<N: DomNode> {
    state: Arc<AtomState>,
    targets: Vec<N::Handle>,
    subscribers: Vec<SubscriberEntry>,
    next_subscriber_id: u64,
    config: AtomConfig,
    diagnostics: Diagnostics,
}

/// Everything a render pass needs, copied out of the lock.
struct RenderJob<N: DomNode> {
    state: Arc<AtomState>,
    targets: Vec<N::Handle>,
    config: AtomConfig,
    diagnostics: Diagnostics,
}

impl<N: DomNode> RenderJob<N> {
    fn run(&self) {
        let renderer = Renderer::new(&self.config.directives, &self.diagnostics);
        for handle in &self.targets {
            match handle.upgrade() {
                Some(target) => renderer.render(&target, &self.state),
                None => self.diagnostics.emit(Diagnostic::DroppedTarget),
            }
        }
    }
}

impl Atom {
    /// Creates a container over in-memory [`Element`] trees with default config.
    pub fn new(initial: AtomState) -> Self {
        Self::with_config(initial, AtomConfig::default())
    }
}

impl<N: DomNode> Atom<N> {
    /// Creates a container; diagnostics go to `tracing`.
    pub fn with_config(initial: AtomState, config: AtomConfig) -> Self {
        Self::with_diagnostics(initial, config, Diagnostics::new())
    }

    pub fn with_diagnostics(initial: AtomState, config: AtomConfig, diagnostics: Diagnostics) -> Self {
        tracing::debug!(keys = initial.len(), "Atom created");
        Self {
            inner: Arc::new(Mutex::new(AtomInner {
                state: Arc::new(initial),
                targets: Vec::new(),
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                config,
                diagnostics,
            })),
        }
    }

    /// Builder form of [`Atom::add_sink`].
    pub fn with_sink(self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Registers an additional diagnostic sink.
    pub fn add_sink(&self, sink: Arc<dyn DiagnosticSink>) {
        self.inner.lock().diagnostics.add_sink(sink);
    }

    pub fn config(&self) -> AtomConfig {
        self.inner.lock().config.clone()
    }

    /// Copy of the current state.
    pub fn get_state(&self) -> AtomState {
        self.inner.lock().state.as_ref().clone()
    }

    /// Read-only view of the current state.
    pub fn state(&self) -> ReadOnlyState {
        let inner = self.inner.lock();
        ReadOnlyState::new(Arc::clone(&inner.state), inner.diagnostics.clone())
    }

    /// Shallow-merges `partial` into state, re-renders every attached
    /// target, then notifies every subscriber.
    ///
    /// Each subscriber receives the state current at the moment it is
    /// called, so a nested `set_state` from an earlier subscriber is never
    /// followed by a stale snapshot. A subscriber removed during the pass
    /// is not called.
    pub fn set_state(&self, partial: AtomState) {
        let (job, subscribers, log_state) = {
            let mut inner = self.inner.lock();
            let next = Arc::new(merge_state(&inner.state, partial));
            inner.state = Arc::clone(&next);
            let subscribers: Vec<_> = inner
                .subscribers
                .iter()
                .map(|entry| (entry.id, Arc::clone(&entry.callback)))
                .collect();
            (
                RenderJob::<N> {
                    state: next,
                    targets: inner.targets.clone(),
                    config: inner.config.clone(),
                    diagnostics: inner.diagnostics.clone(),
                },
                subscribers,
                inner.config.log_state_changes,
            )
        };

        job.run();
        for (id, callback) in &subscribers {
            let current = {
                let inner = self.inner.lock();
                if !inner.subscribers.iter().any(|entry| entry.id == *id) {
                    continue;
                }
                Arc::clone(&inner.state)
            };
            callback(&current);
        }

        if log_state {
            tracing::debug!(state = ?job.state, "set_state");
        }
    }

    /// Computes a partial from the current state and applies it.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&AtomState) -> AtomState,
    {
        let current = Arc::clone(&self.inner.lock().state);
        self.set_state(f(&current));
    }

    /// Re-renders every attached target without changing state.
    pub fn render(&self) {
        self.render_job(None).run();
    }

    fn render_job(&self, only: Option<N::Handle>) -> RenderJob<N> {
        let inner = self.inner.lock();
        RenderJob {
            state: Arc::clone(&inner.state),
            targets: match only {
                Some(handle) => vec![handle],
                None => inner.targets.clone(),
            },
            config: inner.config.clone(),
            diagnostics: inner.diagnostics.clone(),
        }
    }

    /// Adds `target` to the attachment list and renders it immediately.
    ///
    /// With [`DuplicatePolicy::Ignore`] an already attached target is left
    /// alone and a `DuplicateTarget` diagnostic is reported.
    pub fn attach(&self, target: &N) {
        let rejected = {
            let mut inner = self.inner.lock();
            let duplicate = inner.config.attach.duplicates == DuplicatePolicy::Ignore
                && position_of(&inner.targets, target).is_some();
            if duplicate {
                Some(inner.diagnostics.clone())
            } else {
                inner.targets.push(target.downgrade());
                tracing::debug!(targets = inner.targets.len(), "Target attached");
                None
            }
        };

        match rejected {
            Some(diagnostics) => diagnostics.emit(Diagnostic::DuplicateTarget),
            None => self.render_job(Some(target.downgrade())).run(),
        }
    }

    /// Alias of [`Atom::attach`].
    pub fn connect(&self, target: &N) {
        self.attach(target);
    }

    /// Removes the first entry for `target`; no-op if it is not attached.
    pub fn detach(&self, target: &N) {
        let mut inner = self.inner.lock();
        if let Some(index) = position_of(&inner.targets, target) {
            inner.targets.remove(index);
        }
        tracing::debug!(targets = inner.targets.len(), "Target detached");
    }

    /// Alias of [`Atom::detach`].
    pub fn disconnect(&self, target: &N) {
        self.detach(target);
    }

    /// Drops entries whose target no longer exists.
    pub fn cleanup(&self) {
        let mut inner = self.inner.lock();
        let before = inner.targets.len();
        inner.targets.retain(|handle| handle.upgrade().is_some());
        tracing::debug!(
            removed = before - inner.targets.len(),
            remaining = inner.targets.len(),
            "Cleaned up dropped targets"
        );
    }

    pub fn is_attached(&self, target: &N) -> bool {
        position_of(&self.inner.lock().targets, target).is_some()
    }

    /// Entries in the attachment list, including dropped ones not yet cleaned up.
    pub fn target_count(&self) -> usize {
        self.inner.lock().targets.len()
    }

    /// Registers `callback` to receive every future state snapshot.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AtomState) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.inner.lock();
            let id = SubscriberId(inner.next_subscriber_id);
            inner.next_subscriber_id += 1;
            inner.subscribers.push(SubscriberEntry {
                id,
                callback: Arc::new(callback),
            });
            tracing::debug!(subscriber = %id, total = inner.subscribers.len(), "Subscribed");
            id
        };

        let registry: Arc<dyn SubscriberRegistry> = self.inner.clone();
        Subscription::new(id, Arc::downgrade(&registry))
    }

    /// Removes a subscriber; no-op if it is not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.remove_subscriber(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

fn position_of<N: DomNode>(targets: &[N::Handle], target: &N) -> Option<usize> {
    targets.iter().position(|handle| {
        handle
            .upgrade()
            .is_some_and(|attached| attached.same_node(target))
    })
}

impl<N: DomNode> SubscriberRegistry for Mutex<AtomInner<N>> {
    fn remove_subscriber(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock();
        let removed = match inner.subscribers.iter().position(|entry| entry.id == id) {
            Some(index) => {
                inner.subscribers.remove(index);
                true
            }
            None => false,
        };
        tracing::debug!(subscriber = %id, removed, total = inner.subscribers.len(), "Unsubscribed");
        removed
    }
}

impl<N: DomNode> Clone for Atom<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::state::into_partial;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn partial(value: serde_json::Value) -> AtomState {
        into_partial(value)
    }

    #[test]
    fn test_subscriber_ids_are_sequential() {
        let atom = Atom::new(AtomState::new());
        let first = atom.subscribe(|_| {});
        let second = atom.subscribe(|_| {});
        assert_eq!(first.id().to_string(), "sub_0");
        assert_eq!(second.id().to_string(), "sub_1");
        assert_eq!(atom.subscriber_count(), 2);
    }

    #[test]
    fn test_subscription_outliving_atom_is_harmless() {
        let atom = Atom::new(AtomState::new());
        let subscription = atom.subscribe(|_| {});
        drop(atom);
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_subscriber_may_reenter() {
        let atom = Atom::new(partial(json!({"count": 0})));
        let calls = Arc::new(AtomicUsize::new(0));
        let reader = atom.clone();
        let seen = calls.clone();
        atom.subscribe(move |state| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(reader.get_state(), *state);
            if state["count"] == json!(1) {
                reader.set_state(partial(json!({"count": 2})));
            }
        });

        atom.set_state(partial(json!({"count": 1})));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(atom.get_state()["count"], json!(2));
    }

    #[test]
    fn test_subscriber_removed_mid_pass_is_skipped() {
        let atom = Atom::new(AtomState::new());
        let pending: Arc<Mutex<Option<SubscriberId>>> = Arc::new(Mutex::new(None));
        let remover = atom.clone();
        let target = pending.clone();
        atom.subscribe(move |_| {
            if let Some(id) = target.lock().take() {
                remover.unsubscribe(id);
            }
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let second = atom.subscribe(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        *pending.lock() = Some(second.id());

        atom.set_state(partial(json!({"n": 1})));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(atom.subscriber_count(), 1);
    }

    #[test]
    fn test_later_subscriber_ends_on_current_state() {
        let atom = Atom::new(partial(json!({"count": 0})));
        let writer = atom.clone();
        atom.subscribe(move |state| {
            if state["count"] == json!(1) {
                writer.set_state(partial(json!({"count": 2})));
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        atom.subscribe(move |state| log.lock().push(state["count"].clone()));

        atom.set_state(partial(json!({"count": 1})));

        let seen = seen.lock();
        assert_eq!(seen.last(), Some(&json!(2)));
        assert!(!seen.contains(&json!(1)));
        assert_eq!(atom.get_state()["count"], json!(2));
    }

    #[test]
    fn test_duplicate_attach_is_ignored_by_default() {
        let sink = Arc::new(MemorySink::new());
        let atom: Atom = Atom::with_diagnostics(
            AtomState::new(),
            AtomConfig::default(),
            Diagnostics::silent().with_sink(sink.clone()),
        );
        let target = Element::new("div");

        atom.attach(&target);
        atom.attach(&target);

        assert_eq!(atom.target_count(), 1);
        assert_eq!(sink.kinds(), vec!["duplicate_target"]);
    }

    #[test]
    fn test_duplicate_attach_allowed_by_config() {
        let mut config = AtomConfig::default();
        config.attach.duplicates = DuplicatePolicy::Allow;
        let atom: Atom = Atom::with_config(AtomState::new(), config);
        let target = Element::new("div");

        atom.attach(&target);
        atom.attach(&target);
        assert_eq!(atom.target_count(), 2);

        atom.detach(&target);
        assert_eq!(atom.target_count(), 1);
        assert!(atom.is_attached(&target));
    }

    #[test]
    fn test_dropped_target_skipped_then_cleaned_up() {
        let sink = Arc::new(MemorySink::new());
        let atom: Atom = Atom::with_diagnostics(
            partial(json!({"n": 1})),
            AtomConfig::default(),
            Diagnostics::silent().with_sink(sink.clone()),
        );
        let kept = Element::new("p").with_attr("x-text", "n");
        atom.attach(&kept);
        atom.attach(&Element::new("p"));

        atom.set_state(partial(json!({"n": 2})));
        assert_eq!(kept.text_content(), "2");
        assert_eq!(sink.kinds(), vec!["dropped_target"]);

        assert_eq!(atom.target_count(), 2);
        atom.cleanup();
        assert_eq!(atom.target_count(), 1);
        assert!(atom.is_attached(&kept));
    }
}
