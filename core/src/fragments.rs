#![deny(missing_docs)]

//! # Fragment Store
//!
//! Per-unit registry of reusable "dry" declarations. A fragment is a deferred
//! mutation of an [`ActionSpec`], registered under a [`Selector`] and replayed on
//! every matching action before that action's own declaration block runs.
//!
//! Resolution order is fixed: `All`, then the action's tag, then the action name.
//! Within one selector, registration order is kept. Later fragments overwrite the
//! fields written by earlier ones.

use crate::action::ActionSpec;
use derive_more::Display;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// What a fragment applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Selector {
    /// Every action of the unit.
    #[display("all")]
    All,
    /// Actions whose effective tag has this name.
    #[display("tag:{_0}")]
    Tag(String),
    /// The action with this name.
    #[display("action:{_0}")]
    Action(String),
}

impl Selector {
    /// Selector for one action.
    pub fn action(name: impl Into<String>) -> Self {
        Selector::Action(name.into())
    }

    /// Selector for one tag.
    pub fn tag(name: impl Into<String>) -> Self {
        Selector::Tag(name.into())
    }
}

/// A shareable, replayable mutation of an [`ActionSpec`].
#[derive(Clone)]
pub struct Fragment(Arc<dyn Fn(&mut ActionSpec) + Send + Sync>);

impl Fragment {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&mut ActionSpec) + Send + Sync + 'static) -> Self {
        Fragment(Arc::new(f))
    }

    /// Runs the fragment against `spec`.
    pub fn apply(&self, spec: &mut ActionSpec) {
        (self.0)(spec)
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fragment(..)")
    }
}

/// Fragments of one unit, keyed by selector.
#[derive(Debug, Clone, Default)]
pub struct FragmentStore {
    entries: IndexMap<Selector, Vec<Fragment>>,
}

impl FragmentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment under `selector`.
    pub fn register(&mut self, selector: Selector, fragment: Fragment) {
        self.entries.entry(selector).or_default().push(fragment);
    }

    /// Fragments applicable to `action` tagged `tag`: all, then tag, then action.
    pub fn resolve(&self, action: &str, tag: &str) -> Vec<Fragment> {
        [
            Selector::All,
            Selector::tag(tag),
            Selector::action(action),
        ]
        .iter()
        .filter_map(|selector| self.entries.get(selector))
        .flatten()
        .cloned()
        .collect()
    }

    /// Total number of registered fragments.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
