//! Run-scoped shared context
//!
//! A key/value store tests use to hand data to each other. At most one
//! [`SharedContext`] is live at a time. The [`SharedContextManager`] owning
//! it belongs to the [`TestRunner`](crate::TestRunner), which hands suites a
//! weak [`ContextHandle`] when they declare a shared-context dependency.
//!
//! The store is visible to every suite the runner executes, so a suite can
//! read what an earlier suite left behind until someone disposes it.
//! Everything here is `Rc`/`RefCell` based: suites never run concurrently.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Shared context errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("shared context is unavailable: the owning runner was dropped")]
    RunnerDropped,
}

/// A key to heterogeneous value store
pub struct SharedContext {
    initialization_count: u64,
    disposed: Cell<bool>,
    data: RefCell<HashMap<String, Box<dyn Any>>>,
}

impl SharedContext {
    fn new(initialization_count: u64) -> Self {
        Self {
            initialization_count,
            disposed: Cell::new(false),
            data: RefCell::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, replacing any previous entry whole.
    pub fn set_data<T: 'static>(&self, key: impl Into<String>, value: T) {
        self.data.borrow_mut().insert(key.into(), Box::new(value));
    }

    /// A clone of the value under `key`.
    ///
    /// Returns `None` when the key is absent or holds another type.
    pub fn get_data<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.data
            .borrow()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub fn get_data_or_default<T: Clone + Default + 'static>(&self, key: &str) -> T {
        self.get_data(key).unwrap_or_default()
    }

    /// Mutate the value under `key` in place.
    ///
    /// `f` must not touch this context: the store stays borrowed while it runs.
    pub fn update_data<T: 'static, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut data = self.data.borrow_mut();
        data.get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
            .map(f)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.borrow().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.data.borrow_mut().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Clear every entry and mark the instance disposed. The next
    /// `create()` builds a fresh instance.
    pub fn dispose(&self) {
        self.disposed.set(true);
        self.data.borrow_mut().clear();
        log::debug!(
            "shared context #{} disposed",
            self.initialization_count
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Value of the lifetime counter when this instance was created
    pub fn initialization_count(&self) -> u64 {
        self.initialization_count
    }
}

impl std::fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.data.borrow().keys().cloned().collect();
        keys.sort();
        f.debug_struct("SharedContext")
            .field("initialization_count", &self.initialization_count)
            .field("disposed", &self.disposed.get())
            .field("keys", &keys)
            .finish()
    }
}

/// Owner of the single live [`SharedContext`]
#[derive(Debug, Default)]
pub struct SharedContextManager {
    live: RefCell<Option<Rc<SharedContext>>>,
    initializations: Cell<u64>,
}

impl SharedContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live context, creating a new one if there is none or the
    /// current one was disposed.
    pub fn create(&self) -> Rc<SharedContext> {
        let mut live = self.live.borrow_mut();
        if let Some(current) = live.as_ref().filter(|c| !c.is_disposed()) {
            return Rc::clone(current);
        }

        let count = self.initializations.get() + 1;
        self.initializations.set(count);
        log::debug!("shared context #{} initialized", count);
        let context = Rc::new(SharedContext::new(count));
        *live = Some(Rc::clone(&context));
        context
    }

    /// The live context without creating one
    pub fn current(&self) -> Option<Rc<SharedContext>> {
        self.live
            .borrow()
            .as_ref()
            .filter(|c| !c.is_disposed())
            .cloned()
    }

    /// How many instances were created over the manager's lifetime
    pub fn initializations(&self) -> u64 {
        self.initializations.get()
    }
}

/// Weak reference to a runner's context manager, injected into suites
#[derive(Debug, Clone)]
pub struct ContextHandle {
    manager: Weak<SharedContextManager>,
}

impl ContextHandle {
    pub fn new(manager: &Rc<SharedContextManager>) -> Self {
        Self {
            manager: Rc::downgrade(manager),
        }
    }

    /// [`SharedContextManager::create`] through the handle.
    pub fn create(&self) -> Result<Rc<SharedContext>, ContextError> {
        self.manager
            .upgrade()
            .map(|manager| manager.create())
            .ok_or(ContextError::RunnerDropped)
    }
}
