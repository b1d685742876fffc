use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{ActionError, HandlerError, Result};
use crate::handler::Handler;
use crate::invoker::ActionInvoker;
use crate::pool::InstancePool;

/// A discrete message the registry can dispatch on.
///
/// This is the interface consumed from the message layer: the registry
/// only needs the leading action-identifier token; the whole message is
/// passed through to the handler untouched.
pub trait ActionMessage {
    /// The leading action-identifier token, or `None` when the message
    /// carries no usable token (dispatched as unmatched, never an error).
    fn action(&self) -> Option<&str>;
}

/// Outcome of dispatching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registered handler ran to completion.
    Handled,
    /// No handler matched the message's action identifier.
    Unmatched,
}

/// Builds an [`ActionRegistry`].
///
/// Registration is the opt-in marker: only handlers explicitly registered
/// here are ever considered for dispatch. Duplicate identifiers are
/// rejected, failing the whole build before any connection serves —
/// silent last-write-wins would hide wiring mistakes.
pub struct ActionRegistryBuilder<O, M> {
    actions: HashMap<String, ActionInvoker<O, M>>,
    pool: InstancePool,
}

impl<O, M> ActionRegistryBuilder<O, M> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            pool: InstancePool::new(),
        }
    }

    /// Register a handler under an action identifier.
    ///
    /// Identifiers are matched case-sensitively, exactly as given.
    /// Registering an identifier twice is an
    /// [`ActionError::DuplicateAction`].
    pub fn register(mut self, identifier: impl Into<String>, handler: Handler<O, M>) -> Result<Self> {
        let identifier = identifier.into();
        if self.actions.contains_key(&identifier) {
            return Err(ActionError::DuplicateAction { identifier });
        }
        debug!(action = %identifier, shape = ?handler.shape(), "registered action");
        self.actions
            .insert(identifier.clone(), ActionInvoker::new(identifier, handler));
        Ok(self)
    }

    /// Register a handler bound to shared per-type state.
    ///
    /// The instance of `S` is obtained from the builder's [`InstancePool`]:
    /// the factory runs the first time `S` is seen and every later
    /// registration for `S` reuses the same instance. `bind` receives that
    /// instance and produces the handler, typically capturing the `Arc` in
    /// its closure. A factory failure aborts the build
    /// ([`ActionError::Registration`]).
    pub fn register_with_state<S, F, B>(
        mut self,
        identifier: impl Into<String>,
        factory: F,
        bind: B,
    ) -> Result<Self>
    where
        S: Send + Sync + 'static,
        F: FnOnce() -> std::result::Result<S, HandlerError>,
        B: FnOnce(Arc<S>) -> Handler<O, M>,
    {
        let identifier = identifier.into();
        let instance = self
            .pool
            .get_or_create(factory)
            .map_err(|source| ActionError::Registration {
                identifier: identifier.clone(),
                source,
            })?;
        self.register(identifier, bind(instance))
    }

    /// Finish the build. The registry is immutable from here on.
    pub fn build(self) -> ActionRegistry<O, M> {
        ActionRegistry {
            actions: self.actions,
            dispatched: AtomicU64::new(0),
            unmatched: AtomicU64::new(0),
        }
    }
}

impl<O, M> Default for ActionRegistryBuilder<O, M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable mapping from action identifier to invoker.
///
/// Built once, read-only afterward; safe to share across connections
/// behind an `Arc` without locking. The audit counters are the only
/// interior mutability and exist so unmatched dispatches are observably
/// distinct from handled ones.
pub struct ActionRegistry<O, M> {
    actions: HashMap<String, ActionInvoker<O, M>>,
    dispatched: AtomicU64,
    unmatched: AtomicU64,
}

impl<O, M> ActionRegistry<O, M> {
    /// Look up an invoker by identifier. `None` is a normal outcome for an
    /// unrecognized identifier, never an error.
    pub fn resolve(&self, identifier: &str) -> Option<&ActionInvoker<O, M>> {
        self.actions.get(identifier)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered identifiers, in no particular order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Messages dispatched to a handler so far.
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Messages that matched no handler so far.
    pub fn unmatched_count(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }
}

impl<O, M: ActionMessage> ActionRegistry<O, M> {
    /// Extract the message's action identifier, resolve it, and invoke the
    /// matching handler.
    ///
    /// An unknown (or missing) identifier is a normal
    /// [`DispatchOutcome::Unmatched`] outcome; it never fails and never
    /// changes the registry's contents. A handler error propagates to the
    /// caller, which decides whether to log and continue or drop the
    /// connection.
    pub async fn dispatch(&self, origin: O, message: M) -> Result<DispatchOutcome> {
        let identifier = match message.action() {
            Some(identifier) => identifier.to_owned(),
            None => {
                self.unmatched.fetch_add(1, Ordering::Relaxed);
                debug!("message without action identifier dropped");
                return Ok(DispatchOutcome::Unmatched);
            }
        };

        match self.actions.get(&identifier) {
            Some(invoker) => {
                invoker.invoke(origin, message).await?;
                self.dispatched.fetch_add(1, Ordering::Relaxed);
                Ok(DispatchOutcome::Handled)
            }
            None => {
                self.unmatched.fetch_add(1, Ordering::Relaxed);
                debug!(action = %identifier, "no handler for action");
                Ok(DispatchOutcome::Unmatched)
            }
        }
    }
}

impl<O, M> std::fmt::Debug for ActionRegistryBuilder<O, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistryBuilder")
            .field("actions", &self.actions.len())
            .finish()
    }
}

impl<O, M> std::fmt::Debug for ActionRegistry<O, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.len())
            .finish()
    }
}
