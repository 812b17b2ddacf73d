//! Request and event patch tables.
//!
//! Both tables are built once and handed to the adapter by value; they are
//! never mutated after a provider has been wrapped.

use crate::dispatch::BaseDispatcher;
use o2_types::{BoxFuture, Listener, ProviderEvent, RpcMethod, RpcResult, Subscription};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Replacement implementation of an RPC method. Receives the base
/// dispatcher and, only when the caller passed them, the params.
pub type OverrideFn =
    Arc<dyn Fn(BaseDispatcher, Option<Value>) -> BoxFuture<'static, RpcResult<Value>> + Send + Sync>;

/// Value transform for a single event. `None` leaves the value untouched.
pub type EventTransform = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Full replacement of a subscription method
pub type ReplaceFn = Arc<dyn Fn(ProviderEvent, Listener) + Send + Sync>;

/// Patch applied to a single RPC method
#[derive(Clone)]
pub enum PatchEntry {
    /// The method fails with 4200 without reaching the provider
    Disabled,
    /// The method is answered by the override
    Override(OverrideFn),
}

impl fmt::Debug for PatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchEntry::Disabled => f.write_str("Disabled"),
            PatchEntry::Override(_) => f.write_str("Override(..)"),
        }
    }
}

/// Per-method request patches
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    entries: HashMap<RpcMethod, PatchEntry>,
}

impl RequestPatch {
    /// Creates an empty patch table
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables `method`
    pub fn disable(mut self, method: RpcMethod) -> Self {
        self.entries.insert(method, PatchEntry::Disabled);
        self
    }

    /// Answers `method` with `f`
    pub fn with_override<F, Fut>(mut self, method: RpcMethod, f: F) -> Self
    where
        F: Fn(BaseDispatcher, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        let f: OverrideFn = Arc::new(move |base, params| Box::pin(f(base, params)));
        self.entries.insert(method, PatchEntry::Override(f));
        self
    }

    /// Looks up the patch for a method name. Methods outside [`RpcMethod`]
    /// are never patched.
    pub fn get(&self, method: &str) -> Option<&PatchEntry> {
        let method: RpcMethod = method.parse().ok()?;
        self.entries.get(&method)
    }

    /// Number of patched methods
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no method is patched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Patch applied to one subscription method
#[derive(Clone)]
pub enum EventHook {
    /// Replaces the subscription method entirely
    Replace(ReplaceFn),
    /// Transforms emitted values per event
    Transform(HashMap<ProviderEvent, EventTransform>),
}

impl fmt::Debug for EventHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventHook::Replace(_) => f.write_str("Replace(..)"),
            EventHook::Transform(transforms) => f
                .debug_tuple("Transform")
                .field(&transforms.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Per-subscription-method event patches
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    hooks: HashMap<Subscription, EventHook>,
}

impl EventPatch {
    /// Creates an empty patch table
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the `kind` subscription method with `f`
    pub fn replace<F>(mut self, kind: Subscription, f: F) -> Self
    where
        F: Fn(ProviderEvent, Listener) + Send + Sync + 'static,
    {
        self.hooks.insert(kind, EventHook::Replace(Arc::new(f)));
        self
    }

    /// Replaces the `kind` subscription method with a no-op
    pub fn ignore(self, kind: Subscription) -> Self {
        self.replace(kind, |_, _| {})
    }

    /// Transforms values of `event` delivered to listeners subscribed
    /// through `kind`. Replaces an earlier `replace` hook for `kind`.
    pub fn transform<F>(mut self, kind: Subscription, event: ProviderEvent, f: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        let transform: EventTransform = Arc::new(f);
        match self.hooks.get_mut(&kind) {
            Some(EventHook::Transform(transforms)) => {
                transforms.insert(event, transform);
            }
            _ => {
                self.hooks
                    .insert(kind, EventHook::Transform(HashMap::from([(event, transform)])));
            }
        }
        self
    }

    /// Looks up the hook for a subscription method
    pub fn get(&self, kind: Subscription) -> Option<&EventHook> {
        self.hooks.get(&kind)
    }

    /// True if no subscription method is patched
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
