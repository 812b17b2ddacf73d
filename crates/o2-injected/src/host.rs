//! In-memory host environment.

use dashmap::DashMap;
use o2_types::{HostEnvironment, InjectedNamespace, InjectedProvider};
use std::fmt;
use std::sync::Arc;

/// Injected globals held in memory.
///
/// Native callers and tests register the provider objects a browser would
/// have injected; objects can be replaced or removed at any time.
#[derive(Default)]
pub struct InjectedGlobals {
    globals: DashMap<InjectedNamespace, Arc<dyn InjectedProvider>>,
}

impl InjectedGlobals {
    /// Creates an environment with nothing injected
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects `provider` at `namespace`
    pub fn with_provider(self, namespace: InjectedNamespace, provider: Arc<dyn InjectedProvider>) -> Self {
        self.inject(namespace, provider);
        self
    }

    /// Injects `provider` at `namespace`, returning the object it replaced
    pub fn inject(
        &self,
        namespace: InjectedNamespace,
        provider: Arc<dyn InjectedProvider>,
    ) -> Option<Arc<dyn InjectedProvider>> {
        self.globals.insert(namespace, provider)
    }

    /// Removes the object at `namespace`
    pub fn remove(&self, namespace: InjectedNamespace) -> Option<Arc<dyn InjectedProvider>> {
        self.globals.remove(&namespace).map(|(_, provider)| provider)
    }

    /// True if nothing is injected
    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}

impl fmt::Debug for InjectedGlobals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespaces: Vec<&'static str> = self.globals.iter().map(|e| e.key().as_str()).collect();
        f.debug_struct("InjectedGlobals")
            .field("namespaces", &namespaces)
            .finish()
    }
}

impl HostEnvironment for InjectedGlobals {
    fn provider(&self, namespace: InjectedNamespace) -> Option<Arc<dyn InjectedProvider>> {
        self.globals.get(&namespace).map(|entry| entry.value().clone())
    }
}
