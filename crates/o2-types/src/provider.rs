//! Capability traits for injected provider objects and the canonical
//! EIP-1193 contract.
//!
//! Host objects differ in shape: some expose a modern `request` dispatcher,
//! some only a legacy `sendAsync`, some have no event emitter at all. Rather
//! than guessing, each capability is probed explicitly through
//! [`InjectedProvider`].

use crate::rpc::{JsonRpcRequest, JsonRpcResponse, RequestArguments, RpcResult};
use crate::wallet::InjectedNamespace;
use async_trait::async_trait;
use o2_error::ProviderRpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed `Send` future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Event listener. Listener identity is the `Arc` allocation, which is what
/// `off`/`removeListener` match on.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Callback a legacy dispatcher invokes once with the outcome of a request
pub type LegacyCallback = Box<dyn FnOnce(Result<JsonRpcResponse, ProviderRpcError>) + Send>;

/// Wraps a closure into a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Identity of a listener, stable for as long as the listener is alive
pub fn listener_id(listener: &Listener) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

/// EIP-1193 provider events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderEvent {
    /// Provider connected to a chain
    Connect,
    /// Provider disconnected from all chains
    Disconnect,
    /// Provider message (e.g. subscription notification)
    Message,
    /// Active chain changed
    ChainChanged,
    /// Exposed accounts changed
    AccountsChanged,
}

impl ProviderEvent {
    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEvent::Connect => "connect",
            ProviderEvent::Disconnect => "disconnect",
            ProviderEvent::Message => "message",
            ProviderEvent::ChainChanged => "chainChanged",
            ProviderEvent::AccountsChanged => "accountsChanged",
        }
    }
}

impl fmt::Display for ProviderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event subscription methods of an EIP-1193 emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subscription {
    /// `on`
    On,
    /// `once`
    Once,
    /// `off`
    Off,
    /// `removeListener`
    RemoveListener,
}

impl Subscription {
    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::On => "on",
            Subscription::Once => "once",
            Subscription::Off => "off",
            Subscription::RemoveListener => "removeListener",
        }
    }

    /// True for `on` and `once`
    pub fn is_subscribe(&self) -> bool {
        matches!(self, Subscription::On | Subscription::Once)
    }
}

/// Modern single-call request dispatcher (`provider.request`)
#[async_trait]
pub trait RequestDispatch: Send + Sync {
    /// Sends a request and resolves with its result
    async fn request(&self, args: RequestArguments) -> RpcResult<Value>;
}

/// Legacy callback style dispatcher (`provider.sendAsync`)
pub trait LegacyDispatch: Send + Sync {
    /// Sends a JSON-RPC payload; the outcome is reported through `callback`
    fn send_async(&self, payload: JsonRpcRequest, callback: LegacyCallback);
}

/// Event subscription surface (`on`/`once`/`off`/`removeListener`)
pub trait EventSubscription: Send + Sync {
    /// Subscribes a listener
    fn on(&self, event: ProviderEvent, listener: Listener);

    /// Subscribes a listener for a single emission
    fn once(&self, event: ProviderEvent, listener: Listener);

    /// Unsubscribes a listener
    fn off(&self, event: ProviderEvent, listener: Listener);

    /// Unsubscribes a listener
    fn remove_listener(&self, event: ProviderEvent, listener: Listener);

    /// Dispatches to the subscription method named by `kind`
    fn subscribe(&self, kind: Subscription, event: ProviderEvent, listener: Listener) {
        match kind {
            Subscription::On => self.on(event, listener),
            Subscription::Once => self.once(event, listener),
            Subscription::Off => self.off(event, listener),
            Subscription::RemoveListener => self.remove_listener(event, listener),
        }
    }
}

/// An object a wallet injected into the host environment.
///
/// Every capability is optional; callers probe for it instead of assuming
/// the shape of the object.
pub trait InjectedProvider: Send + Sync {
    /// Returns true if the object carries a truthy property named `flag`
    /// (identity flags such as `isMetaMask` or `bbcSignTx`).
    fn has_flag(&self, flag: &str) -> bool;

    /// Reads a non-flag property
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Modern request dispatcher, if exposed
    fn request_dispatch(&self) -> Option<&dyn RequestDispatch> {
        None
    }

    /// Legacy callback dispatcher, if exposed
    fn legacy_dispatch(&self) -> Option<&dyn LegacyDispatch> {
        None
    }

    /// Event subscription surface, if exposed
    fn events(&self) -> Option<&dyn EventSubscription> {
        None
    }
}

/// A provider that conforms to the canonical EIP-1193 request/event
/// contract. Request and subscription methods come from the
/// [`RequestDispatch`] and [`EventSubscription`] supertraits.
pub trait Eip1193Provider: InjectedProvider + RequestDispatch + EventSubscription {}

/// Read access to the injected globals of the host environment.
pub trait HostEnvironment: Send + Sync {
    /// Returns the object injected at `namespace`, if any
    fn provider(&self, namespace: InjectedNamespace) -> Option<Arc<dyn InjectedProvider>>;
}
