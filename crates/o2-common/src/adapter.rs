//! Provider adapter: wraps injected provider objects into EIP-1193
//! conformant providers.

use crate::dispatch::BaseDispatcher;
use crate::patch::{EventHook, EventPatch, EventTransform, PatchEntry, RequestPatch};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use o2_types::{
    listener_id, Eip1193Provider, EventSubscription, InjectedProvider, LegacyDispatch, Listener,
    ProviderEvent, ProviderRpcError, RequestArguments, RequestDispatch, RpcResult, Subscription,
};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace, warn};

/// Wrapped listeners registered on behalf of original listeners, keyed by
/// event and original listener identity. Each entry carries a token so a
/// `once` wrapper can drop its own entry when it fires.
type WrappedListeners = DashMap<(ProviderEvent, usize), Vec<(u64, Listener)>>;

/// A host provider wrapped with request and event patches.
///
/// Forwards everything not patched to the host object.
pub struct PatchedProvider {
    inner: Arc<dyn InjectedProvider>,
    base: BaseDispatcher,
    request_patch: RequestPatch,
    event_patch: EventPatch,
    wrapped_listeners: Arc<WrappedListeners>,
    next_token: AtomicU64,
}

impl PatchedProvider {
    fn new(inner: Arc<dyn InjectedProvider>, request_patch: RequestPatch, event_patch: EventPatch) -> Self {
        let base = BaseDispatcher::new(inner.clone());
        Self {
            inner,
            base,
            request_patch,
            event_patch,
            wrapped_listeners: Arc::new(DashMap::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Wraps `inner` without patches and without registering it with any
    /// adapter.
    ///
    /// Wallets that need no patches use this so they never claim a host
    /// object another wallet may still have to patch.
    pub fn passthrough(inner: Arc<dyn InjectedProvider>) -> Arc<Self> {
        trace!("wrapping provider without patches");
        Arc::new(Self::new(inner, RequestPatch::default(), EventPatch::default()))
    }

    /// The host object this provider wraps
    pub fn inner(&self) -> &Arc<dyn InjectedProvider> {
        &self.inner
    }

    /// The unpatched dispatcher of the host object
    pub fn base(&self) -> &BaseDispatcher {
        &self.base
    }

    fn route(&self, kind: Subscription, event: ProviderEvent, listener: Listener) {
        match self.event_patch.get(kind) {
            Some(EventHook::Replace(replacement)) => {
                trace!(kind = kind.as_str(), event = event.as_str(), "subscription replaced");
                replacement(event, listener);
            }
            _ if !kind.is_subscribe() => {
                let target = self.take_wrapped(event, &listener).unwrap_or(listener);
                self.forward(kind, event, target);
            }
            Some(EventHook::Transform(transforms)) => match transforms.get(&event) {
                Some(transform) => {
                    let key = (event, listener_id(&listener));
                    let token = self.next_token.fetch_add(1, Ordering::Relaxed);
                    let mut wrapped = transformed_listener(transform.clone(), listener);
                    if kind == Subscription::Once {
                        let table = Arc::downgrade(&self.wrapped_listeners);
                        wrapped = forget_when_fired(wrapped, table, key, token);
                    }
                    self.wrapped_listeners
                        .entry(key)
                        .or_default()
                        .push((token, wrapped.clone()));
                    self.forward(kind, event, wrapped);
                }
                None => self.forward(kind, event, listener),
            },
            None => self.forward(kind, event, listener),
        }
    }

    fn take_wrapped(&self, event: ProviderEvent, listener: &Listener) -> Option<Listener> {
        let key = (event, listener_id(listener));
        let wrapped = self.wrapped_listeners.get_mut(&key)?.pop().map(|(_, wrapped)| wrapped);
        self.wrapped_listeners.remove_if(&key, |_, remaining| remaining.is_empty());
        wrapped
    }

    fn forward(&self, kind: Subscription, event: ProviderEvent, listener: Listener) {
        match self.inner.events() {
            Some(events) => events.subscribe(kind, event, listener),
            None => warn!(
                kind = kind.as_str(),
                event = event.as_str(),
                "provider has no event surface, subscription ignored"
            ),
        }
    }
}

fn transformed_listener(transform: EventTransform, listener: Listener) -> Listener {
    Arc::new(move |value: &Value| match transform(value) {
        Some(transformed) => listener(&transformed),
        None => listener(value),
    })
}

/// A `once` wrapper is discarded by the emitter after it fires, so it drops
/// its side table entry at the same time
fn forget_when_fired(
    listener: Listener,
    table: Weak<WrappedListeners>,
    key: (ProviderEvent, usize),
    token: u64,
) -> Listener {
    Arc::new(move |value: &Value| {
        if let Some(table) = table.upgrade() {
            if let Some(mut wrapped) = table.get_mut(&key) {
                wrapped.retain(|(entry, _)| *entry != token);
            }
            table.remove_if(&key, |_, remaining| remaining.is_empty());
        }
        listener(value)
    })
}

impl fmt::Debug for PatchedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchedProvider")
            .field("base", &self.base)
            .field("request_patch", &self.request_patch)
            .field("event_patch", &self.event_patch)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestDispatch for PatchedProvider {
    async fn request(&self, args: RequestArguments) -> RpcResult<Value> {
        match self.request_patch.get(&args.method) {
            Some(PatchEntry::Disabled) => {
                trace!(method = %args.method, "request disabled");
                Err(ProviderRpcError::unsupported_method(&args.method))
            }
            Some(PatchEntry::Override(patched)) => {
                trace!(method = %args.method, "request overridden");
                patched(self.base.clone(), args.params).await
            }
            None => {
                trace!(method = %args.method, "request forwarded");
                self.base.request(args).await
            }
        }
    }
}

impl EventSubscription for PatchedProvider {
    fn on(&self, event: ProviderEvent, listener: Listener) {
        self.route(Subscription::On, event, listener);
    }

    fn once(&self, event: ProviderEvent, listener: Listener) {
        self.route(Subscription::Once, event, listener);
    }

    fn off(&self, event: ProviderEvent, listener: Listener) {
        self.route(Subscription::Off, event, listener);
    }

    fn remove_listener(&self, event: ProviderEvent, listener: Listener) {
        self.route(Subscription::RemoveListener, event, listener);
    }
}

impl InjectedProvider for PatchedProvider {
    fn has_flag(&self, flag: &str) -> bool {
        self.inner.has_flag(flag)
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.inner.property(name)
    }

    fn request_dispatch(&self) -> Option<&dyn RequestDispatch> {
        Some(self)
    }

    fn legacy_dispatch(&self) -> Option<&dyn LegacyDispatch> {
        self.inner.legacy_dispatch()
    }

    fn events(&self) -> Option<&dyn EventSubscription> {
        Some(self)
    }
}

impl Eip1193Provider for PatchedProvider {}

fn identity<T: ?Sized>(ptr: *const T) -> usize {
    ptr as *const () as usize
}

/// Wraps injected providers, at most once per host object.
///
/// The adapter keeps a side table of the wrappers it handed out, keyed by
/// the identity of both the host object and the wrapper, so wrapping either
/// again returns the live wrapper.
#[derive(Default)]
pub struct ProviderAdapter {
    wrapped: DashMap<usize, Weak<PatchedProvider>>,
}

impl ProviderAdapter {
    /// Creates an adapter with an empty side table
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide adapter used by [`create_eip1193_provider`]
    pub fn global() -> &'static ProviderAdapter {
        static GLOBAL: OnceLock<ProviderAdapter> = OnceLock::new();
        GLOBAL.get_or_init(ProviderAdapter::new)
    }

    /// Wraps `provider`. If it (or the wrapper it belongs to) was already
    /// wrapped by this adapter and that wrapper is alive, the existing
    /// wrapper is returned and the patches are ignored.
    pub fn wrap(
        &self,
        provider: Arc<dyn InjectedProvider>,
        request_patch: Option<RequestPatch>,
        event_patch: Option<EventPatch>,
    ) -> Arc<PatchedProvider> {
        self.prune();

        let key = identity(Arc::as_ptr(&provider));
        let create = move || {
            Arc::new(PatchedProvider::new(
                provider,
                request_patch.unwrap_or_default(),
                event_patch.unwrap_or_default(),
            ))
        };

        let patched = match self.wrapped.entry(key) {
            Entry::Occupied(mut entry) => {
                if let Some(existing) = entry.get().upgrade() {
                    debug!("provider already wrapped, reusing wrapper");
                    return existing;
                }
                let patched = create();
                entry.insert(Arc::downgrade(&patched));
                patched
            }
            Entry::Vacant(entry) => {
                let patched = create();
                entry.insert(Arc::downgrade(&patched));
                patched
            }
        };

        self.wrapped
            .insert(identity(Arc::as_ptr(&patched)), Arc::downgrade(&patched));
        debug!(
            mode = ?patched.base.mode(),
            patched_methods = patched.request_patch.len(),
            "wrapped injected provider"
        );
        patched
    }

    /// True if `provider` is a host object or wrapper with a live wrapper
    pub fn is_wrapped(&self, provider: &Arc<dyn InjectedProvider>) -> bool {
        self.wrapped
            .get(&identity(Arc::as_ptr(provider)))
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    /// Number of live wrappers
    pub fn wrapper_count(&self) -> usize {
        let mut live: Vec<usize> = self
            .wrapped
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .map(|patched| identity(Arc::as_ptr(&patched)))
            .collect();
        live.sort_unstable();
        live.dedup();
        live.len()
    }

    fn prune(&self) {
        self.wrapped.retain(|_, wrapper| wrapper.strong_count() > 0);
    }
}

impl fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("entries", &self.wrapped.len())
            .finish()
    }
}

/// Wraps `provider` with the process-wide [`ProviderAdapter`]
pub fn create_eip1193_provider(
    provider: Arc<dyn InjectedProvider>,
    request_patch: Option<RequestPatch>,
    event_patch: Option<EventPatch>,
) -> Arc<PatchedProvider> {
    ProviderAdapter::global().wrap(provider, request_patch, event_patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use o2_testing::{MockDispatcher, MockProvider, RecordingListener};
    use o2_types::RpcMethod;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn metamask() -> Arc<MockProvider> {
        MockProvider::eip1193(
            MockDispatcher::new()
                .respond("eth_accounts", json!(["0xabc"]))
                .respond("eth_chainId", json!("0x1")),
        )
        .with_flag("isMetaMask")
        .shared()
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let adapter = ProviderAdapter::new();
        let host = metamask();

        let first = adapter.wrap(host.clone(), None, None);
        let second = adapter.wrap(host.clone(), Some(RequestPatch::new().disable(RpcMethod::EthSign)), None);
        assert!(Arc::ptr_eq(&first, &second));

        let rewrapped = adapter.wrap(first.clone(), None, None);
        assert!(Arc::ptr_eq(&first, &rewrapped));
        assert_eq!(adapter.wrapper_count(), 1);
    }

    #[test]
    fn test_dead_wrappers_are_not_reused() {
        let adapter = ProviderAdapter::new();
        let host: Arc<dyn InjectedProvider> = metamask();

        let first = adapter.wrap(host.clone(), None, None);
        assert!(adapter.is_wrapped(&host));
        drop(first);
        assert!(!adapter.is_wrapped(&host));

        let second = adapter.wrap(host.clone(), None, None);
        assert!(adapter.is_wrapped(&host));
        assert_eq!(adapter.wrapper_count(), 1);
        drop(second);
    }

    #[test]
    fn test_separate_adapters_do_not_share_wrappers() {
        let host = metamask();
        let a = ProviderAdapter::new().wrap(host.clone(), None, None);
        let b = ProviderAdapter::new().wrap(host, None, None);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_global_adapter() {
        let host = metamask();
        let first = create_eip1193_provider(host.clone(), None, None);
        let second = create_eip1193_provider(host, None, None);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_unpatched_requests_forward() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(host.clone(), None, None);

        let accounts = provider.request(RpcMethod::EthAccounts.into()).await.unwrap();
        assert_eq!(accounts, json!(["0xabc"]));
        assert_eq!(host.dispatcher().unwrap().calls_for("eth_accounts"), 1);

        // unknown methods are forwarded as well
        let err = provider.request(RequestArguments::new("personal_sign")).await.unwrap_err();
        assert_eq!(err.code, o2_error::JSON_RPC_INTERNAL_ERROR);
        assert_eq!(host.dispatcher().unwrap().calls_for("personal_sign"), 1);
    }

    #[tokio::test]
    async fn test_disabled_method_never_reaches_provider() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            Some(RequestPatch::new().disable(RpcMethod::WalletSwitchEthereumChain)),
            None,
        );

        for _ in 0..2 {
            let err = provider
                .request(
                    RequestArguments::new("wallet_switchEthereumChain")
                        .with_params(json!([{ "chainId": "0x89" }])),
                )
                .await
                .unwrap_err();
            assert_eq!(err.code, 4200);
            assert_eq!(
                err.message,
                "The Provider does not support the requested method: wallet_switchEthereumChain"
            );
        }
        assert_eq!(host.dispatcher().unwrap().call_count(), 0);
    }

    #[tokio::test]
    async fn test_override_receives_params_only_when_given() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let provider = ProviderAdapter::new().wrap(
            metamask(),
            Some(RequestPatch::new().with_override(RpcMethod::EthCall, move |_, params| {
                sink.lock().unwrap().push(params);
                async { Ok(json!("0x")) }
            })),
            None,
        );

        provider.request(RequestArguments::new("eth_call")).await.unwrap();
        provider
            .request(RequestArguments::new("eth_call").with_params(json!([{ "to": "0x0" }])))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![None, Some(json!([{ "to": "0x0" }]))]);
    }

    #[tokio::test]
    async fn test_override_can_call_base_dispatcher() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            Some(RequestPatch::new().with_override(RpcMethod::EthRequestAccounts, |base, _| async move {
                base.request(RpcMethod::EthAccounts.into()).await
            })),
            None,
        );

        let accounts = provider.request(RpcMethod::EthRequestAccounts.into()).await.unwrap();
        assert_eq!(accounts, json!(["0xabc"]));
        let dispatcher = host.dispatcher().unwrap();
        assert_eq!(dispatcher.calls_for("eth_accounts"), 1);
        assert_eq!(dispatcher.calls_for("eth_requestAccounts"), 0);
    }

    #[tokio::test]
    async fn test_override_errors_propagate_unchanged() {
        let rejected = ProviderRpcError::new(4001, "User rejected the request");
        let error = rejected.clone();
        let provider = ProviderAdapter::new().wrap(
            metamask(),
            Some(RequestPatch::new().with_override(RpcMethod::EthSign, move |_, _| {
                let error = error.clone();
                async move { Err(error) }
            })),
            None,
        );
        let err = provider.request(RpcMethod::EthSign.into()).await.unwrap_err();
        assert_eq!(err, rejected);
    }

    #[test]
    fn test_transform_applies_to_mapped_events_only() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            None,
            Some(EventPatch::new().transform(Subscription::On, ProviderEvent::ChainChanged, |v| {
                v.as_str().map(|s| json!(s.to_uppercase()))
            })),
        );

        let chain = RecordingListener::new();
        let accounts = RecordingListener::new();
        provider.on(ProviderEvent::ChainChanged, chain.listener());
        provider.on(ProviderEvent::AccountsChanged, accounts.listener());

        let emitter = host.emitter().unwrap();
        emitter.emit(ProviderEvent::ChainChanged, &json!("0xa"));
        emitter.emit(ProviderEvent::ChainChanged, &json!(10));
        emitter.emit(ProviderEvent::AccountsChanged, &json!(["0xabc"]));

        assert_eq!(chain.values(), vec![json!("0XA"), json!(10)]);
        assert_eq!(accounts.values(), vec![json!(["0xabc"])]);
    }

    #[test]
    fn test_once_transform() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            None,
            Some(EventPatch::new().transform(Subscription::Once, ProviderEvent::Connect, |_| {
                Some(json!({ "chainId": "0x1" }))
            })),
        );
        let connect = RecordingListener::new();
        provider.once(ProviderEvent::Connect, connect.listener());

        let emitter = host.emitter().unwrap();
        assert_eq!(emitter.emit(ProviderEvent::Connect, &json!({})), 1);
        assert_eq!(emitter.emit(ProviderEvent::Connect, &json!({})), 0);
        assert_eq!(connect.values(), vec![json!({ "chainId": "0x1" })]);
    }

    #[test]
    fn test_off_removes_wrapped_listener() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            None,
            Some(EventPatch::new().transform(Subscription::On, ProviderEvent::ChainChanged, |_| None)),
        );
        let chain = RecordingListener::new();
        provider.on(ProviderEvent::ChainChanged, chain.listener());
        let emitter = host.emitter().unwrap();
        assert_eq!(emitter.listener_count(ProviderEvent::ChainChanged), 1);

        provider.off(ProviderEvent::ChainChanged, chain.listener());
        assert_eq!(emitter.listener_count(ProviderEvent::ChainChanged), 0);
        assert_eq!(emitter.emit(ProviderEvent::ChainChanged, &json!("0x1")), 0);
        assert!(chain.values().is_empty());
    }

    #[test]
    fn test_off_after_fired_once_removes_live_on_wrapper() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            None,
            Some(
                EventPatch::new()
                    .transform(Subscription::On, ProviderEvent::ChainChanged, |_| None)
                    .transform(Subscription::Once, ProviderEvent::ChainChanged, |_| None),
            ),
        );
        let chain = RecordingListener::new();
        provider.on(ProviderEvent::ChainChanged, chain.listener());
        provider.once(ProviderEvent::ChainChanged, chain.listener());
        let key = (ProviderEvent::ChainChanged, listener_id(&chain.listener()));
        assert_eq!(provider.wrapped_listeners.get(&key).map(|w| w.len()), Some(2));

        let emitter = host.emitter().unwrap();
        assert_eq!(emitter.emit(ProviderEvent::ChainChanged, &json!("0x1")), 2);
        provider.off(ProviderEvent::ChainChanged, chain.listener());
        assert_eq!(emitter.listener_count(ProviderEvent::ChainChanged), 0);
        assert_eq!(emitter.emit(ProviderEvent::ChainChanged, &json!("0x2")), 0);

        assert_eq!(chain.values(), vec![json!("0x1"), json!("0x1")]);
        assert!(provider.wrapped_listeners.is_empty());
    }

    #[test]
    fn test_fired_once_wrappers_leave_no_entries() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            None,
            Some(EventPatch::new().transform(Subscription::Once, ProviderEvent::Connect, |_| None)),
        );
        let emitter = host.emitter().unwrap();
        for _ in 0..3 {
            let connect = RecordingListener::new();
            provider.once(ProviderEvent::Connect, connect.listener());
            emitter.emit(ProviderEvent::Connect, &json!({ "chainId": "0x1" }));
            assert_eq!(connect.values().len(), 1);
        }
        assert!(provider.wrapped_listeners.is_empty());
    }

    #[test]
    fn test_passthrough_is_not_registered() {
        let adapter = ProviderAdapter::global();
        let host: Arc<dyn InjectedProvider> = metamask();

        let plain = PatchedProvider::passthrough(host.clone());
        assert!(!adapter.is_wrapped(&host));

        let patched = create_eip1193_provider(
            host.clone(),
            Some(RequestPatch::new().disable(RpcMethod::EthSign)),
            None,
        );
        assert!(!Arc::ptr_eq(&plain, &patched));
        assert!(adapter.is_wrapped(&host));
        assert_eq!(patched.request_patch.len(), 1);
    }

    #[test]
    fn test_remove_listener_without_transform_forwards_original() {
        let host = metamask();
        let provider = ProviderAdapter::new().wrap(host.clone(), None, None);
        let accounts = RecordingListener::new();
        provider.on(ProviderEvent::AccountsChanged, accounts.listener());
        provider.remove_listener(ProviderEvent::AccountsChanged, accounts.listener());
        assert_eq!(host.emitter().unwrap().listener_count(ProviderEvent::AccountsChanged), 0);
    }

    #[test]
    fn test_replaced_subscription_method() {
        let host = metamask();
        let replaced = Arc::new(AtomicUsize::new(0));
        let count = replaced.clone();
        let provider = ProviderAdapter::new().wrap(
            host.clone(),
            None,
            Some(EventPatch::new().replace(Subscription::Off, move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let chain = RecordingListener::new();
        provider.on(ProviderEvent::ChainChanged, chain.listener());
        provider.off(ProviderEvent::ChainChanged, chain.listener());

        assert_eq!(replaced.load(Ordering::SeqCst), 1);
        assert_eq!(host.emitter().unwrap().listener_count(ProviderEvent::ChainChanged), 1);
    }

    #[test]
    fn test_subscriptions_without_event_surface_are_ignored() {
        let host = MockProvider::new().with_dispatcher(MockDispatcher::new()).shared();
        let provider = ProviderAdapter::new().wrap(host, None, None);
        let listener = RecordingListener::new();
        provider.on(ProviderEvent::Connect, listener.listener());
        provider.off(ProviderEvent::Connect, listener.listener());
        assert!(listener.values().is_empty());
    }

    #[test]
    fn test_wrapper_reports_host_capabilities() {
        let host = MockProvider::new().with_flag("isWalletLink").shared();
        let provider = ProviderAdapter::new().wrap(host, None, None);
        assert!(provider.has_flag("isWalletLink"));
        assert!(provider.request_dispatch().is_some());
        assert!(provider.events().is_some());
        assert!(provider.legacy_dispatch().is_none());
    }
}
