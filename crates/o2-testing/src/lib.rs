//! # O2 Testing Infrastructure
//!
//! Testing utilities for the O2 injected wallet connectors:
//! - Mock injected providers with configurable capabilities
//! - Recording dispatchers and event emitters
//! - Property-based testing strategies for devices and wallet labels
//!
//! ## Usage
//!
//! ```rust,ignore
//! use o2_testing::*;
//!
//! let metamask = MockProvider::new()
//!     .with_flag("isMetaMask")
//!     .with_dispatcher(MockDispatcher::new().respond("eth_chainId", json!("0x1")))
//!     .with_events()
//!     .shared();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use o2_types::{
    listener_id, Device, DeviceBrowserName, DeviceOsName, DeviceType, EventSubscription,
    InjectedProvider, JsonRpcRequest, JsonRpcResponse, LegacyCallback, LegacyDispatch, Listener,
    ProviderEvent, ProviderLabel, ProviderRpcError, RequestArguments, RequestDispatch,
    RpcResult,
};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Request Dispatchers
// ============================================================================

/// Modern dispatcher answering from a fixed response table and recording
/// every call it receives.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    responses: HashMap<String, RpcResult<Value>>,
    calls: Mutex<Vec<RequestArguments>>,
}

impl MockDispatcher {
    /// Creates a dispatcher with no responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method` with `result`
    pub fn respond(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), Ok(result));
        self
    }

    /// Rejects `method` with `error`
    pub fn fail(mut self, method: &str, error: ProviderRpcError) -> Self {
        self.responses.insert(method.to_string(), Err(error));
        self
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<RequestArguments> {
        lock(&self.calls).clone()
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of calls received for `method`
    pub fn calls_for(&self, method: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.method == method).count()
    }
}

#[async_trait]
impl RequestDispatch for MockDispatcher {
    async fn request(&self, args: RequestArguments) -> RpcResult<Value> {
        lock(&self.calls).push(args.clone());
        self.responses
            .get(&args.method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderRpcError::internal(format!("no mock response for {}", args.method))))
    }
}

/// How the legacy mock answers a method
#[derive(Debug, Clone)]
pub enum LegacyReply {
    /// Invoke the callback with a response carrying `result`
    Result(Value),
    /// Invoke the callback with a response carrying an `error` member
    ResponseError(ProviderRpcError),
    /// Invoke the callback with an error
    Error(ProviderRpcError),
    /// Invoke the callback with a response carrying neither result nor error
    Empty,
    /// Drop the callback without invoking it
    Drop,
}

/// Legacy `sendAsync` dispatcher recording every payload it receives
#[derive(Debug, Default)]
pub struct MockLegacyDispatcher {
    replies: HashMap<String, LegacyReply>,
    payloads: Mutex<Vec<JsonRpcRequest>>,
}

impl MockLegacyDispatcher {
    /// Creates a dispatcher with no replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method` with `reply`
    pub fn reply(mut self, method: &str, reply: LegacyReply) -> Self {
        self.replies.insert(method.to_string(), reply);
        self
    }

    /// All payloads received so far
    pub fn payloads(&self) -> Vec<JsonRpcRequest> {
        lock(&self.payloads).clone()
    }
}

impl LegacyDispatch for MockLegacyDispatcher {
    fn send_async(&self, payload: JsonRpcRequest, callback: LegacyCallback) {
        let id = payload.id;
        let reply = self
            .replies
            .get(&payload.method)
            .cloned()
            .unwrap_or_else(|| {
                LegacyReply::Error(ProviderRpcError::internal(format!(
                    "no mock reply for {}",
                    payload.method
                )))
            });
        lock(&self.payloads).push(payload);

        match reply {
            LegacyReply::Result(value) => callback(Ok(JsonRpcResponse::result(id, value))),
            LegacyReply::ResponseError(error) => callback(Ok(JsonRpcResponse::error(id, error))),
            LegacyReply::Error(error) => callback(Err(error)),
            LegacyReply::Empty => callback(Ok(JsonRpcResponse::empty(id))),
            LegacyReply::Drop => drop(callback),
        }
    }
}

// ============================================================================
// Event Emitter
// ============================================================================

struct Registration {
    event: ProviderEvent,
    listener: Listener,
    once: bool,
}

/// In-memory event emitter with `on`/`once`/`off`/`removeListener`
#[derive(Default)]
pub struct MockEventEmitter {
    registrations: Mutex<Vec<Registration>>,
}

impl MockEventEmitter {
    /// Creates an emitter without listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `value` to every listener of `event`, returning how many were
    /// invoked. `once` listeners are removed before they run.
    pub fn emit(&self, event: ProviderEvent, value: &Value) -> usize {
        let fired: Vec<Listener> = {
            let mut registrations = lock(&self.registrations);
            let fired = registrations
                .iter()
                .filter(|r| r.event == event)
                .map(|r| r.listener.clone())
                .collect();
            registrations.retain(|r| !(r.event == event && r.once));
            fired
        };
        for listener in &fired {
            listener(value);
        }
        fired.len()
    }

    /// Number of listeners registered for `event`
    pub fn listener_count(&self, event: ProviderEvent) -> usize {
        lock(&self.registrations).iter().filter(|r| r.event == event).count()
    }

    fn register(&self, event: ProviderEvent, listener: Listener, once: bool) {
        lock(&self.registrations).push(Registration { event, listener, once });
    }

    fn unregister(&self, event: ProviderEvent, listener: &Listener) {
        let id = listener_id(listener);
        let mut registrations = lock(&self.registrations);
        if let Some(pos) = registrations
            .iter()
            .position(|r| r.event == event && listener_id(&r.listener) == id)
        {
            registrations.remove(pos);
        }
    }
}

impl fmt::Debug for MockEventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEventEmitter")
            .field("listeners", &lock(&self.registrations).len())
            .finish()
    }
}

impl EventSubscription for MockEventEmitter {
    fn on(&self, event: ProviderEvent, listener: Listener) {
        self.register(event, listener, false);
    }

    fn once(&self, event: ProviderEvent, listener: Listener) {
        self.register(event, listener, true);
    }

    fn off(&self, event: ProviderEvent, listener: Listener) {
        self.unregister(event, &listener);
    }

    fn remove_listener(&self, event: ProviderEvent, listener: Listener) {
        self.unregister(event, &listener);
    }
}

/// Listener that records every value it receives
#[derive(Clone)]
pub struct RecordingListener {
    listener: Listener,
    values: Arc<Mutex<Vec<Value>>>,
}

impl RecordingListener {
    /// Creates a new recording listener
    pub fn new() -> Self {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let listener: Listener = Arc::new(move |value: &Value| lock(&sink).push(value.clone()));
        Self { listener, values }
    }

    /// The listener to subscribe. Every call returns the same `Arc`.
    pub fn listener(&self) -> Listener {
        self.listener.clone()
    }

    /// Values received so far
    pub fn values(&self) -> Vec<Value> {
        lock(&self.values).clone()
    }
}

impl Default for RecordingListener {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Mock Provider
// ============================================================================

/// Injected provider with configurable identity flags and capabilities
#[derive(Debug, Default)]
pub struct MockProvider {
    flags: HashSet<String>,
    properties: HashMap<String, Value>,
    dispatcher: Option<MockDispatcher>,
    legacy: Option<MockLegacyDispatcher>,
    emitter: Option<MockEventEmitter>,
}

impl MockProvider {
    /// Creates a provider with no flags and no capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider exposing a dispatcher and an event emitter but no identity
    /// flags
    pub fn eip1193(dispatcher: MockDispatcher) -> Self {
        Self::new().with_dispatcher(dispatcher).with_events()
    }

    /// Sets an identity flag
    pub fn with_flag(mut self, flag: &str) -> Self {
        self.flags.insert(flag.to_string());
        self
    }

    /// Sets a property
    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Exposes a modern dispatcher
    pub fn with_dispatcher(mut self, dispatcher: MockDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Exposes a legacy dispatcher
    pub fn with_legacy(mut self, legacy: MockLegacyDispatcher) -> Self {
        self.legacy = Some(legacy);
        self
    }

    /// Exposes an event emitter
    pub fn with_events(mut self) -> Self {
        self.emitter = Some(MockEventEmitter::new());
        self
    }

    /// Moves the provider into an `Arc`
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The modern dispatcher, if configured
    pub fn dispatcher(&self) -> Option<&MockDispatcher> {
        self.dispatcher.as_ref()
    }

    /// The legacy dispatcher, if configured
    pub fn legacy(&self) -> Option<&MockLegacyDispatcher> {
        self.legacy.as_ref()
    }

    /// The event emitter, if configured
    pub fn emitter(&self) -> Option<&MockEventEmitter> {
        self.emitter.as_ref()
    }
}

impl InjectedProvider for MockProvider {
    fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }

    fn request_dispatch(&self) -> Option<&dyn RequestDispatch> {
        self.dispatcher.as_ref().map(|d| d as &dyn RequestDispatch)
    }

    fn legacy_dispatch(&self) -> Option<&dyn LegacyDispatch> {
        self.legacy.as_ref().map(|l| l as &dyn LegacyDispatch)
    }

    fn events(&self) -> Option<&dyn EventSubscription> {
        self.emitter.as_ref().map(|e| e as &dyn EventSubscription)
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Generates device types
pub fn arb_device_type() -> impl Strategy<Value = DeviceType> {
    prop_oneof![
        Just(DeviceType::Desktop),
        Just(DeviceType::Mobile),
        Just(DeviceType::Tablet),
    ]
}

/// Generates OS names
pub fn arb_os_name() -> impl Strategy<Value = DeviceOsName> {
    prop_oneof![
        Just(DeviceOsName::WindowsPhone),
        Just(DeviceOsName::Windows),
        Just(DeviceOsName::MacOs),
        Just(DeviceOsName::Ios),
        Just(DeviceOsName::Android),
        Just(DeviceOsName::Linux),
        Just(DeviceOsName::ChromeOs),
    ]
}

/// Generates browser names
pub fn arb_browser_name() -> impl Strategy<Value = DeviceBrowserName> {
    prop_oneof![
        Just(DeviceBrowserName::AndroidBrowser),
        Just(DeviceBrowserName::Chrome),
        Just(DeviceBrowserName::Chromium),
        Just(DeviceBrowserName::Firefox),
        Just(DeviceBrowserName::MicrosoftEdge),
        Just(DeviceBrowserName::Opera),
        Just(DeviceBrowserName::Safari),
    ]
}

/// Generates devices
pub fn arb_device() -> impl Strategy<Value = Device> {
    (arb_device_type(), arb_os_name(), arb_browser_name())
        .prop_map(|(device_type, os, browser)| Device::new(device_type, os, browser))
}

/// Generates wallet labels, biased towards the standard labels so that
/// collisions with the standard registry are common
pub fn arb_wallet_label() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            ProviderLabel::MetaMask.as_str().to_string(),
            ProviderLabel::Coinbase.as_str().to_string(),
            ProviderLabel::Detected.as_str().to_string(),
            ProviderLabel::Trust.as_str().to_string(),
        ]),
        "[A-Z][a-z]{2,8} Wallet",
    ]
}

// ============================================================================
// Tests
// ============================================================================
