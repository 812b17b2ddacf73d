//! Base dispatcher of a wrapped provider.
//!
//! The base dispatcher is whatever the host object offers: its modern
//! `request` dispatcher, or failing that a future bridged over the legacy
//! `sendAsync` callback.

use async_trait::async_trait;
use o2_error::ProviderRpcError;
use o2_types::{
    InjectedProvider, JsonRpcRequest, LegacyDispatch, RequestArguments, RequestDispatch, RpcResult,
};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{trace, warn};

/// Which dispatcher of the host object requests are sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// `request`
    Modern,
    /// `sendAsync`
    Legacy,
    /// Neither is exposed
    Missing,
}

impl DispatchMode {
    /// Probes the capabilities of `provider`
    pub fn probe(provider: &dyn InjectedProvider) -> Self {
        if provider.request_dispatch().is_some() {
            DispatchMode::Modern
        } else if provider.legacy_dispatch().is_some() {
            DispatchMode::Legacy
        } else {
            DispatchMode::Missing
        }
    }
}

/// Unpatched dispatcher of a wrapped provider, handed to request overrides.
///
/// Clones share the host object and the envelope id counter.
#[derive(Clone)]
pub struct BaseDispatcher {
    provider: Arc<dyn InjectedProvider>,
    mode: DispatchMode,
    next_id: Arc<AtomicU64>,
}

impl BaseDispatcher {
    /// Binds the dispatcher of `provider`
    pub fn new(provider: Arc<dyn InjectedProvider>) -> Self {
        let mode = DispatchMode::probe(provider.as_ref());
        Self {
            provider,
            mode,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The dispatcher requests are sent to
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl fmt::Debug for BaseDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseDispatcher")
            .field("mode", &self.mode)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl RequestDispatch for BaseDispatcher {
    async fn request(&self, args: RequestArguments) -> RpcResult<Value> {
        match self.mode {
            DispatchMode::Modern => match self.provider.request_dispatch() {
                Some(dispatch) => dispatch.request(args).await,
                None => Err(ProviderRpcError::unsupported_method(&args.method)),
            },
            DispatchMode::Legacy => match self.provider.legacy_dispatch() {
                Some(legacy) => {
                    let payload = JsonRpcRequest::new(args.method, args.params, self.next_id());
                    send_legacy(legacy, payload).await
                }
                None => Err(ProviderRpcError::unsupported_method(&args.method)),
            },
            DispatchMode::Missing => {
                trace!(method = %args.method, "provider exposes no dispatcher");
                Err(ProviderRpcError::unsupported_method(&args.method))
            }
        }
    }
}

/// Sends `payload` through a legacy dispatcher and waits for its callback.
///
/// A response without `result` and `error` never settles. A callback that
/// is dropped without being invoked fails with an internal error.
pub(crate) async fn send_legacy(legacy: &dyn LegacyDispatch, payload: JsonRpcRequest) -> RpcResult<Value> {
    let (tx, rx) = oneshot::channel();
    let method = payload.method.clone();
    let id = payload.id;

    trace!(id, method = %method, "sending legacy request");
    legacy.send_async(
        payload,
        Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }),
    );

    match rx.await {
        Ok(Ok(response)) => match response.into_outcome() {
            Some(outcome) => outcome,
            None => {
                trace!(id, method = %method, "legacy response has no result, request stays pending");
                std::future::pending().await
            }
        },
        Ok(Err(error)) => Err(error),
        Err(_) => {
            warn!(id, method = %method, "legacy callback dropped without a response");
            Err(ProviderRpcError::internal(format!(
                "legacy dispatcher dropped the callback for {method}"
            )))
        }
    }
}
