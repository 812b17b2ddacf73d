//! # O2 Types
//!
//! Shared types and capability traits for the O2 injected wallet connectors.
//!
//! ## Core Traits
//!
//! - [`InjectedProvider`] - A host-injected object, probed for capabilities
//! - [`RequestDispatch`] - Modern `request` dispatcher
//! - [`LegacyDispatch`] - Legacy `sendAsync` dispatcher
//! - [`EventSubscription`] - `on`/`once`/`off`/`removeListener`
//! - [`Eip1193Provider`] - A provider conforming to the canonical contract
//! - [`HostEnvironment`] - Read access to the injected globals
//! - [`InjectedWalletModule`] - Wallet descriptor
//!
//! ## Example
//!
//! ```ignore
//! use o2_types::prelude::*;
//!
//! async fn chain_id(provider: &dyn Eip1193Provider) -> RpcResult<serde_json::Value> {
//!     provider.request(RpcMethod::EthChainId.into()).await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod device;
pub mod provider;
pub mod rpc;
pub mod wallet;

pub use device::{Device, DeviceBrowser, DeviceBrowserName, DeviceOs, DeviceOsName, DeviceType, Platform};
pub use provider::{
    listener, listener_id, BoxFuture, Eip1193Provider, EventSubscription, HostEnvironment, InjectedProvider,
    LegacyCallback, LegacyDispatch, Listener, ProviderEvent, RequestDispatch, Subscription,
};
pub use rpc::{JsonRpcRequest, JsonRpcResponse, RequestArguments, RpcMethod, RpcResult};
pub use wallet::{
    InjectedNamespace, InjectedWalletModule, ProviderIdentityFlag, ProviderLabel, WalletIcon,
    WalletInterface, WalletType,
};

pub use o2_error::{O2Error, ProviderRpcError, ProviderRpcErrorCode, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Device, DeviceType, Eip1193Provider, EventSubscription, HostEnvironment,
        InjectedNamespace, InjectedProvider, InjectedWalletModule, LegacyDispatch, Listener,
        Platform, ProviderEvent, ProviderLabel, ProviderRpcError, RequestArguments,
        RequestDispatch, RpcMethod, RpcResult, Subscription, WalletInterface,
    };
}
