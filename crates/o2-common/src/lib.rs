//! # O2 Common
//!
//! Turns whatever provider object a wallet injected into a provider that
//! follows the EIP-1193 request/event contract.
//!
//! ## Features
//!
//! - Request patches: disable a method or answer it with an override
//! - Event patches: replace a subscription method or transform event values
//! - Legacy `sendAsync` providers bridged to async requests
//! - Idempotent wrapping through a side table of live wrappers
//!
//! ## Example
//!
//! ```ignore
//! use o2_common::{create_eip1193_provider, RequestPatch};
//! use o2_types::RpcMethod;
//!
//! let patch = RequestPatch::new()
//!     .disable(RpcMethod::WalletSwitchEthereumChain)
//!     .with_override(RpcMethod::EthRequestAccounts, |base, _| async move {
//!         base.request(RpcMethod::EthAccounts.into()).await
//!     });
//!
//! let provider = create_eip1193_provider(host_provider, Some(patch), None);
//! let accounts = provider.request(RpcMethod::EthRequestAccounts.into()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod dispatch;
pub mod normalize;
pub mod patch;

pub use adapter::{create_eip1193_provider, PatchedProvider, ProviderAdapter};
pub use dispatch::{BaseDispatcher, DispatchMode};
pub use normalize::{normalize_chain_id, to_hex_chain_id};
pub use patch::{EventHook, EventPatch, EventTransform, OverrideFn, PatchEntry, ReplaceFn, RequestPatch};
