//! # O2 Injected
//!
//! Discovers the browser-injected wallets a dapp can offer.
//!
//! ## Resolution
//!
//! 1. Options are validated; malformed wallets or exclusions fail fast
//! 2. Extra wallets are merged ahead of the standard registry, first label wins
//! 3. Each wallet is flagged supported or not for the current device
//! 4. Wallets whose provider is not injected, or fails the identity check,
//!    are dropped
//! 5. With more than one wallet present, Detected Wallet is dropped, and so
//!    is MetaMask when another provider spoofs its flag
//!
//! ## Example
//!
//! ```ignore
//! use o2_injected::{resolve, InjectedGlobals, InjectedWalletOptions};
//!
//! let options = InjectedWalletOptions::new().exclude_on("Trust Wallet", [Platform::Ios]);
//! let wallets = resolve(options, &device, Arc::new(globals))?;
//!
//! for wallet in wallets.iter().filter(|w| w.supported()) {
//!     let interface = wallet.get_interface().await?;
//!     let accounts = interface.provider.request(RpcMethod::EthRequestAccounts.into()).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod host;
pub mod options;
pub mod resolver;
pub mod wallets;

pub use host::InjectedGlobals;
pub use options::{Exclusion, InjectedWalletOptions, WalletExclusions};
pub use resolver::{resolve, ResolvedWallet, WalletResolver};
pub use wallets::{standard_wallets, StandardWallet};

pub use o2_error::{O2Error, Result};
