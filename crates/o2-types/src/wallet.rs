//! Wallet identities and the injected wallet module contract.

use crate::device::{Device, Platform};
use crate::provider::{Eip1193Provider, HostEnvironment, InjectedProvider};
use async_trait::async_trait;
use o2_error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Global object a wallet injects its provider into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectedNamespace {
    /// `window.ethereum`
    #[serde(rename = "ethereum")]
    Ethereum,
    /// `window.BinanceChain`
    #[serde(rename = "BinanceChain")]
    Binance,
    /// `window.web3`
    #[serde(rename = "web3")]
    Web3,
}

impl InjectedNamespace {
    /// Returns the global's name
    pub fn as_str(&self) -> &'static str {
        match self {
            InjectedNamespace::Ethereum => "ethereum",
            InjectedNamespace::Binance => "BinanceChain",
            InjectedNamespace::Web3 => "web3",
        }
    }
}

impl fmt::Display for InjectedNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property on an injected provider that identifies the wallet behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderIdentityFlag {
    /// `bbcSignTx`
    Binance,
    /// `isMetaMask`
    MetaMask,
    /// `isWalletLink`
    Coinbase,
    /// `request`: any object exposing a modern dispatcher
    Detected,
    /// `isTrust`
    Trust,
    /// `isStatus`
    Status,
}

impl ProviderIdentityFlag {
    /// Returns the property name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderIdentityFlag::Binance => "bbcSignTx",
            ProviderIdentityFlag::MetaMask => "isMetaMask",
            ProviderIdentityFlag::Coinbase => "isWalletLink",
            ProviderIdentityFlag::Detected => "request",
            ProviderIdentityFlag::Trust => "isTrust",
            ProviderIdentityFlag::Status => "isStatus",
        }
    }
}

/// Labels of the standard wallets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderLabel {
    /// Binance Smart Wallet
    Binance,
    /// MetaMask
    MetaMask,
    /// Coinbase Wallet
    Coinbase,
    /// Generic fallback for any provider with a request dispatcher
    Detected,
    /// Trust Wallet
    Trust,
    /// Opera's built-in wallet
    Opera,
    /// Status
    Status,
}

impl ProviderLabel {
    /// Returns the display label
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderLabel::Binance => "Binance Smart Wallet",
            ProviderLabel::MetaMask => "MetaMask",
            ProviderLabel::Coinbase => "Coinbase Wallet",
            ProviderLabel::Detected => "Detected Wallet",
            ProviderLabel::Trust => "Trust Wallet",
            ProviderLabel::Opera => "Opera",
            ProviderLabel::Status => "Status",
        }
    }
}

impl fmt::Display for ProviderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for ProviderLabel {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<ProviderLabel> for str {
    fn eq(&self, other: &ProviderLabel) -> bool {
        self == other.as_str()
    }
}

/// Kind of wallet module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// Browser injected wallet
    Injected,
}

/// Opaque handle to a wallet icon asset.
///
/// Loading the asset itself is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletIcon {
    /// Asset name
    pub asset: String,
}

impl WalletIcon {
    /// Creates a handle for a bundled asset
    pub fn bundled(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
        }
    }
}

/// Interface a wallet hands out once initialized
#[derive(Clone)]
pub struct WalletInterface {
    /// EIP-1193 conformant provider
    pub provider: Arc<dyn Eip1193Provider>,
}

impl fmt::Debug for WalletInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletInterface").finish_non_exhaustive()
    }
}

/// Descriptor of an injected wallet.
///
/// Standard wallets ship with `o2-injected`; callers can add their own by
/// implementing this trait.
#[async_trait]
pub trait InjectedWalletModule: Send + Sync {
    /// Unique wallet label
    fn label(&self) -> &str;

    /// Global the wallet injects its provider into
    fn injected_namespace(&self) -> InjectedNamespace;

    /// Returns true if `provider` is this wallet
    fn check_provider_identity(&self, provider: &dyn InjectedProvider, device: &Device) -> bool;

    /// Platforms the wallet runs on
    fn platforms(&self) -> &[Platform];

    /// Loads the wallet icon
    async fn get_icon(&self) -> Result<WalletIcon>;

    /// Builds the wallet interface from the provider currently injected in
    /// `host`
    async fn get_interface(&self, host: &dyn HostEnvironment) -> Result<WalletInterface>;
}
