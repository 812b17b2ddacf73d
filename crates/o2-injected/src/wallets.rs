//! Standard wallet registry.

use async_trait::async_trait;
use o2_common::{
    create_eip1193_provider, normalize_chain_id, to_hex_chain_id, EventPatch, PatchedProvider,
    RequestPatch,
};
use o2_error::{O2Error, Result};
use o2_types::{
    Device, DeviceBrowserName, HostEnvironment, InjectedNamespace, InjectedProvider,
    InjectedWalletModule, Platform, ProviderEvent, ProviderIdentityFlag, ProviderLabel,
    RequestDispatch, RpcMethod, Subscription, WalletIcon, WalletInterface,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// How a standard wallet builds its interface from the host object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interface {
    PassThrough,
    Binance,
    Coinbase,
    Opera,
}

/// A wallet from the standard registry
pub struct StandardWallet {
    label: ProviderLabel,
    namespace: InjectedNamespace,
    identity: fn(&dyn InjectedProvider, &Device) -> bool,
    platforms: &'static [Platform],
    icon: &'static str,
    interface: Interface,
}

impl StandardWallet {
    /// Label of this wallet
    pub fn provider_label(&self) -> ProviderLabel {
        self.label
    }

    fn build(&self, provider: Arc<dyn InjectedProvider>) -> Arc<PatchedProvider> {
        match self.interface {
            Interface::PassThrough => PatchedProvider::passthrough(provider),
            Interface::Binance => binance_provider(provider),
            Interface::Coinbase => coinbase_provider(provider),
            Interface::Opera => opera_provider(provider),
        }
    }
}

impl fmt::Debug for StandardWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardWallet")
            .field("label", &self.label)
            .field("namespace", &self.namespace)
            .field("platforms", &self.platforms)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl InjectedWalletModule for StandardWallet {
    fn label(&self) -> &str {
        self.label.as_str()
    }

    fn injected_namespace(&self) -> InjectedNamespace {
        self.namespace
    }

    fn check_provider_identity(&self, provider: &dyn InjectedProvider, device: &Device) -> bool {
        (self.identity)(provider, device)
    }

    fn platforms(&self) -> &[Platform] {
        self.platforms
    }

    async fn get_icon(&self) -> Result<WalletIcon> {
        Ok(WalletIcon::bundled(self.icon))
    }

    async fn get_interface(&self, host: &dyn HostEnvironment) -> Result<WalletInterface> {
        let provider = host
            .provider(self.namespace)
            .ok_or_else(|| O2Error::ProviderUnavailable {
                namespace: self.namespace.as_str().to_string(),
            })?;
        debug!(wallet = self.label.as_str(), "building wallet interface");
        Ok(WalletInterface {
            provider: self.build(provider),
        })
    }
}

fn flag(provider: &dyn InjectedProvider, flag: ProviderIdentityFlag) -> bool {
    provider.has_flag(flag.as_str())
}

/// Binance Chain Wallet has no way to report whether it is unlocked, so the
/// wrapper tracks it: accounts stay hidden until `eth_requestAccounts`
/// succeeds. The unlock state is read when `eth_accounts` is called, not
/// when the patch is built.
fn binance_provider(provider: Arc<dyn InjectedProvider>) -> Arc<PatchedProvider> {
    let unlocked = Arc::new(AtomicBool::new(false));
    let accounts_unlocked = unlocked.clone();

    let requests = RequestPatch::new()
        .with_override(RpcMethod::EthAccounts, move |base, _| {
            let unlocked = accounts_unlocked.load(Ordering::SeqCst);
            async move {
                if unlocked {
                    base.request(RpcMethod::EthAccounts.into()).await
                } else {
                    Ok(serde_json::json!([]))
                }
            }
        })
        .with_override(RpcMethod::EthRequestAccounts, move |base, _| {
            let unlocked = unlocked.clone();
            async move {
                let accounts = base.request(RpcMethod::EthRequestAccounts.into()).await;
                if accounts.is_ok() {
                    unlocked.store(true, Ordering::SeqCst);
                }
                accounts
            }
        })
        .with_override(RpcMethod::EthChainId, |base, _| async move {
            base.request(RpcMethod::EthChainId.into())
                .await
                .map(normalize_chain_id)
        })
        .disable(RpcMethod::WalletSwitchEthereumChain);

    let events = EventPatch::new().ignore(Subscription::Off);

    create_eip1193_provider(provider, Some(requests), Some(events))
}

fn coinbase_provider(provider: Arc<dyn InjectedProvider>) -> Arc<PatchedProvider> {
    let events = EventPatch::new()
        .transform(Subscription::On, ProviderEvent::ChainChanged, to_hex_chain_id)
        .transform(Subscription::Once, ProviderEvent::ChainChanged, to_hex_chain_id);
    create_eip1193_provider(provider, None, Some(events))
}

fn opera_provider(provider: Arc<dyn InjectedProvider>) -> Arc<PatchedProvider> {
    let requests = RequestPatch::new().with_override(RpcMethod::EthRequestAccounts, |base, _| async move {
        base.request(RpcMethod::EthAccounts.into()).await
    });
    create_eip1193_provider(provider, Some(requests), None)
}

const ALL: &[Platform] = &[Platform::All];
const DESKTOP: &[Platform] = &[Platform::Desktop];
const MOBILE: &[Platform] = &[Platform::Mobile];

/// The standard registry, in declaration order
pub fn standard_wallets() -> Vec<Arc<dyn InjectedWalletModule>> {
    let wallets = [
        StandardWallet {
            label: ProviderLabel::MetaMask,
            namespace: InjectedNamespace::Ethereum,
            identity: |provider, _| flag(provider, ProviderIdentityFlag::MetaMask),
            platforms: ALL,
            icon: "metamask",
            interface: Interface::PassThrough,
        },
        StandardWallet {
            label: ProviderLabel::Binance,
            namespace: InjectedNamespace::Binance,
            identity: |provider, _| flag(provider, ProviderIdentityFlag::Binance),
            platforms: DESKTOP,
            icon: "binance",
            interface: Interface::Binance,
        },
        StandardWallet {
            label: ProviderLabel::Coinbase,
            namespace: InjectedNamespace::Ethereum,
            identity: |provider, _| flag(provider, ProviderIdentityFlag::Coinbase),
            platforms: ALL,
            icon: "coinbase",
            interface: Interface::Coinbase,
        },
        StandardWallet {
            label: ProviderLabel::Detected,
            namespace: InjectedNamespace::Ethereum,
            identity: |provider, _| provider.request_dispatch().is_some(),
            platforms: ALL,
            icon: "detected",
            interface: Interface::PassThrough,
        },
        StandardWallet {
            label: ProviderLabel::Trust,
            namespace: InjectedNamespace::Ethereum,
            identity: |provider, _| flag(provider, ProviderIdentityFlag::Trust),
            platforms: MOBILE,
            icon: "trust",
            interface: Interface::PassThrough,
        },
        StandardWallet {
            label: ProviderLabel::Opera,
            namespace: InjectedNamespace::Ethereum,
            identity: |_, device| device.browser.name == DeviceBrowserName::Opera,
            platforms: ALL,
            icon: "opera",
            interface: Interface::Opera,
        },
        StandardWallet {
            label: ProviderLabel::Status,
            namespace: InjectedNamespace::Ethereum,
            identity: |provider, _| flag(provider, ProviderIdentityFlag::Status),
            platforms: MOBILE,
            icon: "status",
            interface: Interface::PassThrough,
        },
    ];

    wallets
        .into_iter()
        .map(|wallet| Arc::new(wallet) as Arc<dyn InjectedWalletModule>)
        .collect()
}
