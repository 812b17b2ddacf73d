//! Wallet resolution: which injected wallets can be offered on a device.

use crate::options::{InjectedWalletOptions, WalletExclusions};
use crate::wallets::standard_wallets;
use o2_error::Result;
use o2_types::{
    Device, HostEnvironment, InjectedWalletModule, Platform, ProviderIdentityFlag, ProviderLabel,
    WalletIcon, WalletInterface, WalletType,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A wallet found in the host environment
#[derive(Clone)]
pub struct ResolvedWallet {
    module: Arc<dyn InjectedWalletModule>,
    supported: bool,
    host: Arc<dyn HostEnvironment>,
}

impl ResolvedWallet {
    /// Wallet label
    pub fn label(&self) -> &str {
        self.module.label()
    }

    /// False if the wallet is excluded or does not run on the device
    pub fn supported(&self) -> bool {
        self.supported
    }

    /// Always [`WalletType::Injected`]
    pub fn wallet_type(&self) -> WalletType {
        WalletType::Injected
    }

    /// The wallet descriptor
    pub fn module(&self) -> &Arc<dyn InjectedWalletModule> {
        &self.module
    }

    /// Loads the wallet icon
    pub async fn get_icon(&self) -> Result<WalletIcon> {
        self.module.get_icon().await
    }

    /// Builds the wallet interface from the provider injected at the time of
    /// the call
    pub async fn get_interface(&self) -> Result<WalletInterface> {
        self.module.get_interface(self.host.as_ref()).await
    }
}

impl fmt::Debug for ResolvedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedWallet")
            .field("label", &self.label())
            .field("supported", &self.supported)
            .field("type", &self.wallet_type())
            .finish()
    }
}

/// Resolves the injected wallets present in a host environment.
///
/// Extra wallets from the options are checked ahead of the standard
/// registry; when two wallets share a label the first one wins.
pub struct WalletResolver {
    wallets: Vec<Arc<dyn InjectedWalletModule>>,
    exclude: WalletExclusions,
}

impl WalletResolver {
    /// Validates `options` and builds the deduplicated wallet set
    pub fn new(options: InjectedWalletOptions) -> Result<Self> {
        options.validate()?;

        let mut seen = HashSet::new();
        let wallets = options
            .wallets
            .into_iter()
            .chain(standard_wallets())
            .filter(|wallet| {
                let first = seen.insert(wallet.label().to_string());
                if !first {
                    debug!(wallet = wallet.label(), "duplicate wallet label dropped");
                }
                first
            })
            .collect();

        Ok(Self {
            wallets,
            exclude: options.exclude,
        })
    }

    /// The deduplicated wallet set, in resolution order
    pub fn wallets(&self) -> &[Arc<dyn InjectedWalletModule>] {
        &self.wallets
    }

    /// Returns true unless the wallet is excluded on `device` or declares
    /// none of `all`, the device type or the OS name as a platform
    pub fn is_supported(&self, wallet: &dyn InjectedWalletModule, device: &Device) -> bool {
        if self.exclude.excludes(wallet.label(), device) {
            debug!(wallet = wallet.label(), "wallet excluded");
            return false;
        }

        let platforms = wallet.platforms();
        let runs_here = platforms.contains(&Platform::All)
            || device.platforms().iter().any(|p| platforms.contains(p));
        if !runs_here {
            debug!(wallet = wallet.label(), "wallet does not run on this device");
        }
        runs_here
    }

    /// Returns the wallets present in `host`.
    ///
    /// When more than one wallet is present the generic Detected Wallet is
    /// dropped, and so is MetaMask if another wallet's provider also
    /// carries the `isMetaMask` flag.
    pub fn resolve(&self, device: &Device, host: Arc<dyn HostEnvironment>) -> Vec<ResolvedWallet> {
        let mut suppress_metamask = false;

        let present: Vec<ResolvedWallet> = self
            .wallets
            .iter()
            .filter(|wallet| {
                let Some(provider) = host.provider(wallet.injected_namespace()) else {
                    return false;
                };
                if !wallet.check_provider_identity(provider.as_ref(), device) {
                    return false;
                }
                let label = wallet.label();
                if provider.has_flag(ProviderIdentityFlag::MetaMask.as_str())
                    && label != ProviderLabel::MetaMask.as_str()
                    && label != ProviderLabel::Detected.as_str()
                {
                    debug!(wallet = label, "provider also claims to be MetaMask");
                    suppress_metamask = true;
                }
                debug!(wallet = label, "wallet present");
                true
            })
            .map(|wallet| ResolvedWallet {
                module: wallet.clone(),
                supported: self.is_supported(wallet.as_ref(), device),
                host: host.clone(),
            })
            .collect();

        let resolved: Vec<ResolvedWallet> = if present.len() > 1 {
            present
                .into_iter()
                .filter(|wallet| {
                    let label = wallet.label();
                    let dropped = label == ProviderLabel::Detected.as_str()
                        || (suppress_metamask && label == ProviderLabel::MetaMask.as_str());
                    if dropped {
                        debug!(wallet = label, "wallet suppressed");
                    }
                    !dropped
                })
                .collect()
        } else {
            present
        };

        info!(count = resolved.len(), "resolved injected wallets");
        resolved
    }
}

impl fmt::Debug for WalletResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.wallets.iter().map(|w| w.label()).collect();
        f.debug_struct("WalletResolver")
            .field("wallets", &labels)
            .field("exclude", &self.exclude)
            .finish()
    }
}

/// Validates `options` and resolves the wallets present in `host`
pub fn resolve(
    options: InjectedWalletOptions,
    device: &Device,
    host: Arc<dyn HostEnvironment>,
) -> Result<Vec<ResolvedWallet>> {
    Ok(WalletResolver::new(options)?.resolve(device, host))
}
