#![allow(dead_code)]

use async_trait::async_trait;
use o2_common::PatchedProvider;
use o2_injected::{InjectedGlobals, O2Error, Result};
use o2_testing::{MockDispatcher, MockProvider};
use o2_types::{
    Device, DeviceBrowserName, DeviceOsName, DeviceType, HostEnvironment, InjectedNamespace,
    InjectedProvider, InjectedWalletModule, Platform, WalletIcon, WalletInterface,
};
use serde_json::json;
use std::sync::Arc;

/// Caller supplied wallet identified by a single flag
pub struct StubWallet {
    pub label: String,
    pub namespace: InjectedNamespace,
    pub flag: String,
    pub platforms: Vec<Platform>,
}

impl StubWallet {
    pub fn new(label: &str, flag: &str) -> Self {
        Self {
            label: label.to_string(),
            namespace: InjectedNamespace::Ethereum,
            flag: flag.to_string(),
            platforms: vec![Platform::All],
        }
    }

    pub fn on_platforms(mut self, platforms: &[Platform]) -> Self {
        self.platforms = platforms.to_vec();
        self
    }

    pub fn shared(self) -> Arc<dyn InjectedWalletModule> {
        Arc::new(self)
    }
}

#[async_trait]
impl InjectedWalletModule for StubWallet {
    fn label(&self) -> &str {
        &self.label
    }

    fn injected_namespace(&self) -> InjectedNamespace {
        self.namespace
    }

    fn check_provider_identity(&self, provider: &dyn InjectedProvider, _device: &Device) -> bool {
        provider.has_flag(&self.flag)
    }

    fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    async fn get_icon(&self) -> Result<WalletIcon> {
        Ok(WalletIcon::bundled(self.label.to_lowercase()))
    }

    async fn get_interface(&self, host: &dyn HostEnvironment) -> Result<WalletInterface> {
        let provider = host
            .provider(self.namespace)
            .ok_or_else(|| O2Error::ProviderUnavailable {
                namespace: self.namespace.as_str().to_string(),
            })?;
        Ok(WalletInterface {
            provider: PatchedProvider::passthrough(provider),
        })
    }
}

/// Provider with a request dispatcher, an event emitter and the given flags
pub fn provider_with_flags(flags: &[&str]) -> Arc<MockProvider> {
    let mut provider = MockProvider::eip1193(
        MockDispatcher::new()
            .respond("eth_accounts", json!(["0x5aeda56215b167893e80b4fe645ba6d5bab767de"]))
            .respond("eth_requestAccounts", json!(["0x5aeda56215b167893e80b4fe645ba6d5bab767de"]))
            .respond("eth_chainId", json!("56")),
    );
    for flag in flags {
        provider = provider.with_flag(flag);
    }
    provider.shared()
}

pub fn host(entries: Vec<(InjectedNamespace, Arc<MockProvider>)>) -> Arc<dyn HostEnvironment> {
    let globals = InjectedGlobals::new();
    for (namespace, provider) in entries {
        globals.inject(namespace, provider);
    }
    Arc::new(globals)
}

pub fn desktop() -> Device {
    Device::new(DeviceType::Desktop, DeviceOsName::MacOs, DeviceBrowserName::Chrome)
}

pub fn mobile() -> Device {
    Device::new(DeviceType::Mobile, DeviceOsName::Ios, DeviceBrowserName::Safari)
}

pub fn labels(wallets: &[o2_injected::ResolvedWallet]) -> Vec<String> {
    wallets.iter().map(|w| w.label().to_string()).collect()
}
