//! Caller supplied options: extra wallets and exclusion rules.

use o2_error::{O2Error, Result};
use o2_types::{Device, InjectedWalletModule, Platform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a wallet is excluded.
///
/// In JSON, `false` excludes the wallet everywhere and an array of platform
/// names excludes it on those platforms only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExclusion", into = "RawExclusion")]
pub enum Exclusion {
    /// Excluded on every device
    All,
    /// Excluded when the device type or OS name is listed
    Platforms(Vec<Platform>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawExclusion {
    Flag(bool),
    Platforms(Vec<Platform>),
}

impl TryFrom<RawExclusion> for Exclusion {
    type Error = String;

    fn try_from(raw: RawExclusion) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawExclusion::Flag(false) => Ok(Exclusion::All),
            RawExclusion::Flag(true) => {
                Err("`true` is not a valid exclusion, use `false` to exclude a wallet".to_string())
            }
            RawExclusion::Platforms(platforms) => Ok(Exclusion::Platforms(platforms)),
        }
    }
}

impl From<Exclusion> for RawExclusion {
    fn from(exclusion: Exclusion) -> Self {
        match exclusion {
            Exclusion::All => RawExclusion::Flag(false),
            Exclusion::Platforms(platforms) => RawExclusion::Platforms(platforms),
        }
    }
}

impl Exclusion {
    /// Returns true if the exclusion applies on `device`
    pub fn excludes(&self, device: &Device) -> bool {
        match self {
            Exclusion::All => true,
            Exclusion::Platforms(platforms) => device
                .platforms()
                .iter()
                .any(|platform| platforms.contains(platform)),
        }
    }
}

/// Exclusion rules keyed by wallet label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletExclusions(HashMap<String, Exclusion>);

impl WalletExclusions {
    /// Creates an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses rules from their JSON form, e.g.
    /// `{"MetaMask": false, "Trust Wallet": ["iOS"]}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let exclusions: Self = serde_json::from_str(json)
            .map_err(|e| O2Error::config(format!("invalid wallet exclusions: {e}")))?;
        exclusions.validate()?;
        Ok(exclusions)
    }

    /// Sets the rule for `label`, replacing any earlier one
    pub fn insert(&mut self, label: impl Into<String>, exclusion: Exclusion) {
        self.0.insert(label.into(), exclusion);
    }

    /// Returns the rule for `label`
    pub fn get(&self, label: &str) -> Option<&Exclusion> {
        self.0.get(label)
    }

    /// Returns true if `label` is excluded on `device`
    pub fn excludes(&self, label: &str, device: &Device) -> bool {
        self.get(label).is_some_and(|exclusion| exclusion.excludes(device))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no rules
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks every rule has a label and, for platform rules, at least one
    /// platform
    pub fn validate(&self) -> Result<()> {
        for (label, exclusion) in &self.0 {
            if label.trim().is_empty() {
                return Err(O2Error::config("exclusion label must not be empty"));
            }
            if matches!(exclusion, Exclusion::Platforms(platforms) if platforms.is_empty()) {
                return Err(O2Error::config(format!(
                    "exclusion for '{label}' must list at least one platform"
                )));
            }
        }
        Ok(())
    }
}

/// Options for injected wallet resolution
#[derive(Clone, Default)]
pub struct InjectedWalletOptions {
    /// Extra wallets, checked ahead of the standard registry
    pub wallets: Vec<Arc<dyn InjectedWalletModule>>,
    /// Exclusion rules
    pub exclude: WalletExclusions,
}

impl InjectedWalletOptions {
    /// Creates options with no extra wallets and no exclusions
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extra wallet
    pub fn with_wallet(mut self, wallet: Arc<dyn InjectedWalletModule>) -> Self {
        self.wallets.push(wallet);
        self
    }

    /// Sets the exclusion rules
    pub fn with_exclusions(mut self, exclude: WalletExclusions) -> Self {
        self.exclude = exclude;
        self
    }

    /// Excludes `label` on every device
    pub fn exclude_wallet(mut self, label: impl Into<String>) -> Self {
        self.exclude.insert(label, Exclusion::All);
        self
    }

    /// Excludes `label` on the given platforms. Adds to earlier platform
    /// rules for the same label; a wallet excluded everywhere stays so.
    pub fn exclude_on(
        mut self,
        label: impl Into<String>,
        platforms: impl IntoIterator<Item = Platform>,
    ) -> Self {
        let label = label.into();
        let mut merged = match self.exclude.get(&label) {
            Some(Exclusion::All) => return self,
            Some(Exclusion::Platforms(existing)) => existing.clone(),
            None => Vec::new(),
        };
        for platform in platforms {
            if !merged.contains(&platform) {
                merged.push(platform);
            }
        }
        self.exclude.insert(label, Exclusion::Platforms(merged));
        self
    }

    /// Checks the options are structurally valid
    pub fn validate(&self) -> Result<()> {
        for wallet in &self.wallets {
            if wallet.label().trim().is_empty() {
                return Err(O2Error::config("wallet label must not be empty"));
            }
            if wallet.platforms().is_empty() {
                return Err(O2Error::config(format!(
                    "wallet '{}' must declare at least one platform",
                    wallet.label()
                )));
            }
        }
        self.exclude.validate()
    }
}

impl fmt::Debug for InjectedWalletOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.wallets.iter().map(|w| w.label()).collect();
        f.debug_struct("InjectedWalletOptions")
            .field("wallets", &labels)
            .field("exclude", &self.exclude)
            .finish()
    }
}
