mod common;

use common::{desktop, host, labels, mobile, provider_with_flags, StubWallet};
use o2_injected::{resolve, InjectedGlobals, InjectedWalletOptions, O2Error, WalletExclusions, WalletResolver};
use o2_testing::{arb_device, arb_wallet_label, MockProvider};
use o2_types::{InjectedNamespace, Platform, WalletType};
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn test_empty_environment_resolves_nothing() {
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), Arc::new(InjectedGlobals::new())).unwrap();
    assert!(wallets.is_empty());
}

#[test]
fn test_single_metamask() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"]))]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();

    // Detected Wallet also matches, but is dropped once more than one is present
    assert_eq!(labels(&wallets), vec!["MetaMask"]);
    assert!(wallets[0].supported());
    assert_eq!(wallets[0].wallet_type(), WalletType::Injected);
}

#[test]
fn test_lone_detected_wallet_is_kept() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&[]))]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert_eq!(labels(&wallets), vec!["Detected Wallet"]);
}

#[test]
fn test_provider_without_dispatcher_is_not_detected() {
    let env = host(vec![(InjectedNamespace::Ethereum, MockProvider::new().shared())]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert!(wallets.is_empty());
}

#[test]
fn test_spoofed_metamask_flag_is_suppressed() {
    let env = host(vec![
        (InjectedNamespace::Ethereum, provider_with_flags(&["isWalletLink", "isMetaMask"])),
        (InjectedNamespace::Binance, provider_with_flags(&["isMetaMask"])),
    ]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert_eq!(labels(&wallets), vec!["Coinbase Wallet"]);
}

#[test]
fn test_spoofing_wallet_sharing_the_ethereum_object() {
    // MetaMask, Detected Wallet and Trust Wallet all match the same object
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isTrust", "isMetaMask"]))]);
    let wallets = resolve(InjectedWalletOptions::new(), &mobile(), env).unwrap();
    assert_eq!(labels(&wallets), vec!["Trust Wallet"]);
}

#[test]
fn test_single_wallet_is_never_suppressed() {
    // no request dispatcher, so only the MetaMask flag matches
    let env = host(vec![(InjectedNamespace::Ethereum, MockProvider::new().with_flag("isMetaMask").shared())]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert_eq!(labels(&wallets), vec!["MetaMask"]);
}

#[test]
fn test_binance_and_metamask_side_by_side() {
    let env = host(vec![
        (InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"])),
        (InjectedNamespace::Binance, provider_with_flags(&["bbcSignTx"])),
    ]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert_eq!(labels(&wallets), vec!["MetaMask", "Binance Smart Wallet"]);
}

#[test]
fn test_platform_mismatch_is_listed_unsupported() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isLedger"]))]);
    let options = InjectedWalletOptions::new()
        .with_wallet(StubWallet::new("Ledger", "isLedger").on_platforms(&[Platform::Desktop]).shared());
    let wallets = resolve(options, &mobile(), env).unwrap();

    let ledger = wallets.iter().find(|w| w.label() == "Ledger").unwrap();
    assert!(!ledger.supported());
}

#[test]
fn test_standard_platforms_on_desktop() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isTrust"]))]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert_eq!(labels(&wallets), vec!["Trust Wallet"]);
    assert!(!wallets[0].supported());
}

#[test]
fn test_exclusions() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"]))]);

    let excluded = resolve(InjectedWalletOptions::new().exclude_wallet("MetaMask"), &desktop(), env.clone()).unwrap();
    assert_eq!(labels(&excluded), vec!["MetaMask"]);
    assert!(!excluded[0].supported());

    let on_ios = InjectedWalletOptions::new().exclude_on("MetaMask", [Platform::Ios]);
    assert!(resolve(on_ios.clone(), &desktop(), env.clone()).unwrap()[0].supported());
    assert!(!resolve(on_ios, &mobile(), env).unwrap()[0].supported());
}

#[test]
fn test_exclusions_from_json() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"]))]);
    let exclude = WalletExclusions::from_json_str(r#"{"MetaMask": ["mobile"]}"#).unwrap();
    let wallets = resolve(InjectedWalletOptions::new().with_exclusions(exclude), &mobile(), env).unwrap();
    assert!(!wallets[0].supported());
}

#[test]
fn test_custom_wallet_shadows_standard_label() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isCustomMetaMask"]))]);
    let options = InjectedWalletOptions::new().with_wallet(StubWallet::new("MetaMask", "isCustomMetaMask").shared());

    let resolver = WalletResolver::new(options).unwrap();
    assert_eq!(resolver.wallets().len(), 7);
    assert_eq!(resolver.wallets()[0].platforms(), &[Platform::All]);

    let wallets = resolver.resolve(&desktop(), env);
    assert_eq!(labels(&wallets), vec!["MetaMask"]);
}

#[test]
fn test_custom_wallets_come_first() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask", "isFrame"]))]);
    let options = InjectedWalletOptions::new().with_wallet(StubWallet::new("Frame", "isFrame").shared());
    let wallets = resolve(options, &desktop(), env).unwrap();

    // Frame carries the MetaMask flag too, so MetaMask is suppressed
    assert_eq!(labels(&wallets), vec!["Frame"]);
}

#[test]
fn test_invalid_options_fail_before_scanning() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"]))]);

    let unnamed = InjectedWalletOptions::new().with_wallet(StubWallet::new("  ", "isMetaMask").shared());
    assert!(matches!(
        resolve(unnamed, &desktop(), env.clone()),
        Err(O2Error::InvalidConfiguration(_))
    ));

    let nowhere = InjectedWalletOptions::new().with_wallet(StubWallet::new("Frame", "isFrame").on_platforms(&[]).shared());
    assert!(matches!(
        resolve(nowhere, &desktop(), env),
        Err(O2Error::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_get_interface_after_provider_removed() {
    let globals = Arc::new(InjectedGlobals::new());
    globals.inject(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"]));

    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), globals.clone()).unwrap();
    assert!(wallets[0].get_interface().await.is_ok());

    globals.remove(InjectedNamespace::Ethereum);
    let err = wallets[0].get_interface().await.unwrap_err();
    assert!(matches!(err, O2Error::ProviderUnavailable { ref namespace } if namespace == "ethereum"));
}

#[tokio::test]
async fn test_resolved_icon() {
    let env = host(vec![(InjectedNamespace::Ethereum, provider_with_flags(&["isMetaMask"]))]);
    let wallets = resolve(InjectedWalletOptions::new(), &desktop(), env).unwrap();
    assert_eq!(wallets[0].get_icon().await.unwrap().asset, "metamask");
}

proptest! {
    #[test]
    fn test_resolved_labels_are_unique(
        custom in prop::collection::vec(arb_wallet_label(), 0..6),
        device in arb_device(),
        flags in prop::collection::vec(
            prop::sample::select(vec!["isMetaMask", "isWalletLink", "isTrust", "isStatus", "bbcSignTx"]),
            0..4,
        ),
    ) {
        let options = custom.iter().fold(InjectedWalletOptions::new(), |options, label| {
            options.with_wallet(StubWallet::new(label, "isMetaMask").shared())
        });
        let env = host(vec![
            (InjectedNamespace::Ethereum, provider_with_flags(&flags)),
            (InjectedNamespace::Binance, provider_with_flags(&flags)),
        ]);

        let wallets = resolve(options, &device, env).unwrap();
        let mut seen = std::collections::HashSet::new();
        for wallet in &wallets {
            prop_assert!(seen.insert(wallet.label().to_string()), "duplicate label {}", wallet.label());
        }
        if wallets.len() > 1 {
            prop_assert!(wallets.iter().all(|w| w.label() != "Detected Wallet"));
        }
    }
}
