//! Device descriptor and platform names.
//!
//! Device detection happens outside this workspace; callers hand in an
//! already computed [`Device`]. Wallets declare the [`Platform`]s they run on
//! and callers may exclude wallets per platform.

use o2_error::O2Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Form factor of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Desktop or laptop
    Desktop,
    /// Phone
    Mobile,
    /// Tablet
    Tablet,
}

/// Operating system name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceOsName {
    /// Windows Phone
    #[serde(rename = "Windows Phone")]
    WindowsPhone,
    /// Windows
    Windows,
    /// macOS
    #[serde(rename = "macOS")]
    MacOs,
    /// iOS
    #[serde(rename = "iOS")]
    Ios,
    /// Android
    Android,
    /// Linux
    Linux,
    /// Chrome OS
    #[serde(rename = "Chrome OS")]
    ChromeOs,
}

/// Browser name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceBrowserName {
    /// Stock Android browser
    #[serde(rename = "Android Browser")]
    AndroidBrowser,
    /// Chrome
    Chrome,
    /// Chromium
    Chromium,
    /// Firefox
    Firefox,
    /// Microsoft Edge
    #[serde(rename = "Microsoft Edge")]
    MicrosoftEdge,
    /// Opera
    Opera,
    /// Safari
    Safari,
}

/// Operating system of the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOs {
    /// OS name
    pub name: DeviceOsName,
    /// OS version string
    #[serde(default)]
    pub version: String,
}

/// Browser the dapp runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBrowser {
    /// Browser name
    pub name: DeviceBrowserName,
    /// Browser version string
    #[serde(default)]
    pub version: String,
}

/// Already detected device descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Operating system
    pub os: DeviceOs,
    /// Device form factor
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Browser
    pub browser: DeviceBrowser,
}

impl Device {
    /// Creates a device descriptor with empty version strings
    pub fn new(device_type: DeviceType, os: DeviceOsName, browser: DeviceBrowserName) -> Self {
        Self {
            os: DeviceOs {
                name: os,
                version: String::new(),
            },
            device_type,
            browser: DeviceBrowser {
                name: browser,
                version: String::new(),
            },
        }
    }

    /// The platforms used for platform and exclusion matching: the device
    /// type and the OS name.
    pub fn platforms(&self) -> [Platform; 2] {
        [self.device_type.into(), self.os.name.into()]
    }
}

/// A platform a wallet supports or is excluded on.
///
/// Platforms are device types, OS names, browser names or `all`, serialized
/// with the same strings the device detector reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Every platform
    #[serde(rename = "all")]
    All,
    /// Desktop devices
    #[serde(rename = "desktop")]
    Desktop,
    /// Mobile devices
    #[serde(rename = "mobile")]
    Mobile,
    /// Tablets
    #[serde(rename = "tablet")]
    Tablet,
    /// Windows Phone
    #[serde(rename = "Windows Phone")]
    WindowsPhone,
    /// Windows
    Windows,
    /// macOS
    #[serde(rename = "macOS")]
    MacOs,
    /// iOS
    #[serde(rename = "iOS")]
    Ios,
    /// Android
    Android,
    /// Linux
    Linux,
    /// Chrome OS
    #[serde(rename = "Chrome OS")]
    ChromeOs,
    /// Android Browser
    #[serde(rename = "Android Browser")]
    AndroidBrowser,
    /// Chrome
    Chrome,
    /// Chromium
    Chromium,
    /// Firefox
    Firefox,
    /// Microsoft Edge
    #[serde(rename = "Microsoft Edge")]
    MicrosoftEdge,
    /// Opera
    Opera,
    /// Safari
    Safari,
}

impl Platform {
    /// Every platform value
    pub const VALUES: [Platform; 18] = [
        Platform::All,
        Platform::Desktop,
        Platform::Mobile,
        Platform::Tablet,
        Platform::WindowsPhone,
        Platform::Windows,
        Platform::MacOs,
        Platform::Ios,
        Platform::Android,
        Platform::Linux,
        Platform::ChromeOs,
        Platform::AndroidBrowser,
        Platform::Chrome,
        Platform::Chromium,
        Platform::Firefox,
        Platform::MicrosoftEdge,
        Platform::Opera,
        Platform::Safari,
    ];

    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::All => "all",
            Platform::Desktop => "desktop",
            Platform::Mobile => "mobile",
            Platform::Tablet => "tablet",
            Platform::WindowsPhone => "Windows Phone",
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Ios => "iOS",
            Platform::Android => "Android",
            Platform::Linux => "Linux",
            Platform::ChromeOs => "Chrome OS",
            Platform::AndroidBrowser => "Android Browser",
            Platform::Chrome => "Chrome",
            Platform::Chromium => "Chromium",
            Platform::Firefox => "Firefox",
            Platform::MicrosoftEdge => "Microsoft Edge",
            Platform::Opera => "Opera",
            Platform::Safari => "Safari",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = O2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::VALUES
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| O2Error::UnknownPlatform(s.to_string()))
    }
}

impl From<DeviceType> for Platform {
    fn from(value: DeviceType) -> Self {
        match value {
            DeviceType::Desktop => Platform::Desktop,
            DeviceType::Mobile => Platform::Mobile,
            DeviceType::Tablet => Platform::Tablet,
        }
    }
}

impl From<DeviceOsName> for Platform {
    fn from(value: DeviceOsName) -> Self {
        match value {
            DeviceOsName::WindowsPhone => Platform::WindowsPhone,
            DeviceOsName::Windows => Platform::Windows,
            DeviceOsName::MacOs => Platform::MacOs,
            DeviceOsName::Ios => Platform::Ios,
            DeviceOsName::Android => Platform::Android,
            DeviceOsName::Linux => Platform::Linux,
            DeviceOsName::ChromeOs => Platform::ChromeOs,
        }
    }
}

impl From<DeviceBrowserName> for Platform {
    fn from(value: DeviceBrowserName) -> Self {
        match value {
            DeviceBrowserName::AndroidBrowser => Platform::AndroidBrowser,
            DeviceBrowserName::Chrome => Platform::Chrome,
            DeviceBrowserName::Chromium => Platform::Chromium,
            DeviceBrowserName::Firefox => Platform::Firefox,
            DeviceBrowserName::MicrosoftEdge => Platform::MicrosoftEdge,
            DeviceBrowserName::Opera => Platform::Opera,
            DeviceBrowserName::Safari => Platform::Safari,
        }
    }
}
