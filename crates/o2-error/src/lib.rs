//! # O2 Error
//!
//! Unified error types for the O2 injected wallet connectors.
//!
//! ## Error Categories
//!
//! - [`ProviderRpcError`] - EIP-1193 shaped error returned by provider requests
//! - [`ProviderRpcErrorCode`] - Reserved EIP-1193 error codes
//! - [`O2Error`] - Top-level error for configuration and wallet initialization
//!
//! ## Example
//!
//! ```
//! use o2_error::{ProviderRpcError, ProviderRpcErrorCode};
//!
//! let err = ProviderRpcError::unsupported_method("wallet_switchEthereumChain");
//! assert_eq!(err.code, 4200);
//! assert_eq!(err.reserved_code(), Some(ProviderRpcErrorCode::UnsupportedMethod));
//! assert!(err.message.contains("wallet_switchEthereumChain"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC 2.0 internal error code
pub const JSON_RPC_INTERNAL_ERROR: i64 = -32603;

/// Reserved EIP-1193 provider error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ProviderRpcErrorCode {
    /// The user rejected the request.
    RejectedRequest = 4001,
    /// The requested method and/or account has not been authorized by the user.
    Unauthorized = 4100,
    /// The Provider does not support the requested method.
    UnsupportedMethod = 4200,
    /// The Provider is disconnected from all chains.
    Disconnected = 4900,
    /// The Provider is not connected to the requested chain.
    ChainDisconnected = 4901,
}

impl ProviderRpcErrorCode {
    /// Returns the numeric code
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Looks up a reserved code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            4001 => Some(Self::RejectedRequest),
            4100 => Some(Self::Unauthorized),
            4200 => Some(Self::UnsupportedMethod),
            4900 => Some(Self::Disconnected),
            4901 => Some(Self::ChainDisconnected),
            _ => None,
        }
    }

    /// Short human readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::RejectedRequest => "The user rejected the request",
            Self::Unauthorized => {
                "The requested method and/or account has not been authorized by the user"
            }
            Self::UnsupportedMethod => "The Provider does not support the requested method",
            Self::Disconnected => "The Provider is disconnected from all chains",
            Self::ChainDisconnected => "The Provider is not connected to the requested chain",
        }
    }
}

/// Error returned by an EIP-1193 `request` call.
///
/// The shape matches what injected providers reject with: an integer `code`,
/// a `message` and optional `data`. Errors coming from the wallet itself are
/// carried through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Provider RPC error {code}: {message}")]
pub struct ProviderRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Additional data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    /// Creates a new error with the given code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an error from a reserved code using its standard description
    pub fn from_code(code: ProviderRpcErrorCode) -> Self {
        Self::new(code.code(), code.description())
    }

    /// Error raised when a method is not supported by the provider
    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            ProviderRpcErrorCode::UnsupportedMethod.code(),
            format!("The Provider does not support the requested method: {method}"),
        )
    }

    /// JSON-RPC internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(JSON_RPC_INTERNAL_ERROR, message)
    }

    /// Attaches additional data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the reserved code, if this error uses one
    pub fn reserved_code(&self) -> Option<ProviderRpcErrorCode> {
        ProviderRpcErrorCode::from_code(self.code)
    }

    /// Returns true if the error signals an unsupported method
    pub fn is_unsupported_method(&self) -> bool {
        self.reserved_code() == Some(ProviderRpcErrorCode::UnsupportedMethod)
    }
}

/// The main error type for O2 operations.
#[derive(Error, Debug)]
pub enum O2Error {
    /// Caller supplied options are structurally invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No provider is injected at the namespace a wallet needs
    #[error("No provider injected at '{namespace}'")]
    ProviderUnavailable {
        /// Host namespace that was empty
        namespace: String,
    },

    /// Method name is not one of the known RPC methods
    #[error("Unknown RPC method: {0}")]
    UnknownMethod(String),

    /// Unknown platform name
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Request to the provider failed
    #[error(transparent)]
    Rpc(#[from] ProviderRpcError),

    /// JSON parse error
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Convenient Result type using O2Error
pub type Result<T> = std::result::Result<T, O2Error>;

impl From<serde_json::Error> for O2Error {
    fn from(err: serde_json::Error) -> Self {
        O2Error::JsonError(err.to_string())
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Invalid configuration
    InvalidConfiguration = 1001,
    /// Unknown method or platform name
    UnknownName = 1002,
    /// Provider not injected
    ProviderUnavailable = 2001,
    /// Upstream provider or override rejected
    UpstreamRpcFailure = 3001,
    /// Method disabled or not supported
    UnsupportedMethod = 4200,
}

impl O2Error {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            O2Error::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            O2Error::UnknownMethod(_) | O2Error::UnknownPlatform(_) => ErrorCode::UnknownName,
            O2Error::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            O2Error::Rpc(err) if err.is_unsupported_method() => ErrorCode::UnsupportedMethod,
            O2Error::Rpc(_) => ErrorCode::UpstreamRpcFailure,
            _ => ErrorCode::Unknown,
        }
    }

    /// Creates a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        O2Error::InvalidConfiguration(reason.into())
    }
}
