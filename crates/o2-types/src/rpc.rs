//! RPC method names, request arguments and JSON-RPC envelopes.

use o2_error::{O2Error, ProviderRpcError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Result of a provider request
pub type RpcResult<T> = std::result::Result<T, ProviderRpcError>;

/// RPC methods a request patch can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    /// `eth_accounts`
    #[serde(rename = "eth_accounts")]
    EthAccounts,
    /// `eth_call`
    #[serde(rename = "eth_call")]
    EthCall,
    /// `eth_chainId`
    #[serde(rename = "eth_chainId")]
    EthChainId,
    /// `eth_getBalance`
    #[serde(rename = "eth_getBalance")]
    EthGetBalance,
    /// `eth_sendTransaction`
    #[serde(rename = "eth_sendTransaction")]
    EthSendTransaction,
    /// `eth_sign`
    #[serde(rename = "eth_sign")]
    EthSign,
    /// `eth_requestAccounts` (EIP-1102)
    #[serde(rename = "eth_requestAccounts")]
    EthRequestAccounts,
    /// `wallet_addEthereumChain` (EIP-3085)
    #[serde(rename = "wallet_addEthereumChain")]
    WalletAddEthereumChain,
    /// `wallet_switchEthereumChain` (EIP-3326)
    #[serde(rename = "wallet_switchEthereumChain")]
    WalletSwitchEthereumChain,
}

impl RpcMethod {
    /// Every supported method
    pub const VALUES: [RpcMethod; 9] = [
        RpcMethod::EthAccounts,
        RpcMethod::EthCall,
        RpcMethod::EthChainId,
        RpcMethod::EthGetBalance,
        RpcMethod::EthSendTransaction,
        RpcMethod::EthSign,
        RpcMethod::EthRequestAccounts,
        RpcMethod::WalletAddEthereumChain,
        RpcMethod::WalletSwitchEthereumChain,
    ];

    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::EthAccounts => "eth_accounts",
            RpcMethod::EthCall => "eth_call",
            RpcMethod::EthChainId => "eth_chainId",
            RpcMethod::EthGetBalance => "eth_getBalance",
            RpcMethod::EthSendTransaction => "eth_sendTransaction",
            RpcMethod::EthSign => "eth_sign",
            RpcMethod::EthRequestAccounts => "eth_requestAccounts",
            RpcMethod::WalletAddEthereumChain => "wallet_addEthereumChain",
            RpcMethod::WalletSwitchEthereumChain => "wallet_switchEthereumChain",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcMethod {
    type Err = O2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::VALUES
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| O2Error::UnknownMethod(s.to_string()))
    }
}

/// Arguments of an EIP-1193 `request` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    /// Method name
    pub method: String,
    /// Parameters, absent when the caller passed none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestArguments {
    /// Creates a request without parameters
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    /// Sets the parameters
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Returns the known method this request targets, if any
    pub fn rpc_method(&self) -> Option<RpcMethod> {
        self.method.parse().ok()
    }
}

impl From<RpcMethod> for RequestArguments {
    fn from(method: RpcMethod) -> Self {
        Self::new(method.as_str())
    }
}

/// JSON-RPC request payload handed to legacy `sendAsync` style dispatchers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Request ID
    pub id: u64,
    /// Method name
    pub method: String,
    /// Parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request
    pub fn new(method: impl Into<String>, params: Option<Value>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response payload delivered to a legacy callback
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    #[serde(default)]
    pub jsonrpc: String,
    /// Response ID
    #[serde(default)]
    pub id: u64,
    /// Result. `Some(Value::Null)` is an explicit `null` result; `None` means
    /// the field was absent.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    /// Error (if failed)
    #[serde(default)]
    pub error: Option<ProviderRpcError>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    /// Successful response
    pub fn result(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn error(id: u64, error: ProviderRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Response carrying neither a result nor an error
    pub fn empty(id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: None,
        }
    }

    /// Settles the response: an error wins over a result, and a response
    /// without either yields `None`.
    pub fn into_outcome(self) -> Option<RpcResult<Value>> {
        match (self.error, self.result) {
            (Some(error), _) => Some(Err(error)),
            (None, Some(result)) => Some(Ok(result)),
            (None, None) => None,
        }
    }
}
