//! The payment descriptor a server issues alongside `402 Payment Required`.
//!
//! A [`PaymentDescriptor`] is immutable once issued. It tells the client the
//! recipient, the minimum amount in the smallest unit of the asset, the
//! network, and which resource the payment unlocks. Token payments carry a
//! [`TokenAsset`]; its fields are required together, so a descriptor either
//! describes a native-currency payment or a fully specified token payment.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::network::Network;
use crate::version::ProtocolVersion;

/// An ERC-20 style token a payment is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAsset {
    /// Short asset tag (e.g. `"USDC"`).
    pub asset: String,
    /// Token contract address.
    #[serde(rename = "tokenAddress")]
    pub address: Address,
    /// Number of decimals of the token.
    #[serde(rename = "tokenDecimals")]
    pub decimals: u8,
    /// Display symbol of the token.
    #[serde(rename = "tokenSymbol")]
    pub symbol: String,
}

/// What the server requires before releasing a resource.
///
/// Serialized as the `paymentDetails` member of the 402 JSON body; the
/// amount is a decimal string of base units (wei, or token base units).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDescriptor {
    /// Protocol version tag.
    pub version: ProtocolVersion,
    /// Network the payment must be made on.
    pub network: Network,
    /// Recipient account.
    pub pay_to: Address,
    /// Minimum amount in base units.
    #[serde_as(as = "DisplayFromStr")]
    pub max_amount_required: U256,
    /// Opaque identifier of the protected resource, usually its path.
    pub resource: String,
    /// Human-readable description of what the payment unlocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the protected resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Expiry as a Unix timestamp. Carried through, never enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    /// Token the payment is denominated in; `None` for native currency.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenAsset>,
}

/// Wire shape of [`PaymentDescriptor`] with the token fields taken one by one.
#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDescriptor {
    version: ProtocolVersion,
    network: Network,
    pay_to: Address,
    #[serde_as(as = "DisplayFromStr")]
    max_amount_required: U256,
    resource: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    expiry: Option<u64>,
    #[serde(default)]
    asset: Option<String>,
    #[serde(default)]
    token_address: Option<Address>,
    #[serde(default)]
    token_decimals: Option<u8>,
    #[serde(default)]
    token_symbol: Option<String>,
}

impl<'de> Deserialize<'de> for PaymentDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireDescriptor::deserialize(deserializer)?;
        let token = match (wire.asset, wire.token_address, wire.token_decimals, wire.token_symbol) {
            (Some(asset), Some(address), Some(decimals), Some(symbol)) => Some(TokenAsset {
                asset,
                address,
                decimals,
                symbol,
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(serde::de::Error::custom(
                    "asset, tokenAddress, tokenDecimals and tokenSymbol must be given together",
                ));
            }
        };
        Ok(Self {
            version: wire.version,
            network: wire.network,
            pay_to: wire.pay_to,
            max_amount_required: wire.max_amount_required,
            resource: wire.resource,
            description: wire.description,
            mime_type: wire.mime_type,
            expiry: wire.expiry,
            token,
        })
    }
}

impl PaymentDescriptor {
    /// Creates a native-currency descriptor with no optional metadata.
    #[must_use]
    pub fn new(network: Network, pay_to: Address, amount: U256, resource: impl Into<String>) -> Self {
        Self {
            version: ProtocolVersion,
            network,
            pay_to,
            max_amount_required: amount,
            resource: resource.into(),
            description: None,
            mime_type: None,
            expiry: None,
            token: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Sets the expiry timestamp.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Denominates the payment in `token`.
    #[must_use]
    pub fn with_token(mut self, token: TokenAsset) -> Self {
        self.token = Some(token);
        self
    }

    /// Returns `true` if payment is made in the network's native currency.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        self.token.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    fn usdc() -> TokenAsset {
        TokenAsset {
            asset: "USDC".into(),
            address: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            decimals: 6,
            symbol: "USDC".into(),
        }
    }

    #[test]
    fn native_descriptor_json_shape() {
        let d = PaymentDescriptor::new(
            Network::BaseSepolia,
            address!("00000000000000000000000000000000000000aa"),
            U256::from(1_000_000_000_000_000_u64),
            "/api/content/1",
        );
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["version"], json!("1"));
        assert_eq!(value["network"], json!("base-sepolia"));
        assert_eq!(value["maxAmountRequired"], json!("1000000000000000"));
        assert_eq!(value["resource"], json!("/api/content/1"));
        assert!(value.get("tokenAddress").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn token_fields_are_flattened() {
        let d = PaymentDescriptor::new(
            Network::Base,
            address!("00000000000000000000000000000000000000aa"),
            U256::from(2_500_000_u64),
            "/api/content/2",
        )
        .with_token(usdc());
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["asset"], json!("USDC"));
        assert_eq!(value["tokenDecimals"], json!(6));
        assert_eq!(value["tokenSymbol"], json!("USDC"));

        let back: PaymentDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, d);
        assert!(!back.is_native());
    }

    #[test]
    fn accepts_lowercase_addresses() {
        let value = json!({
            "version": "1",
            "network": "base",
            "payTo": "0x00000000000000000000000000000000000000aa",
            "maxAmountRequired": "42",
            "resource": "/r",
            "expiry": 1_700_000_000_u64,
        });
        let d: PaymentDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(d.max_amount_required, U256::from(42));
        assert_eq!(d.expiry, Some(1_700_000_000));
        assert!(d.is_native());
    }

    #[test]
    fn partial_token_fields_are_rejected() {
        let value = json!({
            "version": "1",
            "network": "base",
            "payTo": "0x00000000000000000000000000000000000000aa",
            "maxAmountRequired": "42",
            "resource": "/r",
            "asset": "USDC",
            "tokenAddress": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "tokenDecimals": 6,
        });
        let err = serde_json::from_value::<PaymentDescriptor>(value).unwrap_err();
        assert!(err.to_string().contains("must be given together"));

        let lone_symbol = json!({
            "version": "1",
            "network": "base",
            "payTo": "0x00000000000000000000000000000000000000aa",
            "maxAmountRequired": "42",
            "resource": "/r",
            "tokenSymbol": "USDC",
        });
        assert!(serde_json::from_value::<PaymentDescriptor>(lone_symbol).is_err());
    }
}
