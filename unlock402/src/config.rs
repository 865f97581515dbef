//! Server-side payment configuration for a protected resource.
//!
//! [`PaymentConfig`] is a discriminated union so that the token fields of a
//! token payment are statically required together, and a native payment
//! cannot carry stray token metadata.

use alloy_primitives::{Address, U256};

use crate::descriptor::{PaymentDescriptor, TokenAsset};
use crate::network::Network;
use crate::version::ProtocolVersion;

/// Terms shared by native and token payments.
///
/// # Example
///
/// ```rust
/// use unlock402::{Address, Network, PaymentConfig, PaymentTerms, U256};
///
/// let terms = PaymentTerms::new(
///     Network::BaseSepolia,
///     Address::ZERO,
///     U256::from(1_000_000_000_000_000_u64),
///     "/api/content/1",
/// )
/// .with_description("Premium article");
/// let config = PaymentConfig::native(terms);
/// assert_eq!(config.descriptor().max_amount_required.to_string(), "1000000000000000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTerms {
    /// Recipient account.
    pub pay_to: Address,
    /// Minimum amount in base units.
    pub amount: U256,
    /// Identifier of the protected resource.
    pub resource: String,
    /// Network payments are accepted on.
    pub network: Network,
    /// Human-readable description.
    pub description: Option<String>,
    /// MIME type of the protected resource.
    pub mime_type: Option<String>,
    /// Expiry advertised to clients.
    pub expiry: Option<u64>,
}

impl PaymentTerms {
    /// Creates terms with no optional metadata.
    #[must_use]
    pub fn new(network: Network, pay_to: Address, amount: U256, resource: impl Into<String>) -> Self {
        Self {
            pay_to,
            amount,
            resource: resource.into(),
            network,
            description: None,
            mime_type: None,
            expiry: None,
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

    /// Sets the advertised expiry.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// How a protected resource must be paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentConfig {
    /// Payment in the network's native currency.
    Native(PaymentTerms),
    /// Payment as an ERC-20 `transfer` of `token`.
    Token {
        /// Shared payment terms; `amount` is in token base units.
        terms: PaymentTerms,
        /// The token to be transferred.
        token: TokenAsset,
    },
}

impl PaymentConfig {
    /// Creates a native-currency configuration.
    #[must_use]
    pub const fn native(terms: PaymentTerms) -> Self {
        Self::Native(terms)
    }

    /// Creates a token configuration.
    #[must_use]
    pub const fn token(terms: PaymentTerms, token: TokenAsset) -> Self {
        Self::Token { terms, token }
    }

    /// Returns the shared payment terms.
    #[must_use]
    pub const fn terms(&self) -> &PaymentTerms {
        match self {
            Self::Native(terms) | Self::Token { terms, .. } => terms,
        }
    }

    /// Returns the token for token payments.
    #[must_use]
    pub const fn token_asset(&self) -> Option<&TokenAsset> {
        match self {
            Self::Native(_) => None,
            Self::Token { token, .. } => Some(token),
        }
    }

    /// Recipient account.
    #[must_use]
    pub const fn pay_to(&self) -> Address {
        self.terms().pay_to
    }

    /// Minimum amount in base units.
    #[must_use]
    pub const fn amount(&self) -> U256 {
        self.terms().amount
    }

    /// Network payments are accepted on.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.terms().network
    }

    /// Returns a copy with the resource identifier replaced.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        let terms = match &mut self {
            Self::Native(terms) | Self::Token { terms, .. } => terms,
        };
        terms.resource = resource.into();
        self
    }

    /// Builds the descriptor advertised in a 402 challenge.
    #[must_use]
    pub fn descriptor(&self) -> PaymentDescriptor {
        let terms = self.terms();
        PaymentDescriptor {
            version: ProtocolVersion,
            network: terms.network,
            pay_to: terms.pay_to,
            max_amount_required: terms.amount,
            resource: terms.resource.clone(),
            description: terms.description.clone(),
            mime_type: terms.mime_type.clone(),
            expiry: terms.expiry,
            token: self.token_asset().cloned(),
        }
    }
}
