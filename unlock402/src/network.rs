//! Networks on which payments can be made.
//!
//! The wire format names networks by a short human-readable identifier
//! (`"base"`, `"base-sepolia"`). Each network maps to an EIP-155 chain id,
//! which is what RPC endpoints and wallets care about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A network the paywall accepts payments on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// Base mainnet.
    Base,
    /// Base Sepolia testnet.
    BaseSepolia,
}

/// Returned when a network name is not one of the supported networks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl Network {
    /// All supported networks.
    pub const ALL: [Self; 2] = [Self::Base, Self::BaseSepolia];

    /// Returns the wire name of the network.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseSepolia => "base-sepolia",
        }
    }

    /// Returns the EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        match self {
            Self::Base => 8453,
            Self::BaseSepolia => 84532,
        }
    }

    /// Looks up a network by its EIP-155 chain id.
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| UnknownNetwork(s.to_owned()))
    }
}
