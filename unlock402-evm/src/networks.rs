//! Default RPC endpoints.

use unlock402::Network;

/// Public RPC endpoint for Base mainnet.
pub const BASE_RPC_URL: &str = "https://mainnet.base.org";

/// Public RPC endpoint for Base Sepolia.
pub const BASE_SEPOLIA_RPC_URL: &str = "https://sepolia.base.org";

/// Returns the public RPC endpoint of `network`.
#[must_use]
pub const fn default_rpc_url(network: Network) -> &'static str {
    match network {
        Network::Base => BASE_RPC_URL,
        Network::BaseSepolia => BASE_SEPOLIA_RPC_URL,
    }
}
