//! Solidity interface definitions for on-chain interactions.
//!
//! The verifier only needs the ERC-20 `Transfer` event; the call surface
//! used by paying clients is declared with RPC bindings in the `wallet`
//! module (feature `client`).

use alloy_sol_types::sol;

sol! {
    /// ERC-20 events scanned by the verifier.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}
